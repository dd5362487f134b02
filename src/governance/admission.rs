// Airline admission state machine
//
// Unregistered -> Registered -> Funded -> Participating
//
// Below the multiparty threshold only the first airline admits new airlines.
// From the threshold on, admission needs affirmative votes from at least half
// of the participating airlines, the proposer's own vote included.

use crate::config::SuretyConfig;
use crate::identity::Address;
use crate::ledger::{AdmissionState, Airline, Flight, FlightKey, LedgerEvent, LedgerState};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from admission, funding and voting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Governance denied: {0}")]
    GovernanceDenied(String),

    #[error("Airline {voter} already voted for {candidate}")]
    AlreadyVoted { voter: Address, candidate: Address },

    #[error("Insufficient funding: required {required}, provided {provided}")]
    InsufficientFunding { required: u64, provided: u64 },

    #[error("Flight already registered: {0}")]
    FlightAlreadyRegistered(FlightKey),
}

/// `votes * 2 >= participating`
pub fn meets_consensus(votes: usize, participating: usize) -> bool {
    votes.saturating_mul(2) >= participating
}

fn denied(reason: impl Into<String>) -> GovernanceError {
    GovernanceError::GovernanceDenied(reason.into())
}

/// Admission rules over the ledger state
pub struct AirlineGovernance;

impl AirlineGovernance {
    /// Admit `candidate` on behalf of `proposer`. Returns the votes counted.
    ///
    /// On rejection nothing is written, not even the proposer's vote.
    pub fn register(
        state: &mut LedgerState,
        config: &SuretyConfig,
        candidate: Address,
        name: &str,
        proposer: &Address,
    ) -> Result<usize, GovernanceError> {
        if name.trim().is_empty() {
            return Err(denied("airline name is empty"));
        }

        if let Some(existing) = state.airline(&candidate) {
            return Err(denied(format!(
                "{} is already {:?}",
                candidate,
                existing.state()
            )));
        }

        let proposer_state = state
            .airline(proposer)
            .map(|a| a.state())
            .unwrap_or(AdmissionState::Unregistered);

        let voters = if state.registered_count() < config.multiparty_threshold {
            if proposer != state.first_airline() {
                return Err(denied(
                    "only the first airline registers airlines below the multiparty threshold",
                ));
            }
            BTreeSet::new()
        } else {
            if !proposer_state.is_participating() {
                return Err(denied(format!("proposer {} is not participating", proposer)));
            }

            let mut tally = state.candidate_votes(&candidate).cloned().unwrap_or_default();
            tally.insert(*proposer);

            let participating = state.participating_count();
            if !meets_consensus(tally.len(), participating) {
                debug!(%candidate, votes = tally.len(), participating, "consensus not reached");
                return Err(denied(format!(
                    "{} of {} participating airlines voted for {}",
                    tally.len(),
                    participating,
                    candidate
                )));
            }
            tally
        };

        let votes = voters.len();
        state.insert_airline(Airline::new(candidate, name, *proposer, voters));
        state.emit(LedgerEvent::AirlineRegistered {
            airline: candidate,
            name: name.to_string(),
            proposer: *proposer,
            votes,
        });

        info!(airline = %candidate, name, proposer = %proposer, votes, "airline registered");
        Ok(votes)
    }

    /// Deposit the admission stake
    pub fn fund(
        state: &mut LedgerState,
        config: &SuretyConfig,
        airline: &Address,
        amount: u64,
    ) -> Result<(), GovernanceError> {
        let record = state
            .airline(airline)
            .ok_or_else(|| denied(format!("{} is not registered", airline)))?;

        if record.is_funded() {
            return Err(denied(format!("{} is already funded", airline)));
        }

        if amount < config.airline_min_funding {
            return Err(GovernanceError::InsufficientFunding {
                required: config.airline_min_funding,
                provided: amount,
            });
        }

        if let Some(record) = state.airline_mut(airline) {
            record.fund(amount);
        }
        state.emit(LedgerEvent::AirlineFunded {
            airline: *airline,
            amount,
        });

        info!(%airline, amount, "airline funded");
        Ok(())
    }

    /// Cast an affirmative vote. Returns the candidate's tally.
    pub fn vote(
        state: &mut LedgerState,
        voter: &Address,
        candidate: &Address,
    ) -> Result<usize, GovernanceError> {
        let participating = state
            .airline(voter)
            .map(|a| a.is_participating())
            .unwrap_or(false);
        if !participating {
            return Err(denied(format!("voter {} is not participating", voter)));
        }

        if state.airline(candidate).is_some() {
            return Err(denied(format!("{} is already registered", candidate)));
        }

        if !state.record_vote(*voter, *candidate) {
            return Err(GovernanceError::AlreadyVoted {
                voter: *voter,
                candidate: *candidate,
            });
        }

        let votes = state.candidate_votes(candidate).map(|v| v.len()).unwrap_or(0);
        state.emit(LedgerEvent::AirlineVoted {
            voter: *voter,
            candidate: *candidate,
            votes,
        });

        info!(%voter, %candidate, votes, "vote recorded");
        Ok(votes)
    }

    /// Register a flight for a participating airline
    pub fn register_flight(
        state: &mut LedgerState,
        airline: &Address,
        code: &str,
        timestamp: u64,
    ) -> Result<FlightKey, GovernanceError> {
        let participating = state
            .airline(airline)
            .map(|a| a.is_participating())
            .unwrap_or(false);
        if !participating {
            return Err(denied(format!("airline {} is not participating", airline)));
        }

        if code.trim().is_empty() {
            return Err(denied("flight code is empty"));
        }

        let key = FlightKey::new(*airline, code, timestamp);
        if state.flight(&key).is_some() {
            return Err(GovernanceError::FlightAlreadyRegistered(key));
        }

        state.insert_flight(Flight::new(key.clone()));
        if let Some(record) = state.airline_mut(airline) {
            record.advance(AdmissionState::Participating);
        }
        state.emit(LedgerEvent::FlightRegistered {
            flight: key.clone(),
        });

        info!(flight = %key, "flight registered");
        Ok(key)
    }
}
