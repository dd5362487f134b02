// Insurance accounting over the ledger state

use crate::config::SuretyConfig;
use crate::identity::Address;
use crate::insurance::Payout;
use crate::ledger::{FlightKey, InsurancePolicy, LedgerEvent, LedgerState, PolicyKey};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from insurance operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsuranceError {
    #[error("Premium {paid} exceeds cap {cap}")]
    CapExceeded { cap: u64, paid: u64 },

    #[error("Passenger {passenger} already insured on {flight}")]
    AlreadyInsured { passenger: Address, flight: FlightKey },

    #[error("No credit to withdraw")]
    NoCredit,

    #[error("Premium must be greater than zero")]
    InvalidPremium,

    #[error("Unknown flight: {0}")]
    UnknownFlight(FlightKey),

    #[error("Flight {0} already has a final status")]
    FlightClosed(FlightKey),

    #[error("Airline {0} is not participating")]
    AirlineNotParticipating(Address),
}

pub struct InsuranceAccounting;

impl InsuranceAccounting {
    /// Buy coverage. Anything above the cap is rejected in full.
    pub fn buy(
        state: &mut LedgerState,
        config: &SuretyConfig,
        passenger: Address,
        flight: &FlightKey,
        premium: u64,
    ) -> Result<(), InsuranceError> {
        if premium == 0 {
            return Err(InsuranceError::InvalidPremium);
        }

        if premium > config.insurance_cap {
            return Err(InsuranceError::CapExceeded {
                cap: config.insurance_cap,
                paid: premium,
            });
        }

        let record = state
            .flight(flight)
            .ok_or_else(|| InsuranceError::UnknownFlight(flight.clone()))?;

        let participating = state
            .airline(flight.airline())
            .map(|a| a.is_participating())
            .unwrap_or(false);
        if !participating {
            return Err(InsuranceError::AirlineNotParticipating(*flight.airline()));
        }

        if record.is_finalized() {
            return Err(InsuranceError::FlightClosed(flight.clone()));
        }

        if state.policy(&PolicyKey::new(passenger, flight.clone())).is_some() {
            return Err(InsuranceError::AlreadyInsured {
                passenger,
                flight: flight.clone(),
            });
        }

        state.insert_policy(InsurancePolicy::new(passenger, flight.clone(), premium));
        state.emit(LedgerEvent::InsurancePurchased {
            passenger,
            flight: flight.clone(),
            premium,
        });

        info!(%passenger, %flight, premium, "insurance purchased");
        Ok(())
    }

    /// Credit every insured passenger of a flight with the payout multiple of
    /// their premium. A flight is credited at most once; later calls return 0.
    pub fn credit_flight(
        state: &mut LedgerState,
        config: &SuretyConfig,
        flight: &FlightKey,
    ) -> Result<u64, InsuranceError> {
        let record = state
            .flight(flight)
            .ok_or_else(|| InsuranceError::UnknownFlight(flight.clone()))?;

        if record.is_credited() {
            debug!(%flight, "flight already credited");
            return Ok(0);
        }

        let mut total = 0u64;
        for passenger in state.insured_passengers(flight) {
            let key = PolicyKey::new(passenger, flight.clone());
            let amount = match state.policy_mut(&key) {
                Some(policy) if !policy.is_credited() => {
                    let amount = config.payout_for(policy.premium());
                    policy.set_credited(amount);
                    amount
                }
                _ => continue,
            };

            state.add_credit(passenger, amount);
            state.emit(LedgerEvent::PassengerCredited {
                passenger,
                flight: flight.clone(),
                amount,
            });
            total = total.saturating_add(amount);
        }

        if let Some(record) = state.flight_mut(flight) {
            record.mark_credited();
        }

        info!(%flight, total, "insured passengers credited");
        Ok(total)
    }

    /// Zero the passenger's balance and hand back what is owed.
    ///
    /// The balance is gone before the caller moves any value, so a second
    /// withdrawal racing the transfer sees `NoCredit`.
    pub fn withdraw(state: &mut LedgerState, passenger: &Address) -> Result<Payout, InsuranceError> {
        let amount = state.take_credit(passenger);
        if amount == 0 {
            return Err(InsuranceError::NoCredit);
        }

        state.emit(LedgerEvent::CreditWithdrawn {
            passenger: *passenger,
            amount,
        });

        info!(%passenger, amount, "credit withdrawn");
        Ok(Payout::new(*passenger, amount))
    }

    /// Put back a payout whose transfer failed
    pub fn restore(state: &mut LedgerState, payout: &Payout) {
        state.add_credit(*payout.passenger(), payout.amount());
        state.emit(LedgerEvent::CreditRestored {
            passenger: *payout.passenger(),
            amount: payout.amount(),
        });

        info!(passenger = %payout.passenger(), amount = payout.amount(), "credit restored");
    }

    pub fn is_insured(state: &LedgerState, passenger: &Address, flight: &FlightKey) -> bool {
        state
            .policy(&PolicyKey::new(*passenger, flight.clone()))
            .is_some()
    }
}
