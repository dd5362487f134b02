// Oracle Consensus - turns independent status reports into one final status
//
// A request is routed to the reporters holding its index. Each reporter
// answers once; the first status to collect `min_responses` matching reports
// closes the request and fixes the flight's status for good. An airline-caused
// delay credits every insured passenger.

use crate::config::SuretyConfig;
use crate::identity::Address;
use crate::insurance::{InsuranceAccounting, InsuranceError};
use crate::ledger::{
    FlightKey, FlightStatus, LedgerEvent, LedgerState, OracleRegistration, RequestKey,
    StatusRequest,
};
use crate::oracle::{generate_indexes, random_index};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the oracle protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("No open request for index {index} on {flight}")]
    StaleOrUnknownRequest { index: u8, flight: FlightKey },

    #[error("Flight {0} already has a final status")]
    AlreadyFinalized(FlightKey),

    #[error("Oracle {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("Insufficient stake: required {required}, provided {provided}")]
    InsufficientStake { required: u64, provided: u64 },

    #[error("Oracle {0} is not registered")]
    NotRegistered(Address),

    #[error("Index {index} is not assigned to oracle {reporter}")]
    IndexNotAssigned { reporter: Address, index: u8 },

    #[error("Oracle {0} already reported for this request")]
    DuplicateReport(Address),

    #[error("Unknown flight: {0}")]
    UnknownFlight(FlightKey),

    #[error("Crediting failed: {0}")]
    Crediting(#[from] InsuranceError),
}

pub struct OracleConsensus;

impl OracleConsensus {
    /// Register a reporter and assign its indexes
    pub fn register(
        state: &mut LedgerState,
        config: &SuretyConfig,
        reporter: Address,
        stake: u64,
    ) -> Result<Vec<u8>, OracleError> {
        if state.oracle(&reporter).is_some() {
            return Err(OracleError::AlreadyRegistered(reporter));
        }

        if stake < config.oracle_registration_fee {
            return Err(OracleError::InsufficientStake {
                required: config.oracle_registration_fee,
                provided: stake,
            });
        }

        let nonce = state.next_nonce();
        let indexes = generate_indexes(
            &reporter,
            nonce,
            config.oracle_index_count,
            config.oracle_index_domain,
        );

        state.insert_oracle(OracleRegistration::new(reporter, indexes.clone(), stake));
        state.emit(LedgerEvent::OracleRegistered {
            reporter,
            indexes: indexes.clone(),
        });

        info!(%reporter, ?indexes, "oracle registered");
        Ok(indexes)
    }

    /// Open a status request for a flight. Returns the routing index.
    pub fn request(
        state: &mut LedgerState,
        config: &SuretyConfig,
        requester: Address,
        flight: &FlightKey,
    ) -> Result<u8, OracleError> {
        let record = state
            .flight(flight)
            .ok_or_else(|| OracleError::UnknownFlight(flight.clone()))?;

        if record.is_finalized() {
            return Err(OracleError::AlreadyFinalized(flight.clone()));
        }

        let nonce = state.next_nonce();
        let index = random_index(&requester, nonce, config.oracle_index_domain);
        let key = RequestKey::new(index, flight.clone());
        let now = state.version();

        // A live round keeps its reports; only a stale one starts over
        let live = state
            .request(&key)
            .map(|r| r.is_open() && !r.is_expired(now, config.request_ttl))
            .unwrap_or(false);
        if live {
            if let Some(request) = state.request_mut(&key) {
                request.set_requester(requester);
                debug!(index, %flight, reports = request.total_responses(), "request already open");
            }
        } else {
            state.open_request(StatusRequest::new(key, requester, now));
        }
        state.emit(LedgerEvent::OracleRequest {
            index,
            flight: flight.clone(),
        });

        info!(index, %flight, %requester, "status requested");
        Ok(index)
    }

    /// Record one reporter's status. Returns the final status if this report
    /// completed agreement.
    pub fn submit(
        state: &mut LedgerState,
        config: &SuretyConfig,
        reporter: &Address,
        index: u8,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<Option<FlightStatus>, OracleError> {
        let registration = state
            .oracle(reporter)
            .ok_or(OracleError::NotRegistered(*reporter))?;

        if !registration.has_index(index) {
            return Err(OracleError::IndexNotAssigned {
                reporter: *reporter,
                index,
            });
        }

        let key = RequestKey::new(index, flight.clone());
        let stale = || OracleError::StaleOrUnknownRequest {
            index,
            flight: flight.clone(),
        };

        let request = state.request(&key).ok_or_else(stale)?;

        let flight_final = state.flight(flight).map(|f| f.is_finalized()).unwrap_or(false);
        if !request.is_open() || flight_final {
            return Err(OracleError::AlreadyFinalized(flight.clone()));
        }

        if request.is_expired(state.version(), config.request_ttl) {
            return Err(stale());
        }

        if request.has_reported(reporter) {
            return Err(OracleError::DuplicateReport(*reporter));
        }

        let count = match state.request_mut(&key) {
            Some(request) => request.record(*reporter, status),
            None => return Err(stale()),
        };
        state.emit(LedgerEvent::OracleReport {
            reporter: *reporter,
            index,
            flight: flight.clone(),
            status,
        });
        debug!(%reporter, index, %flight, %status, count, "status reported");

        if count < config.min_responses {
            return Ok(None);
        }

        let closed = state.close_requests(flight, status);
        if let Some(record) = state.flight_mut(flight) {
            record.finalize(status);
        }
        state.emit(LedgerEvent::FlightStatusInfo {
            flight: flight.clone(),
            status,
        });
        info!(%flight, %status, reports = count, rounds = closed, "flight status finalized");

        if status.is_airline_fault() {
            InsuranceAccounting::credit_flight(state, config, flight)?;
        }

        Ok(Some(status))
    }

    /// Drop open requests older than the configured ttl
    pub fn expire_requests(state: &mut LedgerState, config: &SuretyConfig) -> Vec<RequestKey> {
        let now = state.version();
        let expired: Vec<RequestKey> = state
            .requests()
            .filter(|r| r.is_open() && r.is_expired(now, config.request_ttl))
            .map(|r| r.key().clone())
            .collect();

        for key in &expired {
            state.remove_request(key);
            state.emit(LedgerEvent::RequestExpired {
                index: key.index,
                flight: key.flight.clone(),
            });
            warn!(index = key.index, flight = %key.flight, "status request expired");
        }

        expired
    }
}
