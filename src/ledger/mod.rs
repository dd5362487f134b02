// Ledger module - THE STORE
// Airlines, flights, policies, oracle registrations and status requests,
// related by key lookup only

mod airline;
mod event;
mod flight;
mod oracle;
mod policy;
mod state;

pub use airline::{AdmissionState, Airline};
pub use event::LedgerEvent;
pub use flight::{Flight, FlightKey, FlightStatus};
pub use oracle::{OracleRegistration, RequestKey, StatusRequest};
pub use policy::{InsurancePolicy, PolicyKey};
pub use state::{LedgerError, LedgerState, LedgerStatistics};
