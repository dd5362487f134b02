// Surety - flight-insurance ledger
//
// Airline admission governance, passenger insurance accounting and
// quorum-based oracle consensus over a single transactional ledger.

pub mod app;
pub mod config;
pub mod gate;
pub mod governance;
pub mod identity;
pub mod insurance;
pub mod ledger;
pub mod oracle;
pub mod service;
pub mod storage;

pub use config::{SuretyConfig, UNIT};
pub use identity::Address;
pub use ledger::{FlightKey, FlightStatus, LedgerEvent};
pub use app::{FlightSurety, SuretyError};
