// App module - the calling layer
// Every mutation passes the access gate, then runs against the ledger state

mod flight_surety;

pub use flight_surety::{FlightSurety, SuretyError};
