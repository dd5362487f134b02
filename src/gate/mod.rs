// Gate module - operational flag and caller authorization
// Checked before any state mutation

mod access;

pub use access::{AccessGate, GateError};
