// Service module - shared async handle over one ledger
// Serializes operations, republishes events, runs payout transfers

mod handle;

pub use handle::{PayoutReceipt, SuretyService};
