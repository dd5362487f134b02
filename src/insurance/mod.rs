// Insurance module - premiums, credit on airline-caused delay, pull-based withdrawal

mod accounting;
mod payout;

pub use accounting::{InsuranceAccounting, InsuranceError};
pub use payout::{MockPayoutTarget, Payout, PayoutTarget};
