// Governance module - airline admission, funding, voting and flight registration

mod admission;

pub use admission::{meets_consensus, AirlineGovernance, GovernanceError};
