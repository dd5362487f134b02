// Oracle module - reporter registration, index routing and status agreement

mod consensus;
mod indexes;

pub use consensus::{OracleConsensus, OracleError};
pub use indexes::{generate_indexes, random_index};
