// Storage module - PERSISTENCE
// Ledger snapshots and the event log in sled

mod store;

pub use store::{StorageStats, StoreError, SuretyStore};
