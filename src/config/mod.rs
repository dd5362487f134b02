// Config module - ledger parameters (stakes, caps, thresholds, oracle routing)

mod settings;

pub use settings::{ConfigError, SuretyConfig, UNIT};
