//! POAP ledger node.
//!
//! Wraps the issuance ledger with everything a deployment needs around it:
//! - TOML configuration with bootstrap role assignments
//! - Structured logging (human or JSON)
//! - Prometheus metrics fed from committed notifications
//! - A checksummed state file written atomically

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod persistence;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::PoapMetrics;
pub use node::{NodeLedger, PoapNode};
pub use persistence::{load_state, save_state, PersistedState, STATE_FILE_VERSION};
