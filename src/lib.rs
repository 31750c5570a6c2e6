pub mod id;
pub mod ledger;
pub mod time;
pub mod tracker;

// Re-export the main entry points for convenient access
pub use ledger::{Ledger, LedgerRecord};
pub use tracker::{RunOptions, TaskRecord, Tracker, TrackerConfig};
