//! Task timing and recording.
//!
//! A `Tracker` times units of work by id and writes `start` / `error` / `stop`
//! records for each run into its own `Ledger`. A run dropped before it
//! completes ends with a `cancelled` record instead of `stop`.

pub mod config;
pub mod naming;
pub mod record;
pub mod runner;
pub mod timer;

pub use config::{LogSink, PersistEntry, PersistHistory, RunOptions, TrackerConfig, DEFAULT_MAX_HISTORY};
pub use record::{signature, TaskPhase, TaskRecord};
pub use runner::Tracker;
pub use timer::TaskHandle;
