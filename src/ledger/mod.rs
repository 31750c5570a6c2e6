//! Bounded, sequenced, observable log.
//!
//! Records are appended in call order and stamped with a sequence index that
//! survives eviction. Once the log holds `limit` records the oldest half is
//! reclaimed as one batch and handed to the reclaim listeners.

pub mod error;
pub mod listeners;
pub mod record;
pub mod store;

pub use error::LedgerError;
pub use listeners::{ListenerKind, Subscription};
pub use record::LedgerRecord;
pub use store::{Ledger, PushReport, DEFAULT_LEDGER_LIMIT};
