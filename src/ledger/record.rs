use serde::{Deserialize, Serialize};

/// A stored item plus where and when it entered the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord<T> {
    /// Sequence number, strictly increasing for the life of the ledger. Not a position.
    pub index: u64,
    /// Capture time in milliseconds.
    pub timestamp: u64,
    pub data: T,
}
