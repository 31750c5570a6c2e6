use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::error::LedgerError;
use super::record::LedgerRecord;

pub type InsertListener<T> = Arc<dyn Fn(&LedgerRecord<T>) -> anyhow::Result<()> + Send + Sync>;
pub type ReclaimListener<T> = Arc<dyn Fn(&[LedgerRecord<T>]) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Insert,
    Reclaim,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Insert => write!(f, "insert"),
            ListenerKind::Reclaim => write!(f, "reclaim"),
        }
    }
}

/// Receipt for a registered listener. Listeners live as long as the ledger,
/// the receipt only tells which list it joined and in what order it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: ListenerKind,
    pub position: usize,
}

pub(crate) struct Listeners<T> {
    insert: Vec<InsertListener<T>>,
    reclaim: Vec<ReclaimListener<T>>,
}

// Manual impl: listeners are shared, `T` itself need not be `Clone`.
impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            insert: self.insert.clone(),
            reclaim: self.reclaim.clone(),
        }
    }
}

impl<T> Listeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            insert: Vec::new(),
            reclaim: Vec::new(),
        }
    }

    pub(crate) fn add_insert(&mut self, listener: InsertListener<T>) -> Subscription {
        self.insert.push(listener);
        Subscription {
            kind: ListenerKind::Insert,
            position: self.insert.len() - 1,
        }
    }

    pub(crate) fn add_reclaim(&mut self, listener: ReclaimListener<T>) -> Subscription {
        self.reclaim.push(listener);
        Subscription {
            kind: ListenerKind::Reclaim,
            position: self.reclaim.len() - 1,
        }
    }

    /// Runs every insert listener in registration order. Failures are
    /// collected, never allowed to stop the remaining listeners.
    pub(crate) fn notify_insert(&self, record: &LedgerRecord<T>, failures: &mut Vec<LedgerError>) {
        for (position, listener) in self.insert.iter().enumerate() {
            if let Err(cause) = listener(record) {
                warn!(position, index = record.index, "ledger insert listener failed: {:#}", cause);
                failures.push(LedgerError::ListenerFailed {
                    kind: ListenerKind::Insert,
                    position,
                    index: record.index,
                    cause,
                });
            }
        }
    }

    pub(crate) fn notify_reclaim(&self, batch: &[LedgerRecord<T>], failures: &mut Vec<LedgerError>) {
        let first = batch.first().map(|r| r.index).unwrap_or_default();
        for (position, listener) in self.reclaim.iter().enumerate() {
            if let Err(cause) = listener(batch) {
                warn!(position, index = first, "ledger reclaim listener failed: {:#}", cause);
                failures.push(LedgerError::ListenerFailed {
                    kind: ListenerKind::Reclaim,
                    position,
                    index: first,
                    cause,
                });
            }
        }
    }
}
