use thiserror::Error;

use super::listeners::ListenerKind;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A listener returned an error. The push carried on regardless.
    #[error("{kind} listener #{position} failed at record {index}: {cause:#}")]
    ListenerFailed {
        kind: ListenerKind,
        position: usize,
        /// Inserted record for insert listeners, first evicted record for reclaim listeners.
        index: u64,
        cause: anyhow::Error,
    },
}
