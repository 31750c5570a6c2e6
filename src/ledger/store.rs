use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::debug;

use super::error::LedgerError;
use super::listeners::{Listeners, Subscription};
use super::record::LedgerRecord;
use crate::time::{Clock, WallClock};

pub const DEFAULT_LEDGER_LIMIT: usize = 100;

struct LedgerState<T> {
    next_index: u64,
    history: VecDeque<LedgerRecord<T>>,
}

/// What a single `push` did.
#[derive(Debug, Default)]
pub struct PushReport {
    pub inserted: usize,
    pub reclaimed: usize,
    pub failures: Vec<LedgerError>,
}

/// Append-only log that reclaims its oldest half once it reaches `limit`.
///
/// Pushes are serialised for their whole append, notify and evict sequence.
/// The history lock is only held for the append and the eviction themselves,
/// so listeners may read the ledger, register more listeners, or push again
/// from the same thread.
pub struct Ledger<T> {
    limit: usize,
    clock: Arc<dyn Clock>,
    push_lock: ReentrantMutex<()>,
    state: Mutex<LedgerState<T>>,
    listeners: RwLock<Listeners<T>>,
}

impl<T> Ledger<T> {
    pub fn new(limit: usize) -> Self {
        Self::with_clock(limit, Arc::new(WallClock))
    }

    /// A `limit` of zero falls back to `DEFAULT_LEDGER_LIMIT`.
    pub fn with_clock(limit: usize, clock: Arc<dyn Clock>) -> Self {
        let limit = if limit == 0 { DEFAULT_LEDGER_LIMIT } else { limit };
        Self {
            limit,
            clock,
            push_lock: ReentrantMutex::new(()),
            state: Mutex::new(LedgerState {
                next_index: 0,
                history: VecDeque::new(),
            }),
            listeners: RwLock::new(Listeners::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.state.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().history.is_empty()
    }

    /// Index the next pushed item will receive.
    pub fn next_index(&self) -> u64 {
        self.state.lock().next_index
    }

    /// Called once per inserted record, in push order.
    pub fn on_insert<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&LedgerRecord<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.write().add_insert(Arc::new(listener))
    }

    /// Called once per reclaim with the evicted batch, oldest first.
    pub fn on_reclaim<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[LedgerRecord<T>]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.write().add_reclaim(Arc::new(listener))
    }

    pub fn push_one(&self, item: T) -> PushReport
    where
        T: Clone,
    {
        self.push(std::iter::once(item))
    }

    /// Appends `items` in order, notifying insert listeners after each one,
    /// then reclaims once if the ledger has reached its limit.
    pub fn push<I>(&self, items: I) -> PushReport
    where
        I: IntoIterator<Item = T>,
        T: Clone,
    {
        let _serial = self.push_lock.lock();
        // Listeners added during this push take effect from the next one.
        let listeners = self.listeners.read().clone();
        let mut report = PushReport::default();

        for data in items {
            let record = {
                let mut state = self.state.lock();
                let record = LedgerRecord {
                    index: state.next_index,
                    timestamp: self.clock.now_ms().max(0.0) as u64,
                    data,
                };
                state.next_index += 1;
                state.history.push_back(record.clone());
                record
            };
            report.inserted += 1;
            listeners.notify_insert(&record, &mut report.failures);
        }

        if report.inserted == 0 {
            return report;
        }

        let evicted: Vec<LedgerRecord<T>> = {
            let mut state = self.state.lock();
            // Halving a single record removes nothing; that is not a reclaim.
            let count = state.history.len() / 2;
            if state.history.len() < self.limit || count == 0 {
                return report;
            }
            let evicted = state.history.drain(..count).collect();
            debug!(
                reclaimed = count,
                retained = state.history.len(),
                limit = self.limit,
                "ledger reclaimed"
            );
            evicted
        };

        report.reclaimed = evicted.len();
        listeners.notify_reclaim(&evicted, &mut report.failures);

        report
    }

    /// Current records, oldest first.
    pub fn history(&self) -> Vec<LedgerRecord<T>>
    where
        T: Clone,
    {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Current records mapped through `transform`, which also receives each
    /// record's position. History is left untouched.
    pub fn history_with<R, F>(&self, mut transform: F) -> Vec<R>
    where
        F: FnMut(&LedgerRecord<T>, usize) -> R,
    {
        self.state
            .lock()
            .history
            .iter()
            .enumerate()
            .map(|(position, record)| transform(record, position))
            .collect()
    }
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_LIMIT)
    }
}
