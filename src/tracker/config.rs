use std::sync::Arc;

use crate::id::{IdGenerator, UuidGenerator};
use crate::ledger::LedgerRecord;
use crate::time::{Clock, MonotonicClock, WallClock};

use super::record::TaskRecord;

pub const DEFAULT_MAX_HISTORY: usize = 50;

pub type PersistEntry = Arc<dyn Fn(&LedgerRecord<TaskRecord>) -> anyhow::Result<()> + Send + Sync>;
pub type PersistHistory = Arc<dyn Fn(&[LedgerRecord<TaskRecord>]) -> anyhow::Result<()> + Send + Sync>;
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Construction-time settings for a `Tracker`.
#[derive(Clone)]
pub struct TrackerConfig {
    /// Prefixed to every signature.
    pub name: Option<String>,
    /// When false nothing reaches the ledger, timing still happens.
    pub history_enabled: bool,
    /// Ledger limit. Zero falls back to `DEFAULT_MAX_HISTORY`.
    pub max_history_size: usize,
    /// Receives every record as it is inserted.
    pub persist_entry: Option<PersistEntry>,
    /// Receives every batch the ledger reclaims.
    pub persist_history: Option<PersistHistory>,
    /// Human-readable trace lines, independent of the ledger.
    pub log: Option<LogSink>,
    pub clock: Arc<dyn Clock>,
    pub ledger_clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name: None,
            history_enabled: true,
            max_history_size: DEFAULT_MAX_HISTORY,
            persist_entry: None,
            persist_history: None,
            log: None,
            clock: Arc::new(MonotonicClock::new()),
            ledger_clock: Arc::new(WallClock),
            ids: Arc::new(UuidGenerator),
        }
    }
}

impl TrackerConfig {
    pub fn named(name: &str) -> Self {
        Self::default().with_name(name)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_history_enabled(mut self, enabled: bool) -> Self {
        self.history_enabled = enabled;
        self
    }

    pub fn with_max_history_size(mut self, size: usize) -> Self {
        self.max_history_size = size;
        self
    }

    pub fn with_persist_entry<F>(mut self, sink: F) -> Self
    where
        F: Fn(&LedgerRecord<TaskRecord>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.persist_entry = Some(Arc::new(sink));
        self
    }

    pub fn with_persist_history<F>(mut self, sink: F) -> Self
    where
        F: Fn(&[LedgerRecord<TaskRecord>]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.persist_history = Some(Arc::new(sink));
        self
    }

    pub fn with_log<F>(mut self, log: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.log = Some(Arc::new(log));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ledger_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ledger_clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub(crate) fn ledger_limit(&self) -> usize {
        if self.max_history_size == 0 {
            DEFAULT_MAX_HISTORY
        } else {
            self.max_history_size
        }
    }
}

/// Per-run settings.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the name inferred from the task.
    pub name: Option<String>,
}

impl RunOptions {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }
}
