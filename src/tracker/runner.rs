use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::id::IdGenerator;
use crate::ledger::{Ledger, LedgerRecord, PushReport};
use crate::time::{to_precision, Clock, Millis};

use super::config::{LogSink, RunOptions, TrackerConfig};
use super::naming::{error_kind, task_name_of};
use super::record::TaskRecord;
use super::timer::{ActiveTimers, TaskHandle};

struct TrackerInner {
    name: Option<String>,
    history_enabled: bool,
    ledger: Ledger<TaskRecord>,
    timers: ActiveTimers,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    log: Option<LogSink>,
}

/// Times tasks and keeps a bounded history of their runs.
///
/// Clones share the same timers and ledger. Separate `Tracker::new` calls
/// never share state.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        let ledger = Ledger::with_clock(config.ledger_limit(), config.ledger_clock.clone());

        if let Some(sink) = config.persist_entry.clone() {
            ledger.on_insert(move |record| sink(record));
        }
        if let Some(sink) = config.persist_history.clone() {
            ledger.on_reclaim(move |batch| sink(batch));
        }

        Self {
            inner: Arc::new(TrackerInner {
                name: config.name.filter(|n| !n.is_empty()),
                history_enabled: config.history_enabled,
                ledger,
                timers: ActiveTimers::default(),
                clock: config.clock,
                ids: config.ids,
                log: config.log,
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn is_history_enabled(&self) -> bool {
        self.inner.history_enabled
    }

    /// Records currently held by the ledger, oldest first. Always a fresh read.
    pub fn history(&self) -> Vec<LedgerRecord<TaskRecord>> {
        self.inner.ledger.history()
    }

    pub fn history_with<R, F>(&self, transform: F) -> Vec<R>
    where
        F: FnMut(&LedgerRecord<TaskRecord>, usize) -> R,
    {
        self.inner.ledger.history_with(transform)
    }

    /// Number of timers started and not yet stopped.
    pub fn active_timers(&self) -> usize {
        self.inner.timers.len()
    }

    pub fn is_timing(&self, id: &str) -> bool {
        self.inner.timers.contains(id)
    }

    /// Starts a timer under a fresh id.
    pub fn start(&self) -> TaskHandle {
        let id = self.inner.ids.next_id();
        self.inner.timers.insert(id.clone(), self.inner.clock.now_ms());
        TaskHandle::new(id, self.clone())
    }

    /// Stops the timer for `id` and returns the elapsed milliseconds.
    /// Returns `None` if `id` was never started or has already been stopped.
    pub fn stop(&self, id: &str) -> Option<Millis> {
        self.inner.timers.remove(id, self.inner.clock.now_ms())
    }

    /// Runs `task`, recording `start`, then `error` if it fails, then `stop`.
    /// The task's own result is handed back untouched, errors included.
    pub async fn run<F, Fut, T, E>(&self, task: F, options: RunOptions) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let session = RunSession::begin(self, resolve_task_name::<F>(options));
        let outcome = task().await;
        session.finish(&outcome);
        outcome
    }

    /// `run` for synchronous work.
    pub fn run_blocking<F, T, E>(&self, task: F, options: RunOptions) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let session = RunSession::begin(self, resolve_task_name::<F>(options));
        let outcome = task();
        session.finish(&outcome);
        outcome
    }

    fn record(&self, record: TaskRecord) {
        if !self.inner.history_enabled {
            return;
        }
        let PushReport { failures, .. } = self.inner.ledger.push_one(record);
        for failure in failures {
            self.trace(format!("ledger: {}", failure));
        }
    }

    fn trace(&self, line: String) {
        debug!(tracker = self.name().unwrap_or_default(), "{}", line);
        if let Some(log) = &self.inner.log {
            log(&line);
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

fn resolve_task_name<F>(options: RunOptions) -> Option<String> {
    options
        .name
        .filter(|n| !n.is_empty())
        .or_else(task_name_of::<F>)
}

/// One in-flight `run`. A run whose future is dropped before completion still
/// releases its timer and closes its history with a `cancelled` record.
struct RunSession<'a> {
    tracker: &'a Tracker,
    id: String,
    task_name: Option<String>,
    finished: bool,
}

impl<'a> RunSession<'a> {
    fn begin(tracker: &'a Tracker, task_name: Option<String>) -> Self {
        let handle = tracker.start();
        let session = Self {
            tracker,
            id: handle.id().to_string(),
            task_name,
            finished: false,
        };
        tracker.trace(format!("start: \"{}\"", session.display_name()));
        tracker.record(TaskRecord::start(tracker.name(), &session.id, session.task_name.as_deref()));
        session
    }

    fn finish<T, E: fmt::Display>(mut self, outcome: &Result<T, E>) {
        let tracker = self.tracker;
        let task_name = self.task_name.as_deref();

        if let Err(err) = outcome {
            let detail = err.to_string();
            tracker.record(TaskRecord::error(tracker.name(), &self.id, task_name, error_kind::<E>(), &detail));
        }

        self.finished = true;
        let duration = tracker.stop(&self.id).unwrap_or_default();
        tracker.trace(format!("stop: \"{}\" {}ms", self.display_name(), to_precision(duration, 2)));
        tracker.record(TaskRecord::stop(tracker.name(), &self.id, task_name, duration));
    }

    fn display_name(&self) -> &str {
        self.task_name.as_deref().unwrap_or("unknown")
    }
}

impl Drop for RunSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let tracker = self.tracker;
        if let Some(duration) = tracker.stop(&self.id) {
            tracker.trace(format!(
                "cancelled: \"{}\" {}ms",
                self.display_name(),
                to_precision(duration, 2)
            ));
            tracker.record(TaskRecord::cancelled(
                tracker.name(),
                &self.id,
                self.task_name.as_deref(),
                duration,
            ));
        }
    }
}
