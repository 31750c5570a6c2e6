use std::collections::HashMap;

use parking_lot::Mutex;

use crate::time::Millis;

use super::runner::Tracker;

/// Start times of the tasks currently being timed, keyed by task id.
#[derive(Debug, Default)]
pub(crate) struct ActiveTimers {
    started: Mutex<HashMap<String, Millis>>,
}

impl ActiveTimers {
    pub(crate) fn insert(&self, id: String, now: Millis) {
        self.started.lock().insert(id, now);
    }

    /// Removes the timer and returns its elapsed time, `None` when `id` is not running.
    pub(crate) fn remove(&self, id: &str, now: Millis) -> Option<Millis> {
        self.started
            .lock()
            .remove(id)
            .map(|start| (now - start).max(0.0))
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.started.lock().contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.started.lock().len()
    }
}

/// A running timer returned by `Tracker::start`.
///
/// Dropping a handle does not stop its timer: a handle that is never stopped
/// keeps its entry for the lifetime of the tracker.
#[derive(Clone)]
pub struct TaskHandle {
    id: String,
    tracker: Tracker,
}

impl TaskHandle {
    pub(crate) fn new(id: String, tracker: Tracker) -> Self {
        Self { id, tracker }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Same as `Tracker::stop(handle.id())`.
    pub fn stop(&self) -> Option<Millis> {
        self.tracker.stop(&self.id)
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}
