use serde::{Deserialize, Serialize};

use crate::time::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPhase {
    Start,
    Error,
    Stop,
    /// The run's future was dropped before the task finished.
    Cancelled,
}

/// One step of a tracked run. `id`, `signature`, `phase` and `message` are
/// always present; the rest depend on the tracker, the task and the phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    pub phase: TaskPhase,
    pub message: String,
    /// Only set on `Stop` and `Cancelled` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Millis>,
}

impl TaskRecord {
    pub fn start(tracker: Option<&str>, id: &str, task_name: Option<&str>) -> Self {
        Self::new(tracker, id, task_name, TaskPhase::Start, "start".to_string(), None)
    }

    pub fn error(tracker: Option<&str>, id: &str, task_name: Option<&str>, kind: &str, detail: &str) -> Self {
        let message = format!("error: {} | {}", kind, detail);
        Self::new(tracker, id, task_name, TaskPhase::Error, message, None)
    }

    pub fn stop(tracker: Option<&str>, id: &str, task_name: Option<&str>, duration: Millis) -> Self {
        let message = format!("stop: {}ms", duration);
        Self::new(tracker, id, task_name, TaskPhase::Stop, message, Some(duration))
    }

    pub fn cancelled(tracker: Option<&str>, id: &str, task_name: Option<&str>, duration: Millis) -> Self {
        let message = format!("cancelled: {}ms", duration);
        Self::new(tracker, id, task_name, TaskPhase::Cancelled, message, Some(duration))
    }

    fn new(
        tracker: Option<&str>,
        id: &str,
        task_name: Option<&str>,
        phase: TaskPhase,
        message: String,
        duration: Option<Millis>,
    ) -> Self {
        Self {
            id: id.to_string(),
            signature: signature(tracker, id, task_name),
            tracker: tracker.map(str::to_string),
            task_name: task_name.map(str::to_string),
            phase,
            message,
            duration,
        }
    }
}

/// `[tracker::]id::taskName`, with `unknown` standing in for a missing task name.
pub fn signature(tracker: Option<&str>, id: &str, task_name: Option<&str>) -> String {
    let prefix = match tracker.filter(|t| !t.is_empty()) {
        Some(t) => format!("{}::", t),
        None => String::new(),
    };
    let name = task_name.filter(|n| !n.is_empty()).unwrap_or("unknown");
    format!("{}{}::{}", prefix, id, name)
}
