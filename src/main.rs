use std::time::Duration;

use anyhow::Context;
use task_tracker::{LedgerRecord, RunOptions, TaskRecord, Tracker, TrackerConfig};
use tokio::task::JoinSet;
use tracing::info;

const DEFAULT_TASKS: usize = 100;
const DEFAULT_HISTORY: usize = 10;

fn env_or(key: &str, default: usize) -> anyhow::Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a positive integer, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn persist(service: &'static str) -> impl Fn(&[LedgerRecord<TaskRecord>]) -> anyhow::Result<()> + Send + Sync {
    move |entries: &[LedgerRecord<TaskRecord>]| {
        for entry in entries {
            info!(service, "{}", serde_json::to_string(entry)?);
        }
        Ok(())
    }
}

// Deterministic spread of sleeps between 5ms and 195ms.
fn synthetic_delay(seed: usize) -> Duration {
    Duration::from_millis(5 + ((seed * 37) % 20) as u64 * 10)
}

async fn render_frame(delay: Duration) -> anyhow::Result<Duration> {
    tokio::time::sleep(delay).await;
    Ok(delay)
}

async fn heartbeat() -> anyhow::Result<Duration> {
    tokio::task::yield_now().await;
    Ok(Duration::ZERO)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let tasks = env_or("TASK_TRACKER_TASKS", DEFAULT_TASKS)?;
    let history = env_or("TASK_TRACKER_HISTORY", DEFAULT_HISTORY)?;
    info!(tasks, history, "task tracker demo starting");

    let trackers: Vec<Tracker> = ["Renderer", "ReportingSvc", "DataSvc"]
        .into_iter()
        .map(|service| {
            Tracker::new(
                TrackerConfig::named(service)
                    .with_max_history_size(history)
                    .with_persist_history(persist(service)),
            )
        })
        .collect();

    let mut runs = JoinSet::new();
    for (offset, tracker) in trackers.iter().enumerate() {
        for n in 0..tasks {
            let tracker = tracker.clone();
            let delay = synthetic_delay(n + offset);
            runs.spawn(async move {
                if n % 10 == 0 {
                    // Named function item: the record carries "heartbeat" as its task name.
                    tracker.run(heartbeat, RunOptions::default()).await
                } else {
                    tracker
                        .run(move || render_frame(delay), RunOptions::named("render_frame"))
                        .await
                }
            });
        }
    }

    while let Some(joined) = runs.join_next().await {
        joined.context("tracked task panicked")??;
    }

    for tracker in &trackers {
        info!(
            tracker = tracker.name().unwrap_or_default(),
            retained = tracker.history().len(),
            active = tracker.active_timers(),
            "done"
        );
    }

    Ok(())
}
