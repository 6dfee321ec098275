//! Tokio-hosted coordinator.
//!
//! Each writer runs on the blocking pool and sends exactly one outcome
//! through a channel; a single consumer assembles the result lists, so no
//! lock is shared between writers.

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::coordinator::{plan_tasks, CoordinatorOutcome};
use crate::writer::ProgressSink;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::error;

/// Run every writer of `config` and wait for all of them.
pub async fn run_tasks_async(
    config: Arc<RunConfig>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
) -> CoordinatorOutcome {
    let tasks = plan_tasks(&config);
    let mut outcome = CoordinatorOutcome {
        attempted: tasks.iter().map(|t| t.file_path.clone()).collect(),
        ..Default::default()
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut set = JoinSet::new();

    for task in tasks {
        let tx = tx.clone();
        let config = config.clone();
        let progress = progress.clone();
        let cancel = cancel.clone();
        set.spawn_blocking(move || {
            let _ = tx.send(task.run(&config, progress, cancel));
        });
    }
    drop(tx);

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            error!("writer task did not complete: {}", e);
        }
    }

    while let Some(result) = rx.recv().await {
        outcome.record(result);
    }

    outcome
}
