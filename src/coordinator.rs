//! Fan-out of concurrent writers and result collection.

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::context::TaskContext;
use crate::result::{FileCountInfo, TaskFailure, TaskStatus};
use crate::writer::{ChunkedWriter, NoProgress, ProgressSink};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, warn};

/// One writer's assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTask {
    pub index: usize,
    pub file_path: PathBuf,
    pub target_bytes: u64,
}

impl WriteTask {
    pub fn for_index(config: &RunConfig, index: usize) -> Self {
        Self {
            index,
            file_path: config.file_path(index),
            target_bytes: config.file_size_bytes,
        }
    }

    /// Write the file and time it.
    ///
    /// Failures are logged here and returned as data; they never panic or
    /// propagate to sibling tasks.
    pub fn run(
        &self,
        config: &RunConfig,
        progress: Arc<dyn ProgressSink>,
        cancel: CancelToken,
    ) -> Result<FileCountInfo, TaskFailure> {
        debug!(index = self.index, path = %self.file_path.display(), "writer started");

        let mut writer = ChunkedWriter::new(&self.file_path, config.chunk_size)
            .progress(progress)
            .cancel_token(cancel)
            .sync(config.sync_on_finish);

        let mut ctx = TaskContext::new();
        match ctx.measure(|| writer.write_file(self.target_bytes)) {
            Ok(bytes) => {
                ctx.set_bytes(bytes);
                #[cfg(feature = "hdr")]
                ctx.set_chunk_latency(writer.latency_summary());
                Ok(ctx.finish(&self.file_path, self.target_bytes))
            }
            Err(failure) => {
                let status = if failure.is_cancelled() {
                    warn!(
                        path = %self.file_path.display(),
                        bytes_written = failure.bytes_written,
                        "write cancelled"
                    );
                    TaskStatus::Cancelled
                } else {
                    error!(
                        path = %self.file_path.display(),
                        bytes_written = failure.bytes_written,
                        "write file({}): {}",
                        self.file_path.display(),
                        failure
                    );
                    TaskStatus::Failed
                };
                Err(TaskFailure {
                    file_name: self.file_path.display().to_string(),
                    bytes_written: failure.bytes_written,
                    status,
                    error: failure.to_string(),
                })
            }
        }
    }
}

/// Every task of a run, in index order.
pub fn plan_tasks(config: &RunConfig) -> Vec<WriteTask> {
    (0..config.concurrency)
        .map(|i| WriteTask::for_index(config, i))
        .collect()
}

/// What came back from one coordinated run.
///
/// `results` is in completion order, not index order.
#[derive(Debug, Default)]
pub struct CoordinatorOutcome {
    pub results: Vec<FileCountInfo>,
    pub failures: Vec<TaskFailure>,
    /// Every file path a writer was started for.
    pub attempted: Vec<PathBuf>,
}

impl CoordinatorOutcome {
    pub(crate) fn record(&mut self, outcome: Result<FileCountInfo, TaskFailure>) {
        match outcome {
            Ok(info) => self.results.push(info),
            Err(failure) => self.failures.push(failure),
        }
    }
}

/// Runs one writer thread per configured file and waits for all of them.
pub struct Coordinator<'a> {
    config: &'a RunConfig,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
}

impl<'a> Coordinator<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            progress: Arc::new(NoProgress),
            cancel: CancelToken::new(),
        }
    }

    pub fn progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Launch every writer, then block until all have finished.
    ///
    /// The shared collection is only locked to append one outcome.
    pub fn run(&self) -> CoordinatorOutcome {
        let tasks = plan_tasks(self.config);
        let collected = Mutex::new(CoordinatorOutcome {
            attempted: tasks.iter().map(|t| t.file_path.clone()).collect(),
            ..Default::default()
        });

        thread::scope(|scope| {
            for task in &tasks {
                let collected = &collected;
                let config = self.config;
                let progress = self.progress.clone();
                let cancel = self.cancel.clone();

                let spawned = thread::Builder::new()
                    .name(format!("writer-{}", task.index))
                    .spawn_scoped(scope, move || {
                        let outcome = task.run(config, progress, cancel);
                        collected
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .record(outcome);
                    });

                if let Err(e) = spawned {
                    error!(path = %task.file_path.display(), "failed to spawn writer: {}", e);
                    collected
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .record(Err(TaskFailure {
                            file_name: task.file_path.display().to_string(),
                            bytes_written: 0,
                            status: TaskStatus::Failed,
                            error: e.to_string(),
                        }));
                }
            }
        });

        collected.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
