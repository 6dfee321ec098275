//! The end-to-end benchmark pipeline.

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::coordinator::Coordinator;
use crate::error::{BenchError, Result};
use crate::report::{ConsoleReporter, JsonReporter, Reporter};
use crate::result::Report;
use crate::space::{check_space, nearest_existing, SpaceProbe, SpaceReport, StatvfsProbe};
use crate::writer::{ConsoleProgress, NoProgress, ProgressSink};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every writer finished (successfully or not) and the report was emitted.
    Completed { report: Report, space: SpaceReport },
    /// The capacity gate refused the run; nothing was created.
    InsufficientSpace(SpaceReport),
}

/// Capacity gate, directory setup, concurrent writes, reporting and cleanup.
///
/// # Example
///
/// ```rust,no_run
/// use disk_bench::{DiskBench, RunConfig, RunOutcome};
///
/// let config = RunConfig::new("/mnt/scratch").size_gb(1).concurrency(4);
/// match DiskBench::new(config).run()? {
///     RunOutcome::Completed { report, .. } => println!("{}", report.average_write_rate),
///     RunOutcome::InsufficientSpace(space) => eprintln!("short by {} bytes", space.deficit()),
/// }
/// # Ok::<(), disk_bench::BenchError>(())
/// ```
pub struct DiskBench {
    config: RunConfig,
    probe: Box<dyn SpaceProbe>,
    reporters: Vec<Box<dyn Reporter>>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
}

impl DiskBench {
    /// Default wiring: `statvfs` probe, console reporter, JSON reporter when
    /// `emit_json` is set, console progress when `show_progress` is set.
    pub fn new(config: RunConfig) -> Self {
        let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(ConsoleReporter::new())];
        if config.emit_json {
            reporters.push(Box::new(JsonReporter::new(config.report_path.clone())));
        }
        let progress: Arc<dyn ProgressSink> = if config.show_progress {
            Arc::new(ConsoleProgress)
        } else {
            Arc::new(NoProgress)
        };

        Self {
            config,
            probe: Box::new(StatvfsProbe),
            reporters,
            progress,
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Replace the filesystem capacity source.
    pub fn probe(&mut self, probe: Box<dyn SpaceProbe>) -> &mut Self {
        self.probe = probe;
        self
    }

    /// Replace reporters with a custom set.
    pub fn reporters(&mut self, reporters: Vec<Box<dyn Reporter>>) -> &mut Self {
        self.reporters = reporters;
        self
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    pub fn progress(&mut self, sink: Arc<dyn ProgressSink>) -> &mut Self {
        self.progress = sink;
        self
    }

    /// Token that stops all writers of this run at their next chunk.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(&self) -> Result<RunOutcome> {
        let config = &self.config;
        config.validate()?;

        for r in &self.reporters {
            r.run_start(config);
        }

        let bench_dir = config.bench_dir();
        let space = check_space(
            self.probe.as_ref(),
            &nearest_existing(&bench_dir),
            config.required_bytes(),
        )?;
        for r in &self.reporters {
            r.space_checked(&space);
        }
        if !space.enough() {
            return Ok(RunOutcome::InsufficientSpace(space));
        }

        std::fs::create_dir_all(&bench_dir).map_err(|source| BenchError::CreateDir {
            path: bench_dir.clone(),
            source,
        })?;

        info!(
            dir = %bench_dir.display(),
            files = config.concurrency,
            file_size = config.file_size_bytes,
            "Start writing ......"
        );
        let outcome = Coordinator::new(config)
            .progress(self.progress.clone())
            .cancel_token(self.cancel.clone())
            .run();
        info!(
            completed = outcome.results.len(),
            failed = outcome.failures.len(),
            "All file finished"
        );

        let report = Report::aggregate(outcome.results, outcome.failures, config.concurrency);
        for r in &self.reporters {
            r.run_end(&report)?;
        }

        if config.cleanup_after {
            if let Err(e) = cleanup(&bench_dir) {
                warn!("{}", e);
            }
        }

        Ok(RunOutcome::Completed { report, space })
    }
}

/// Remove the bench directory and everything in it.
pub fn cleanup(bench_dir: &Path) -> Result<()> {
    std::fs::remove_dir_all(bench_dir).map_err(|source| BenchError::Cleanup {
        path: bench_dir.to_path_buf(),
        source,
    })?;
    info!(dir = %bench_dir.display(), "bench files removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::tests::FixedProbe;

    fn quiet(config: RunConfig) -> DiskBench {
        let mut bench = DiskBench::new(config.show_progress(false));
        bench.reporters(vec![]);
        bench
    }

    #[test]
    fn should_reject_invalid_config_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bench = quiet(RunConfig::new(dir.path()).concurrency(0));
        assert!(matches!(bench.run(), Err(BenchError::InvalidConfig(_))));
        assert!(!dir.path().join("bench_file").exists());
    }

    #[test]
    fn should_stop_before_creating_anything_when_space_short() {
        let dir = tempfile::tempdir().unwrap();
        let mut bench = quiet(
            RunConfig::new(dir.path())
                .file_size_bytes(1024)
                .concurrency(2),
        );
        bench.probe(Box::new(FixedProbe { available: 1500 }));

        let outcome = bench.run().unwrap();

        match outcome {
            RunOutcome::InsufficientSpace(space) => assert_eq!(space.deficit(), 548),
            other => panic!("expected insufficient space, got {:?}", other),
        }
        assert!(!dir.path().join("bench_file").exists());
    }

    #[test]
    fn should_complete_and_keep_files_without_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let bench = quiet(
            RunConfig::new(dir.path())
                .file_size_bytes(16 * 1024)
                .chunk_size(4096)
                .concurrency(2),
        );

        let outcome = bench.run().unwrap();

        let RunOutcome::Completed { report, .. } = outcome else {
            panic!("expected completed run");
        };
        assert_eq!(report.file_infos.len(), 2);
        assert!(dir.path().join("bench_file/random_file_0").exists());
        assert!(dir.path().join("bench_file/random_file_1").exists());
    }

    #[test]
    fn should_fail_when_cleanup_target_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = cleanup(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, BenchError::Cleanup { .. }));
    }
}
