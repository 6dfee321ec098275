//! Configuration for a benchmark run.

use crate::error::{BenchError, Result};
use std::path::PathBuf;

/// Name of the subdirectory created under the target path.
pub const BENCH_DIR_NAME: &str = "bench_file";
/// Default size of a single write call.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;
/// Default location of the structured report.
pub const DEFAULT_REPORT_PATH: &str = "bench-report.json";

/// Configuration for a benchmark run.
///
/// Built once at startup and shared read-only with every writer.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory under which `bench_file/` is created.
    pub target_path: PathBuf,
    /// Bytes each writer must produce.
    pub file_size_bytes: u64,
    /// Number of files written concurrently.
    pub concurrency: usize,
    /// Write the structured report after the run.
    pub emit_json: bool,
    /// Remove the bench directory after reporting.
    pub cleanup_after: bool,
    /// Bytes handed to a single write call.
    pub chunk_size: usize,
    /// Where the structured report goes.
    pub report_path: PathBuf,
    /// Print live per-writer progress to stdout.
    pub show_progress: bool,
    /// `fsync` each file before its timer stops.
    pub sync_on_finish: bool,
}

impl RunConfig {
    /// Create a config for `target_path` with 1 GB files and one writer.
    pub fn new(target_path: impl Into<PathBuf>) -> Self {
        Self {
            target_path: target_path.into(),
            file_size_bytes: 1 << 30,
            concurrency: 1,
            emit_json: false,
            cleanup_after: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            show_progress: true,
            sync_on_finish: false,
        }
    }

    /// Set the per-file size in whole gigabytes (`n << 30` bytes).
    pub fn size_gb(mut self, n: u64) -> Self {
        self.file_size_bytes = n.saturating_mul(1 << 30);
        self
    }

    /// Set the per-file size in bytes.
    pub fn file_size_bytes(mut self, bytes: u64) -> Self {
        self.file_size_bytes = bytes;
        self
    }

    /// Set the number of concurrent writers.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn emit_json(mut self, v: bool) -> Self {
        self.emit_json = v;
        self
    }

    pub fn cleanup_after(mut self, v: bool) -> Self {
        self.cleanup_after = v;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    pub fn show_progress(mut self, v: bool) -> Self {
        self.show_progress = v;
        self
    }

    pub fn sync_on_finish(mut self, v: bool) -> Self {
        self.sync_on_finish = v;
        self
    }

    /// Directory holding all generated files.
    pub fn bench_dir(&self) -> PathBuf {
        self.target_path.join(BENCH_DIR_NAME)
    }

    /// Path of the file written by writer `index`.
    pub fn file_path(&self, index: usize) -> PathBuf {
        self.bench_dir().join(format!("random_file_{}", index))
    }

    /// Total space the run needs, saturating at `u64::MAX`.
    pub fn required_bytes(&self) -> u64 {
        self.file_size_bytes.saturating_mul(self.concurrency as u64)
    }

    /// Reject configurations the coordinator cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BenchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(BenchError::InvalidConfig(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }
}
