//! Timing context for a single write task.

use crate::result::{FileCountInfo, LatencySummary};
use std::path::Path;
use std::time::{Duration, Instant};

/// Collects the measurements of one writer.
///
/// Everything outside [`measure`](Self::measure) is untimed, so opening
/// bookkeeping and result construction do not count against throughput.
#[derive(Debug, Default)]
pub struct TaskContext {
    pub(crate) duration: Option<Duration>,
    pub(crate) bytes: Option<u64>,
    pub(crate) chunk_latency: Option<LatencySummary>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how many bytes the measured operation wrote.
    pub fn set_bytes(&mut self, bytes: u64) {
        self.bytes = Some(bytes);
    }

    pub fn set_chunk_latency(&mut self, summary: Option<LatencySummary>) {
        self.chunk_latency = summary;
    }

    /// Time the write. Call exactly once per task.
    pub fn measure<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.duration = Some(start.elapsed());
        result
    }

    pub fn elapsed(&self) -> Duration {
        self.duration.unwrap_or_default()
    }

    /// Turn the measurements into the immutable per-file result.
    pub fn finish(self, file: &Path, file_size_bytes: u64) -> FileCountInfo {
        let mut info = FileCountInfo::new(
            file.display().to_string(),
            file_size_bytes,
            self.elapsed(),
            self.bytes.unwrap_or_default(),
        );
        info.chunk_latency = self.chunk_latency;
        info
    }
}
