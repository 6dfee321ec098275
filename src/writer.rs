//! Sequential chunked writes to a single file.

use crate::cancel::CancelToken;
use crate::payload::PayloadGenerator;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "hdr")]
use crate::histogram::LatencyHistogram;
#[cfg(feature = "hdr")]
use crate::result::LatencySummary;

/// Receives progress updates from writers.
///
/// Writers only call this when the integer percentage changes.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, _path: &Path, _written: u64, _target: u64) {}
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Prints `WriteProcess: NN%` to stdout, overwriting the previous line.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, _path: &Path, written: u64, target: u64) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\rWriteProcess: {}%", percent(written, target));
        let _ = stdout.flush();
    }
}

/// Why a writer stopped before reaching its target.
#[derive(thiserror::Error, Debug)]
pub enum FailureKind {
    #[error("write failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

/// A write that stopped early. The file keeps whatever was written.
#[derive(thiserror::Error, Debug)]
#[error("{kind} after {bytes_written} bytes")]
pub struct WriteFailure {
    pub bytes_written: u64,
    pub kind: FailureKind,
}

impl WriteFailure {
    fn io(bytes_written: u64, source: std::io::Error) -> Self {
        Self {
            bytes_written,
            kind: FailureKind::Io(source),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, FailureKind::Cancelled)
    }
}

/// Writes generated payload to one file until a byte target is met.
pub struct ChunkedWriter {
    path: PathBuf,
    generator: PayloadGenerator,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
    sync: bool,
    #[cfg(feature = "hdr")]
    latency: Option<LatencyHistogram>,
}

impl ChunkedWriter {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            generator: PayloadGenerator::new(chunk_size),
            progress: Arc::new(NoProgress),
            cancel: CancelToken::new(),
            sync: false,
            #[cfg(feature = "hdr")]
            latency: LatencyHistogram::new().ok(),
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

    /// Flush file data to the device before returning.
    pub fn sync(mut self, v: bool) -> Self {
        self.sync = v;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write at least `target` bytes and return the number actually written.
    ///
    /// Chunks are never split, so the result may exceed `target` by less
    /// than one chunk. A zero target returns immediately without touching
    /// the filesystem. The file is truncated on open and closed on every
    /// exit path; on failure it keeps the partial content.
    pub fn write_file(&mut self, target: u64) -> Result<u64, WriteFailure> {
        if target == 0 {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| WriteFailure::io(0, e))?;

        let written = self.write_chunks(&mut file, target)?;

        if self.sync {
            file.sync_all().map_err(|e| WriteFailure::io(written, e))?;
        }

        Ok(written)
    }

    fn write_chunks<W: Write>(&mut self, out: &mut W, target: u64) -> Result<u64, WriteFailure> {
        let mut written = 0u64;
        let mut last_percent = None;

        while written < target {
            if self.cancel.is_cancelled() {
                return Err(WriteFailure {
                    bytes_written: written,
                    kind: FailureKind::Cancelled,
                });
            }

            let chunk = self.generator.next_chunk();
            #[cfg(feature = "hdr")]
            let started = std::time::Instant::now();

            let mut offset = 0;
            while offset < chunk.len() {
                match out.write(&chunk[offset..]) {
                    Ok(0) => {
                        return Err(WriteFailure::io(
                            written,
                            std::io::Error::from(ErrorKind::WriteZero),
                        ))
                    }
                    Ok(n) => {
                        offset += n;
                        written += n as u64;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(WriteFailure::io(written, e)),
                }
            }

            #[cfg(feature = "hdr")]
            if let Some(latency) = self.latency.as_mut() {
                latency.record(started.elapsed());
            }

            let pct = percent(written, target);
            if last_percent != Some(pct) {
                self.progress.on_progress(&self.path, written, target);
                last_percent = Some(pct);
            }
        }

        Ok(written)
    }

    /// Latency percentiles of the chunks written so far.
    #[cfg(feature = "hdr")]
    pub fn latency_summary(&self) -> Option<LatencySummary> {
        self.latency.as_ref().and_then(LatencyHistogram::summary)
    }
}

fn percent(written: u64, target: u64) -> u64 {
    if target == 0 {
        return 100;
    }
    ((written as f64 / target as f64) * 100.0).round().min(100.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        calls: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, _path: &Path, written: u64, target: u64) {
            self.calls.lock().unwrap().push((written, target));
        }
    }

    /// Accepts `limit` bytes, then fails every write.
    struct FailAfter {
        accepted: usize,
        limit: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let room = self.limit - self.accepted;
            if room == 0 {
                return Err(std::io::Error::other("device full"));
            }
            let n = buf.len().min(room);
            self.accepted += n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Cancels the token on the first progress update.
    struct CancelOnProgress(CancelToken);

    impl ProgressSink for CancelOnProgress {
        fn on_progress(&self, _path: &Path, _written: u64, _target: u64) {
            self.0.cancel();
        }
    }

    #[test]
    fn should_return_partial_count_when_write_fails_midway() {
        let mut writer = ChunkedWriter::new("unused", 1024);
        let mut out = FailAfter {
            accepted: 0,
            limit: 2500,
        };

        let err = writer.write_chunks(&mut out, 8192).unwrap_err();

        assert_eq!(err.bytes_written, 2500);
        assert!(matches!(err.kind, FailureKind::Io(_)));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn should_return_partial_count_when_cancelled_after_first_chunk() {
        let token = CancelToken::new();
        let mut writer = ChunkedWriter::new("unused", 1024)
            .cancel_token(token.clone())
            .progress(Arc::new(CancelOnProgress(token)));
        let mut out = Vec::new();

        let err = writer.write_chunks(&mut out, 8192).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.bytes_written, 1024);
        assert_eq!(out.len(), 1024);
    }

    #[test]
    fn should_keep_partial_file_when_cancelled_midway() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let token = CancelToken::new();
        let mut writer = ChunkedWriter::new(&path, 512)
            .cancel_token(token.clone())
            .progress(Arc::new(CancelOnProgress(token)));

        let err = writer.write_file(4096).unwrap_err();

        assert_eq!(err.bytes_written, 512);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 512);
    }

    #[test]
    fn should_write_at_least_target_when_not_chunk_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let mut writer = ChunkedWriter::new(&path, 4096);

        let written = writer.write_file(10_000).unwrap();

        assert_eq!(written, 12_288);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }

    #[test]
    fn should_write_exact_target_when_chunk_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let mut writer = ChunkedWriter::new(&path, 1024);

        let written = writer.write_file(64 * 1024).unwrap();

        assert_eq!(written, 64 * 1024);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 64 * 1024);
    }

    #[test]
    fn should_return_zero_without_creating_file_when_target_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let mut writer = ChunkedWriter::new(&path, 1024);

        assert_eq!(writer.write_file(0).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn should_truncate_existing_file_when_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, vec![b'x'; 8192]).unwrap();

        let written = ChunkedWriter::new(&path, 1024).write_file(1024).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }

    #[test]
    fn should_fail_with_io_error_when_path_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ChunkedWriter::new(dir.path(), 1024);

        let err = writer.write_file(4096).unwrap_err();

        assert_eq!(err.bytes_written, 0);
        assert!(matches!(err.kind, FailureKind::Io(_)));
    }

    #[test]
    fn should_stop_at_chunk_boundary_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let token = CancelToken::new();
        token.cancel();
        let mut writer = ChunkedWriter::new(&path, 1024).cancel_token(token);

        let err = writer.write_file(4096).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.bytes_written, 0);
    }

    #[test]
    fn should_report_progress_until_complete() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingProgress::default());
        let mut writer = ChunkedWriter::new(dir.path().join("f"), 100).progress(sink.clone());

        writer.write_file(1000).unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls.last(), Some(&(1000, 1000)));
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn should_only_report_when_percentage_changes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingProgress::default());
        let mut writer = ChunkedWriter::new(dir.path().join("f"), 1).progress(sink.clone());

        writer.write_file(1000).unwrap();

        assert_eq!(sink.calls.lock().unwrap().len(), 101);
    }

    #[test]
    fn should_sync_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let written = ChunkedWriter::new(&path, 512)
            .sync(true)
            .write_file(2048)
            .unwrap();
        assert_eq!(written, 2048);
    }

    #[test]
    fn should_cap_percent_at_hundred() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(15, 10), 100);
    }

    #[test]
    fn should_round_percent_to_nearest() {
        assert_eq!(percent(996, 1000), 100);
        assert_eq!(percent(994, 1000), 99);
        assert_eq!(percent(5, 1000), 1);
    }

    #[cfg(feature = "hdr")]
    #[test]
    fn should_record_one_latency_sample_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ChunkedWriter::new(dir.path().join("f"), 256);
        writer.write_file(256 * 8).unwrap();
        assert_eq!(writer.latency_summary().unwrap().samples, 8);
    }
}
