//! Pluggable reporters for run output.
//!
//! The console reporter renders the human-readable breakdown; the JSON
//! reporter writes the structured report. Report-file failures are fatal to
//! the run, so `run_end` returns a `Result`.

use crate::config::RunConfig;
use crate::error::{BenchError, Result};
use crate::result::{format_duration, Report, TaskStatus};
use crate::space::SpaceReport;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Trait for run reporters.
pub trait Reporter: Send + Sync {
    /// Called before the capacity gate.
    fn run_start(&self, _config: &RunConfig) {}

    /// Called once the capacity gate has been evaluated.
    fn space_checked(&self, _space: &SpaceReport) {}

    /// Called after every writer has finished.
    fn run_end(&self, _report: &Report) -> Result<()> {
        Ok(())
    }
}

/// Prints the space summary and per-file breakdown to stdout.
pub struct ConsoleReporter {
    /// Keeps multi-line blocks from interleaving.
    output_lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            output_lock: Mutex::new(()),
        }
    }

    fn write_stdout(&self, message: &str) {
        let _guard = self
            .output_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message) {
            let _ = writeln!(std::io::stderr(), "Warning: failed to write to stdout: {}", e);
        }
    }

    pub(crate) fn format_space(space: &SpaceReport) -> String {
        format!(
            "Path Space: \n\
             \tTotal: {}\n\
             \tAvail: {}\n\
             \tNeed:  {}\n",
            gb_and_bytes(space.total),
            gb_and_bytes(space.available),
            gb_and_bytes(space.needed),
        )
    }

    pub(crate) fn format_report(report: &Report) -> String {
        let mut output = String::from("\n");

        for info in &report.file_infos {
            let short_name = Path::new(&info.file_name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| info.file_name.clone());
            output.push_str(&format!("{}: \n", short_name));
            output.push_str(&format!("\tFileName:  {}\n", info.file_name));
            output.push_str(&format!("\tFileSize:  {}\n", gb_and_bytes(info.file_size_bytes)));
            output.push_str(&format!("\tByteCount: {}\n", gb_and_bytes(info.bytes_written)));
            output.push_str(&format!("\tUsedTime:  {}\n", format_duration(info.elapsed)));
            output.push_str(&format!("\tWriteRate: {:.2}M/s\n", info.write_rate_mbps));
            if let Some(latency) = &info.chunk_latency {
                output.push_str(&format!(
                    "\tChunkLatency: p50 {}us, p99 {}us, max {}us ({} chunks)\n",
                    latency.p50_us, latency.p99_us, latency.max_us, latency.samples
                ));
            }
        }

        if !report.failures.is_empty() {
            output.push_str("Failures: \n");
            for failure in &report.failures {
                let kind = match failure.status {
                    TaskStatus::Failed => "failed",
                    TaskStatus::Cancelled => "cancelled",
                };
                output.push_str(&format!(
                    "\t{} ({}, {} bytes written): {}\n",
                    failure.file_name, kind, failure.bytes_written, failure.error
                ));
            }
        }

        output.push_str("Count: \n");
        output.push_str(&format!("\tAverageWriteRate: {}\n", report.average_write_rate));
        output.push_str(&format!("\tAverageUsedTime: {}", report.average_used_time));
        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn space_checked(&self, space: &SpaceReport) {
        self.write_stdout(&Self::format_space(space));
    }

    fn run_end(&self, report: &Report) -> Result<()> {
        self.write_stdout(&Self::format_report(report));
        Ok(())
    }
}

/// Writes the structured report to a fixed path, replacing any previous one.
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for JsonReporter {
    fn run_end(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&self.path, json).map_err(|source| BenchError::Report {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}

fn gb_and_bytes(bytes: u64) -> String {
    format!("{}GB({})", bytes >> 30, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{FileCountInfo, TaskFailure};
    use std::time::Duration;

    fn sample_report() -> Report {
        let info = FileCountInfo::new(
            "/tmp/x/bench_file/random_file_0",
            1 << 30,
            Duration::from_secs(4),
            1 << 30,
        );
        Report::aggregate(vec![info], vec![], 1)
    }

    #[test]
    fn should_render_per_file_breakdown() {
        let text = ConsoleReporter::format_report(&sample_report());
        assert!(text.contains("random_file_0: "));
        assert!(text.contains("\tFileSize:  1GB(1073741824)"));
        assert!(text.contains("\tByteCount: 1GB(1073741824)"));
        assert!(text.contains("\tUsedTime:  4.00s"));
        assert!(text.contains("\tWriteRate: 256.00M/s"));
        assert!(text.contains("\tAverageWriteRate: 256.00M/s"));
        assert!(text.contains("\tAverageUsedTime: 4.00s"));
        assert!(!text.contains("Failures"));
    }

    #[test]
    fn should_render_failures_when_present() {
        let mut report = sample_report();
        report.failures.push(TaskFailure {
            file_name: "random_file_1".to_string(),
            bytes_written: 10,
            status: TaskStatus::Failed,
            error: "disk full".to_string(),
        });
        let text = ConsoleReporter::format_report(&report);
        assert!(text.contains("Failures: "));
        assert!(text.contains("random_file_1 (failed, 10 bytes written): disk full"));
    }

    #[test]
    fn should_render_space_summary() {
        let space = SpaceReport {
            path: PathBuf::from("/"),
            total: 10 << 30,
            available: 4 << 30,
            needed: 2 << 30,
        };
        let text = ConsoleReporter::format_space(&space);
        assert!(text.contains("\tTotal: 10GB(10737418240)"));
        assert!(text.contains("\tAvail: 4GB(4294967296)"));
        assert!(text.contains("\tNeed:  2GB(2147483648)"));
    }

    #[test]
    fn should_write_json_report_and_overwrite_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench-report.json");
        std::fs::write(&path, "x".repeat(100_000)).unwrap();

        let report = sample_report();
        JsonReporter::new(&path).run_end(&report).unwrap();

        let loaded: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded["FileInfo"].as_array().unwrap().len(), 1);
        assert_eq!(loaded["AverageWriteRate"], report.average_write_rate.as_str());
        assert_eq!(loaded["FileInfo"][0]["UsedTime"], "4.00s");
    }

    #[test]
    fn should_fail_when_report_path_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = JsonReporter::new(&path).run_end(&sample_report()).unwrap_err();
        assert!(matches!(err, BenchError::Report { .. }));
    }
}
