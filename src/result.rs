//! Benchmark result types.

use serde::Serialize;
use std::time::Duration;

const MIB: f64 = (1u64 << 20) as f64;

/// Measurements for one completed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCountInfo {
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Bytes the writer was asked to produce.
    #[serde(rename = "FileSize")]
    pub file_size_bytes: u64,
    /// Wall-clock time of the whole write.
    #[serde(rename = "UsedTime", with = "duration_text")]
    pub elapsed: Duration,
    /// Bytes actually written; never less than `file_size_bytes`.
    #[serde(rename = "ByteCount")]
    pub bytes_written: u64,
    #[serde(rename = "WriteRate")]
    pub write_rate_mbps: f64,
    /// Per-chunk write latency (only with the `hdr` feature).
    #[serde(
        rename = "ChunkLatency",
        skip_serializing_if = "Option::is_none"
    )]
    pub chunk_latency: Option<LatencySummary>,
}

impl FileCountInfo {
    pub fn new(
        file_name: impl Into<String>,
        file_size_bytes: u64,
        elapsed: Duration,
        bytes_written: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_size_bytes,
            elapsed,
            bytes_written,
            write_rate_mbps: write_rate_mbps(bytes_written, elapsed),
            chunk_latency: None,
        }
    }
}

/// Throughput in MiB/s. Zero when no time elapsed.
pub fn write_rate_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / MIB / secs
    } else {
        0.0
    }
}

/// Latency percentiles of individual write calls, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// How a writer ended without producing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Failed,
    Cancelled,
}

/// A writer that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskFailure {
    pub file_name: String,
    /// Bytes on disk when the writer stopped.
    #[serde(rename = "ByteCount")]
    pub bytes_written: u64,
    #[serde(rename = "Kind")]
    pub status: TaskStatus,
    pub error: String,
}

/// Structured report for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(rename = "FileInfo")]
    pub file_infos: Vec<FileCountInfo>,
    /// e.g. `"12.34M/s"`
    #[serde(rename = "AverageWriteRate")]
    pub average_write_rate: String,
    /// e.g. `"1.23s"`
    #[serde(rename = "AverageUsedTime")]
    pub average_used_time: String,
    #[serde(rename = "Failures", skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TaskFailure>,
}

impl Report {
    /// Build the report for a run of `concurrency` writers.
    ///
    /// Averages divide by `concurrency`, not by the number of completed
    /// files, so failed writers pull the averages toward zero.
    pub fn aggregate(
        file_infos: Vec<FileCountInfo>,
        failures: Vec<TaskFailure>,
        concurrency: usize,
    ) -> Self {
        let rate = average_write_rate(&file_infos, concurrency);
        let secs = average_used_secs(&file_infos, concurrency);
        Self {
            file_infos,
            average_write_rate: format!("{:.2}M/s", rate),
            average_used_time: format!("{:.2}s", secs),
            failures,
        }
    }
}

/// Sum of per-file rates divided by the configured concurrency.
pub fn average_write_rate(file_infos: &[FileCountInfo], concurrency: usize) -> f64 {
    if concurrency == 0 {
        return 0.0;
    }
    // f64 sum() of nothing is -0.0
    let total = file_infos.iter().fold(0.0, |acc, i| acc + i.write_rate_mbps);
    total / concurrency as f64
}

/// Sum of per-file elapsed seconds divided by the configured concurrency.
pub fn average_used_secs(file_infos: &[FileCountInfo], concurrency: usize) -> f64 {
    if concurrency == 0 {
        return 0.0;
    }
    let total = file_infos
        .iter()
        .fold(0.0, |acc, i| acc + i.elapsed.as_secs_f64());
    total / concurrency as f64
}

/// Format a duration with two decimals in s, ms, us or ns.
pub(crate) fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else if secs >= 0.001 {
        format!("{:.2}ms", secs * 1_000.0)
    } else if secs >= 0.000_001 {
        format!("{:.2}us", secs * 1_000_000.0)
    } else {
        format!("{:.2}ns", secs * 1_000_000_000.0)
    }
}

mod duration_text {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        super::format_duration(*d).serialize(s)
    }
}
