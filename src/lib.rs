//! # disk-bench
//!
//! A disk-write throughput benchmark.
//!
//! A run fills `<path>/bench_file/` with `concurrency` files of a fixed size,
//! each written by its own thread in fixed-size chunks, and reports per-file
//! and average throughput. A free-space check runs first so a benchmark never
//! fills the filesystem halfway through.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use disk_bench::{DiskBench, RunConfig, RunOutcome};
//!
//! let config = RunConfig::new("/mnt/scratch")
//!     .size_gb(1)
//!     .concurrency(2)
//!     .cleanup_after(true);
//!
//! if let RunOutcome::Completed { report, .. } = DiskBench::new(config).run()? {
//!     println!("average: {}", report.average_write_rate);
//! }
//! # Ok::<(), disk_bench::BenchError>(())
//! ```
//!
//! ## Features
//!
//! - **`hdr`**: Record per-chunk write latency percentiles
//! - **`async`**: Run writers on the tokio blocking pool

mod cancel;
mod config;
mod context;
mod coordinator;
mod error;
mod payload;
mod report;
mod result;
mod runner;
mod space;
mod writer;

pub use cancel::CancelToken;
pub use config::{RunConfig, BENCH_DIR_NAME, DEFAULT_CHUNK_SIZE, DEFAULT_REPORT_PATH};
pub use context::TaskContext;
pub use coordinator::{plan_tasks, Coordinator, CoordinatorOutcome, WriteTask};
pub use error::{BenchError, Result};
pub use payload::PayloadGenerator;
pub use report::{ConsoleReporter, JsonReporter, Reporter};
pub use result::{
    average_used_secs, average_write_rate, write_rate_mbps, FileCountInfo, LatencySummary,
    Report, TaskFailure, TaskStatus,
};
pub use runner::{cleanup, DiskBench, RunOutcome};
pub use space::{
    check_space, check_space_enough, nearest_existing, SpaceInfo, SpaceProbe, SpaceReport,
    StatvfsProbe,
};
pub use writer::{ChunkedWriter, ConsoleProgress, FailureKind, NoProgress, ProgressSink, WriteFailure};

#[cfg(feature = "hdr")]
pub mod histogram;

#[cfg(feature = "async")]
pub mod async_runner;
