//! disk-bench: measure sequential write throughput of a directory.
//!
//! Writes `--con` files of `--size` GB each into `<path>/bench_file/`
//! concurrently, prints per-file and average throughput, and optionally
//! writes `bench-report.json` and removes the generated files.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use disk_bench::{DiskBench, RunConfig, RunOutcome, DEFAULT_CHUNK_SIZE, DEFAULT_REPORT_PATH};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "disk-bench",
    about = "Concurrent disk-write throughput benchmark",
    long_about = "
disk-bench fills <path>/bench_file/ with concurrently written files and
reports per-file and average write throughput.

Example:
    disk-bench --path=/mnt/data                   # one 1GB file
    disk-bench --path=/mnt/data --size=4 --con=8  # eight 4GB files
    disk-bench --path=/mnt/data --json --clean    # write report, remove files
"
)]
struct Cli {
    // ========================================================================
    // Workload
    // ========================================================================
    /// Directory to write into (not a file name); files go to <path>/bench_file/
    #[arg(long)]
    path: Option<PathBuf>,

    /// File size in GB, e.g. --size=1 is 1GB
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    size: u64,

    /// Number of files generated concurrently
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    con: u64,

    /// Bytes per write call
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// fsync each file before stopping its timer
    #[arg(long)]
    sync: bool,

    // ========================================================================
    // Output Control
    // ========================================================================
    /// Write a JSON report
    #[arg(long)]
    json: bool,

    /// Where the JSON report goes
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,

    /// Delete the bench files after reporting
    #[arg(long)]
    clean: bool,

    /// Do not print live write progress
    #[arg(long)]
    no_progress: bool,

    /// Verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

// ============================================================================
// Verbosity Control
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    fn from_args(args: &Cli) -> Self {
        if args.quiet {
            Verbosity::Quiet
        } else if args.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(Verbosity::from_args(&cli));

    let Some(path) = cli.path.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let concurrency = usize::try_from(cli.con).context("--con does not fit in usize")?;
    let config = RunConfig::new(path)
        .size_gb(cli.size)
        .concurrency(concurrency)
        .chunk_size(cli.chunk_size)
        .sync_on_finish(cli.sync)
        .emit_json(cli.json)
        .report_path(cli.report)
        .cleanup_after(cli.clean)
        .show_progress(!cli.no_progress);

    let bench = DiskBench::new(config);
    let token = bench.cancel_token();
    ctrlc::set_handler(move || token.cancel()).context("failed to install Ctrl-C handler")?;

    match bench.run().context("benchmark aborted")? {
        RunOutcome::Completed { report, .. } => {
            if !report.failures.is_empty() {
                info!(
                    failed = report.failures.len(),
                    "some files did not complete; averages still divide by --con"
                );
            }
        }
        RunOutcome::InsufficientSpace(space) => {
            info!(deficit = space.deficit(), "not enough space, nothing written");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_defaults() {
        let cli = Cli::try_parse_from(["disk-bench", "--path=/tmp/x"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.size, 1);
        assert_eq!(cli.con, 1);
        assert!(!cli.json);
        assert!(!cli.clean);
        assert_eq!(cli.report, PathBuf::from("bench-report.json"));
    }

    #[test]
    fn should_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "disk-bench",
            "--path=/tmp/x",
            "--size=4",
            "--con=8",
            "--json",
            "--clean",
        ])
        .unwrap();
        assert_eq!(cli.size, 4);
        assert_eq!(cli.con, 8);
        assert!(cli.json);
        assert!(cli.clean);
    }

    #[test]
    fn should_allow_missing_path() {
        let cli = Cli::try_parse_from(["disk-bench"]).unwrap();
        assert!(cli.path.is_none());
    }

    #[test]
    fn should_reject_zero_size_and_concurrency() {
        assert!(Cli::try_parse_from(["disk-bench", "--path=/x", "--size=0"]).is_err());
        assert!(Cli::try_parse_from(["disk-bench", "--path=/x", "--con=0"]).is_err());
    }

    #[test]
    fn should_pick_verbosity_from_flags() {
        let cli = Cli::try_parse_from(["disk-bench", "-q"]).unwrap();
        assert_eq!(Verbosity::from_args(&cli), Verbosity::Quiet);
        let cli = Cli::try_parse_from(["disk-bench", "-v"]).unwrap();
        assert_eq!(Verbosity::from_args(&cli).default_filter(), "debug");
    }

    #[test]
    fn should_have_valid_cli_definition() {
        Cli::command().debug_assert();
    }
}
