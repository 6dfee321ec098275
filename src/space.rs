//! Preflight free-space check.
//!
//! The check runs once before any writer starts. Space consumed by other
//! processes during the run is not re-checked, so a run that passes the gate
//! can still fail later with a per-file write error.

use crate::error::{BenchError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Capacity figures for the filesystem containing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceInfo {
    pub total: u64,
    /// Bytes available to unprivileged users.
    pub available: u64,
}

/// Source of filesystem capacity figures.
pub trait SpaceProbe: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<SpaceInfo>;
}

/// Reads capacity with `statvfs(3)`.
pub struct StatvfsProbe;

#[cfg(unix)]
impl SpaceProbe for StatvfsProbe {
    fn stat(&self, path: &Path) -> io::Result<SpaceInfo> {
        let stat = nix::sys::statvfs::statvfs(path)?;
        let fragment = stat.fragment_size() as u64;
        Ok(SpaceInfo {
            total: (stat.blocks() as u64).saturating_mul(fragment),
            available: (stat.blocks_available() as u64).saturating_mul(fragment),
        })
    }
}

#[cfg(not(unix))]
impl SpaceProbe for StatvfsProbe {
    fn stat(&self, _path: &Path) -> io::Result<SpaceInfo> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "filesystem capacity query",
        ))
    }
}

/// Outcome of the capacity gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceReport {
    /// The path that was actually statted.
    pub path: PathBuf,
    pub total: u64,
    pub available: u64,
    pub needed: u64,
}

impl SpaceReport {
    pub fn enough(&self) -> bool {
        self.needed <= self.available
    }

    /// How many bytes short the filesystem is; zero when there is room.
    pub fn deficit(&self) -> u64 {
        self.needed.saturating_sub(self.available)
    }
}

/// Stat the filesystem holding `path` and compare against `needed` bytes.
///
/// `path` must exist; a failed stat is a setup error, not "not enough".
pub fn check_space(probe: &dyn SpaceProbe, path: &Path, needed: u64) -> Result<SpaceReport> {
    let info = probe.stat(path).map_err(|source| BenchError::Stat {
        path: path.to_path_buf(),
        source,
    })?;

    let report = SpaceReport {
        path: path.to_path_buf(),
        total: info.total,
        available: info.available,
        needed,
    };

    if !report.enough() {
        warn!(
            available = report.available,
            needed = report.needed,
            deficit = report.deficit(),
            "not enough space, avail: {}GB({}), need: {}GB({}), diff: {}GB({})",
            report.available >> 30,
            report.available,
            report.needed >> 30,
            report.needed,
            report.deficit() >> 30,
            report.deficit(),
        );
    }

    Ok(report)
}

/// Convenience form of [`check_space`] returning only the verdict.
pub fn check_space_enough(probe: &dyn SpaceProbe, path: &Path, needed: u64) -> Result<bool> {
    check_space(probe, path, needed).map(|r| r.enough())
}

/// Closest ancestor of `path` (or `path` itself) that exists.
///
/// Lets the gate run before the bench directory is created.
pub fn nearest_existing(path: &Path) -> PathBuf {
    let mut current = path;
    loop {
        if current.exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent,
            _ => return PathBuf::from("."),
        }
    }
}
