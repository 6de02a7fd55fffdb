//! Per-process resource telemetry over the proc pseudo-filesystem.
//!
//! [`Procfs`] is the counter source: one accessor per kernel-exposed file,
//! each returning parsed cumulative counters or a typed [`SampleError`].
//! On top of it sit the samplers:
//!
//! - [`CpuMonitor`] — stateful; converts tick counters into a CPU usage
//!   percentage over the interval between two `sample` calls.
//! - [`memory::sample`] — stateless; resident/virtual size, page faults and
//!   swap usage at the moment of the call.
//! - [`IoMonitor`] — stateful; converts disk byte/syscall counters into
//!   per-second rates over a caller-supplied interval, alongside system-wide
//!   network totals.
//!
//! Nothing here schedules itself: periodic sampling cadence is entirely the
//! caller's responsibility.

mod cpu;
mod error;
mod io;
pub mod memory;
pub mod parser;

pub use cpu::{CpuMonitor, CpuSample};
pub use error::{ProcParseError, SampleError};
pub use io::{IoMonitor, IoSample};
pub use memory::MemorySample;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

/// Default mount point of the proc pseudo-filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Handle on a proc filesystem root.
///
/// The root is configurable so tests (and containerized deployments with a
/// host `/proc` bind-mounted elsewhere) can point at an alternate tree.
#[derive(Debug, Clone)]
pub struct Procfs {
    root: PathBuf,
}

impl Default for Procfs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl Procfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_path(&self, pid: i32, file: &str) -> PathBuf {
        self.root.join(pid.to_string()).join(file)
    }

    /// Reads the stat line of a process.
    pub fn pid_stat(&self, pid: i32) -> Result<parser::PidStat, SampleError> {
        let line = self.read_first_line(pid, self.pid_path(pid, "stat"))?;
        Ok(parser::parse_pid_stat(&line)?)
    }

    /// Reads the system-wide total tick count from the aggregate cpu line.
    pub fn total_ticks(&self) -> Result<u64, SampleError> {
        let path = self.root.join("stat");
        let mut reader =
            fsutil::open_file_reader(&path).map_err(|err| SampleError::from_open(0, err))?;
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(parser::parse_total_ticks(&line)?)
    }

    /// Reads the extended status of a process (context switches, swap usage).
    pub fn pid_status(&self, pid: i32) -> Result<parser::PidStatus, SampleError> {
        let path = self.pid_path(pid, "status");
        let mut reader =
            fsutil::open_file_reader(path).map_err(|err| SampleError::from_open(pid, err))?;
        Ok(parser::parse_pid_status(&mut reader)?)
    }

    /// Reads the memory page counts of a process.
    pub fn pid_statm(&self, pid: i32) -> Result<parser::PidStatm, SampleError> {
        let line = self.read_first_line(pid, self.pid_path(pid, "statm"))?;
        Ok(parser::parse_pid_statm(&line)?)
    }

    /// Reads the disk I/O accounting of a process. Requires elevated
    /// privilege for processes not owned by the caller.
    pub fn pid_io(&self, pid: i32) -> Result<parser::PidIo, SampleError> {
        let path = self.pid_path(pid, "io");
        let mut reader =
            fsutil::open_file_reader(path).map_err(|err| SampleError::from_open(pid, err))?;
        Ok(parser::parse_pid_io(&mut reader)?)
    }

    /// Reads system-wide network totals, excluding loopback.
    pub fn net_totals(&self) -> Result<parser::NetTotals, SampleError> {
        let path = self.root.join("net/dev");
        let mut reader =
            fsutil::open_file_reader(path).map_err(|err| SampleError::from_open(0, err))?;
        Ok(parser::parse_net_dev(&mut reader)?)
    }

    /// Counts system-wide established TCP connections.
    pub fn tcp_established(&self) -> Result<u64, SampleError> {
        let path = self.root.join("net/tcp");
        let mut reader =
            fsutil::open_file_reader(path).map_err(|err| SampleError::from_open(0, err))?;
        Ok(parser::parse_tcp_established(&mut reader)?)
    }

    fn read_first_line(&self, pid: i32, path: PathBuf) -> Result<String, SampleError> {
        let mut reader =
            fsutil::open_file_reader(path).map_err(|err| SampleError::from_open(pid, err))?;
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(line)
    }
}

/// Seconds since the UNIX epoch, saturating at 0 for clocks set before it.
pub(crate) fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
