//! Disk and network I/O sampling for a single process.
//!
//! Disk counters are per-process and delta-based. Network counters are
//! system-wide: the kernel exposes no per-process network accounting, so the
//! totals and connection count on [`IoSample`] describe the whole host and
//! must not be presented as process-scoped.

use serde::Serialize;

use super::error::SampleError;
use super::parser::NetTotals;
use super::{Procfs, unix_timestamp};

/// One I/O observation for a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IoSample {
    pub pid: i32,
    /// UNIX timestamp of the observation, in seconds.
    pub timestamp: u64,

    /// Cumulative bytes read from storage.
    pub read_bytes: u64,
    /// Cumulative bytes written to storage.
    pub write_bytes: u64,
    /// Cumulative read plus write syscalls.
    pub io_syscalls: u64,
    /// Alias of `io_syscalls`: the syscall sum stands in for a physical
    /// disk-operation count, which the kernel does not expose per process.
    pub disk_ops: u64,
    /// Read throughput over the sampling interval, in bytes per second.
    pub read_rate_bytes_per_sec: f64,
    /// Write throughput over the sampling interval, in bytes per second.
    pub write_rate_bytes_per_sec: f64,
    /// I/O syscall rate over the sampling interval, in operations per second.
    pub disk_ops_per_sec: f64,

    /// System-wide bytes received, all interfaces except loopback.
    pub rx_bytes: u64,
    /// System-wide bytes transmitted, all interfaces except loopback.
    pub tx_bytes: u64,
    /// System-wide packets received.
    pub rx_packets: u64,
    /// System-wide packets transmitted.
    pub tx_packets: u64,
    /// System-wide established TCP connections.
    pub connections: u64,
}

/// Stateful I/O sampler for one process.
///
/// Owned by exactly one caller; there is no internal synchronization.
#[derive(Debug)]
pub struct IoMonitor {
    procfs: Procfs,
    pid: i32,
    last_read_bytes: u64,
    last_write_bytes: u64,
    last_io_syscalls: u64,
}

impl IoMonitor {
    /// Takes the initial counter snapshot for `pid`.
    ///
    /// # Errors
    ///
    /// Fails with [`SampleError::NotFound`] when the accounting file cannot
    /// be opened, or [`SampleError::PermissionDenied`] when reading it
    /// requires privilege the caller lacks.
    pub fn init(procfs: Procfs, pid: i32) -> Result<Self, SampleError> {
        let io = procfs.pid_io(pid)?;

        Ok(Self {
            procfs,
            pid,
            last_read_bytes: io.read_bytes,
            last_write_bytes: io.write_bytes,
            last_io_syscalls: io.io_syscalls(),
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Re-reads the counters and derives per-second rates over
    /// `interval_secs`, then advances the stored snapshot.
    ///
    /// # Errors
    ///
    /// Fails with [`SampleError::InvalidInterval`] before performing any
    /// read when `interval_secs` is zero or negative. Unreadable network
    /// counters degrade to zero with a warning; a failed disk read fails the
    /// whole sample.
    pub fn sample(&mut self, interval_secs: f64) -> Result<IoSample, SampleError> {
        if interval_secs <= 0.0 {
            return Err(SampleError::InvalidInterval {
                interval: interval_secs,
            });
        }

        let io = self.procfs.pid_io(self.pid)?;
        let io_syscalls = io.io_syscalls();

        let net = match self.procfs.net_totals() {
            Ok(totals) => totals,
            Err(err) => {
                log::warn!("could not read network totals: {err}");
                NetTotals::default()
            }
        };
        let connections = match self.procfs.tcp_established() {
            Ok(count) => count,
            Err(err) => {
                log::warn!("could not count TCP connections: {err}");
                0
            }
        };

        let delta_read = io.read_bytes.saturating_sub(self.last_read_bytes);
        let delta_write = io.write_bytes.saturating_sub(self.last_write_bytes);
        let delta_ops = io_syscalls.saturating_sub(self.last_io_syscalls);

        self.last_read_bytes = io.read_bytes;
        self.last_write_bytes = io.write_bytes;
        self.last_io_syscalls = io_syscalls;

        Ok(IoSample {
            pid: self.pid,
            timestamp: unix_timestamp(),
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
            io_syscalls,
            disk_ops: io_syscalls,
            read_rate_bytes_per_sec: delta_read as f64 / interval_secs,
            write_rate_bytes_per_sec: delta_write as f64 / interval_secs,
            disk_ops_per_sec: delta_ops as f64 / interval_secs,
            rx_bytes: net.rx_bytes,
            tx_bytes: net.tx_bytes,
            rx_packets: net.rx_packets,
            tx_packets: net.tx_packets,
            connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::testutil::write_pid_entry;

    fn write_pid_io(root: &std::path::Path, pid: i32, read: u64, write: u64, syscr: u64, syscw: u64) {
        write_pid_entry(
            root,
            pid,
            "io",
            &format!(
                "rchar: 0\nwchar: 0\nsyscr: {syscr}\nsyscw: {syscw}\n\
                 read_bytes: {read}\nwrite_bytes: {write}\ncancelled_write_bytes: 0\n"
            ),
        );
    }

    #[test]
    fn test_rates_over_interval() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_io(root, 9, 1000, 2000, 10, 20);

        let mut monitor = IoMonitor::init(Procfs::new(root), 9).unwrap();

        write_pid_io(root, 9, 3000, 2500, 40, 30);
        let sample = monitor.sample(2.0).unwrap();

        assert_eq!(sample.read_bytes, 3000);
        assert_eq!(sample.write_bytes, 2500);
        assert_eq!(sample.io_syscalls, 70);
        assert_eq!(sample.disk_ops, sample.io_syscalls);
        assert!((sample.read_rate_bytes_per_sec - 1000.0).abs() < f64::EPSILON);
        assert!((sample.write_rate_bytes_per_sec - 250.0).abs() < f64::EPSILON);
        assert!((sample.disk_ops_per_sec - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_interval_fails_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_io(root, 9, 0, 0, 0, 0);

        let mut monitor = IoMonitor::init(Procfs::new(root), 9).unwrap();

        // Remove the accounting file: a read attempt would fail loudly, so a
        // clean InvalidInterval proves nothing was read.
        std::fs::remove_file(root.join("9/io")).unwrap();

        let err = monitor.sample(0.0).unwrap_err();
        assert!(matches!(err, SampleError::InvalidInterval { .. }));
        let err = monitor.sample(-1.5).unwrap_err();
        assert!(matches!(err, SampleError::InvalidInterval { .. }));
    }

    #[test]
    fn test_counter_reset_clamps_rates_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_io(root, 9, 5000, 5000, 50, 50);

        let mut monitor = IoMonitor::init(Procfs::new(root), 9).unwrap();

        write_pid_io(root, 9, 100, 100, 1, 1);
        let sample = monitor.sample(1.0).unwrap();
        assert_eq!(sample.read_rate_bytes_per_sec, 0.0);
        assert_eq!(sample.write_rate_bytes_per_sec, 0.0);
        assert_eq!(sample.disk_ops_per_sec, 0.0);
    }

    #[test]
    fn test_network_totals_included_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_io(root, 9, 0, 0, 0, 0);
        std::fs::create_dir_all(root.join("net")).unwrap();
        std::fs::write(
            root.join("net/dev"),
            "header\nheader\n\
             lo: 999 9 0 0 0 0 0 0 999 9 0 0 0 0 0 0\n\
             eth0: 1234 12 0 0 0 0 0 0 5678 56 0 0 0 0 0 0\n",
        )
        .unwrap();
        std::fs::write(
            root.join("net/tcp"),
            "header\n\
             0: 0100007F:0CEA 00000000:0000 0A 0 0 0 0 0 1000 0 1\n\
             1: 0100007F:0CEA 0100007F:A342 01 0 0 0 0 0 1000 0 2\n",
        )
        .unwrap();

        let mut monitor = IoMonitor::init(Procfs::new(root), 9).unwrap();
        let sample = monitor.sample(1.0).unwrap();
        assert_eq!(sample.rx_bytes, 1234);
        assert_eq!(sample.tx_bytes, 5678);
        assert_eq!(sample.rx_packets, 12);
        assert_eq!(sample.tx_packets, 56);
        assert_eq!(sample.connections, 1);
    }

    #[test]
    fn test_unreadable_network_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_io(root, 9, 0, 0, 0, 0);

        let mut monitor = IoMonitor::init(Procfs::new(root), 9).unwrap();
        let sample = monitor.sample(1.0).unwrap();
        assert_eq!(sample.rx_bytes, 0);
        assert_eq!(sample.tx_bytes, 0);
        assert_eq!(sample.connections, 0);
    }
}
