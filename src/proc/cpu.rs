//! CPU usage sampling for a single process.
//!
//! The kernel only exposes cumulative tick counters, so a usage percentage is
//! only defined between two observations. [`CpuMonitor`] holds the previous
//! observation and advances it on every [`CpuMonitor::sample`] call.

use serde::Serialize;

use super::error::SampleError;
use super::{Procfs, unix_timestamp};

/// One CPU observation for a process.
///
/// Tick counters and the percentage are interval-based; the thread count and
/// context switch total are instantaneous absolutes read at sample time, not
/// rates. That asymmetry mirrors what the kernel exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuSample {
    pub pid: i32,
    /// UNIX timestamp of the observation, in seconds.
    pub timestamp: u64,
    /// Share of total system ticks consumed by the process since the previous
    /// observation, in percent. Exactly `0.0` when the system tick counter
    /// did not advance.
    pub cpu_percent: f64,
    /// Cumulative user-mode ticks.
    pub user_time_ticks: u64,
    /// Cumulative kernel-mode ticks.
    pub system_time_ticks: u64,
    /// Cumulative voluntary plus involuntary context switches.
    pub context_switches: u64,
    /// Current thread count.
    pub threads: u64,
}

/// Stateful CPU sampler for one process.
///
/// Owned by exactly one caller; there is no internal synchronization.
#[derive(Debug)]
pub struct CpuMonitor {
    procfs: Procfs,
    pid: i32,
    last_user_ticks: u64,
    last_system_ticks: u64,
    last_total_ticks: u64,
}

impl CpuMonitor {
    /// Takes the initial counter snapshot for `pid`.
    ///
    /// # Errors
    ///
    /// Fails with [`SampleError::NotFound`] when the process's counter files
    /// cannot be opened.
    pub fn init(procfs: Procfs, pid: i32) -> Result<Self, SampleError> {
        let stat = procfs.pid_stat(pid)?;
        let total_ticks = procfs.total_ticks()?;

        Ok(Self {
            procfs,
            pid,
            last_user_ticks: stat.utime_ticks,
            last_system_ticks: stat.stime_ticks,
            last_total_ticks: total_ticks,
        })
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Re-reads the counters, derives the usage percentage over the elapsed
    /// interval and advances the stored snapshot.
    ///
    /// Deltas are clamped at zero: a counter that moved backwards (process
    /// restart, PID reuse) yields 0, never an underflow.
    pub fn sample(&mut self) -> Result<CpuSample, SampleError> {
        let stat = self.procfs.pid_stat(self.pid)?;
        let total_ticks = self.procfs.total_ticks()?;

        let context_switches = match self.procfs.pid_status(self.pid) {
            Ok(status) => status.context_switches,
            Err(err) => {
                log::warn!(
                    "could not read context switches for pid {}: {err}",
                    self.pid
                );
                0
            }
        };

        let prev_proc = self.last_user_ticks + self.last_system_ticks;
        let curr_proc = stat.utime_ticks + stat.stime_ticks;
        let delta_proc = curr_proc.saturating_sub(prev_proc);
        let delta_total = total_ticks.saturating_sub(self.last_total_ticks);

        let cpu_percent = if delta_total > 0 {
            100.0 * delta_proc as f64 / delta_total as f64
        } else {
            0.0
        };

        self.last_user_ticks = stat.utime_ticks;
        self.last_system_ticks = stat.stime_ticks;
        self.last_total_ticks = total_ticks;

        Ok(CpuSample {
            pid: self.pid,
            timestamp: unix_timestamp(),
            cpu_percent,
            user_time_ticks: stat.utime_ticks,
            system_time_ticks: stat.stime_ticks,
            context_switches,
            threads: stat.threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::testutil::{stat_line, write_pid_entry};

    fn write_total_ticks(root: &std::path::Path, total: u64) {
        // Spread the total across user and idle; only the sum matters.
        std::fs::write(
            root.join("stat"),
            format!("cpu  {} 0 0 {} 0 0 0 0 0 0\n", total / 2, total - total / 2),
        )
        .unwrap();
    }

    fn write_status(root: &std::path::Path, pid: i32, voluntary: u64, nonvoluntary: u64) {
        write_pid_entry(
            root,
            pid,
            "status",
            &format!(
                "Name:\ttest\nvoluntary_ctxt_switches:\t{voluntary}\n\
                 nonvoluntary_ctxt_switches:\t{nonvoluntary}\n"
            ),
        );
    }

    #[test]
    fn test_percent_over_interval() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 42, "stat", &stat_line(42, 100, 50, 4, 0, 0));
        write_status(root, 42, 10, 5);
        write_total_ticks(root, 10_000);

        let mut monitor = CpuMonitor::init(Procfs::new(root), 42).unwrap();

        // Process consumed 250 of 1000 total ticks.
        write_pid_entry(root, 42, "stat", &stat_line(42, 300, 100, 5, 0, 0));
        write_total_ticks(root, 11_000);

        let sample = monitor.sample().unwrap();
        assert!((sample.cpu_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(sample.user_time_ticks, 300);
        assert_eq!(sample.system_time_ticks, 100);
        assert_eq!(sample.threads, 5);
        assert_eq!(sample.context_switches, 15);
    }

    #[test]
    fn test_zero_total_delta_yields_zero_percent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 42, "stat", &stat_line(42, 100, 50, 4, 0, 0));
        write_status(root, 42, 0, 0);
        write_total_ticks(root, 10_000);

        let mut monitor = CpuMonitor::init(Procfs::new(root), 42).unwrap();

        // Process ticks advanced but the total did not (same file contents).
        write_pid_entry(root, 42, "stat", &stat_line(42, 200, 50, 4, 0, 0));

        let sample = monitor.sample().unwrap();
        assert_eq!(sample.cpu_percent, 0.0);
    }

    #[test]
    fn test_counter_reset_clamps_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 42, "stat", &stat_line(42, 500, 500, 4, 0, 0));
        write_status(root, 42, 0, 0);
        write_total_ticks(root, 10_000);

        let mut monitor = CpuMonitor::init(Procfs::new(root), 42).unwrap();

        // PID reuse: counters went backwards.
        write_pid_entry(root, 42, "stat", &stat_line(42, 10, 5, 1, 0, 0));
        write_total_ticks(root, 11_000);

        let sample = monitor.sample().unwrap();
        assert_eq!(sample.cpu_percent, 0.0);
    }

    #[test]
    fn test_missing_status_degrades_to_zero_switches() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 42, "stat", &stat_line(42, 100, 50, 4, 0, 0));
        write_total_ticks(root, 10_000);

        let mut monitor = CpuMonitor::init(Procfs::new(root), 42).unwrap();
        write_total_ticks(root, 10_100);

        let sample = monitor.sample().unwrap();
        assert_eq!(sample.context_switches, 0);
    }

    #[test]
    fn test_init_missing_process() {
        let dir = tempfile::tempdir().unwrap();
        write_total_ticks(dir.path(), 10_000);
        let err = CpuMonitor::init(Procfs::new(dir.path()), 4242).unwrap_err();
        assert!(matches!(err, SampleError::NotFound { pid: 4242, .. }));
    }

    #[test]
    fn test_consecutive_samples_advance_state() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 42, "stat", &stat_line(42, 0, 0, 1, 0, 0));
        write_status(root, 42, 0, 0);
        write_total_ticks(root, 1_000);

        let mut monitor = CpuMonitor::init(Procfs::new(root), 42).unwrap();

        write_pid_entry(root, 42, "stat", &stat_line(42, 100, 0, 1, 0, 0));
        write_total_ticks(root, 1_200);
        let first = monitor.sample().unwrap();
        assert!((first.cpu_percent - 50.0).abs() < f64::EPSILON);

        // No movement since the previous sample.
        let second = monitor.sample().unwrap();
        assert_eq!(second.cpu_percent, 0.0);
    }
}
