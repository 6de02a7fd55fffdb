//! Memory usage sampling for a single process.
//!
//! Delta-free: every value is an absolute read at the moment of the call, so
//! no prior state is needed or kept.

use serde::Serialize;

use super::error::SampleError;
use super::{Procfs, unix_timestamp};

/// Fallback when the page size cannot be queried.
const DEFAULT_PAGE_SIZE: u64 = 4096;

/// One memory observation for a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    pub pid: i32,
    /// UNIX timestamp of the observation, in seconds.
    pub timestamp: u64,
    /// Resident set size in bytes (physical memory in use).
    pub rss_bytes: u64,
    /// Virtual size in bytes (total mapped address space).
    pub vsize_bytes: u64,
    /// Cumulative page faults, minor and major combined. Reported as-is, not
    /// as a rate.
    pub page_faults: u64,
    /// Swapped-out memory in bytes; 0 when swap usage is unreadable.
    pub swap_bytes: u64,
}

/// Takes one memory observation for `pid`.
///
/// # Errors
///
/// Fails with [`SampleError::NotFound`] when the process's counter files
/// cannot be opened. Unreadable swap usage degrades to 0 with a warning
/// instead of failing the sample.
pub fn sample(procfs: &Procfs, pid: i32) -> Result<MemorySample, SampleError> {
    let statm = procfs.pid_statm(pid)?;
    let stat = procfs.pid_stat(pid)?;

    let swap_bytes = match procfs.pid_status(pid) {
        Ok(status) => status.swap_bytes,
        Err(err) => {
            log::warn!("could not read swap usage for pid {pid}: {err}");
            0
        }
    };

    let page_size = page_size();

    Ok(MemorySample {
        pid,
        timestamp: unix_timestamp(),
        rss_bytes: statm.resident_pages * page_size,
        vsize_bytes: statm.size_pages * page_size,
        page_faults: stat.page_faults(),
        swap_bytes,
    })
}

/// System page size in bytes.
pub fn page_size() -> u64 {
    match nix::unistd::sysconf(nix::unistd::SysconfVar::PAGE_SIZE) {
        Ok(Some(size)) if size > 0 => size as u64,
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::testutil::{stat_line, write_pid_entry};

    #[test]
    fn test_sample_converts_pages_to_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 7, "statm", "54532 1876 1067 96 0 7327 0\n");
        write_pid_entry(root, 7, "stat", &stat_line(7, 10, 5, 2, 2000, 66));
        write_pid_entry(
            root,
            7,
            "status",
            "Name:\ttest\nVmSwap:\t     256 kB\nvoluntary_ctxt_switches:\t1\n",
        );

        let sample = sample(&Procfs::new(root), 7).unwrap();
        let page = page_size();
        assert_eq!(sample.vsize_bytes, 54532 * page);
        assert_eq!(sample.rss_bytes, 1876 * page);
        assert_eq!(sample.page_faults, 2066);
        assert_eq!(sample.swap_bytes, 256 * 1024);
    }

    #[test]
    fn test_sample_missing_status_zero_swap() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_pid_entry(root, 7, "statm", "100 50 10 1 0 20 0\n");
        write_pid_entry(root, 7, "stat", &stat_line(7, 1, 1, 1, 0, 0));

        let sample = sample(&Procfs::new(root), 7).unwrap();
        assert_eq!(sample.swap_bytes, 0);
    }

    #[test]
    fn test_sample_missing_process() {
        let dir = tempfile::tempdir().unwrap();
        let err = sample(&Procfs::new(dir.path()), 999).unwrap_err();
        assert!(matches!(err, SampleError::NotFound { pid: 999, .. }));
    }
}
