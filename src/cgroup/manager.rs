//! Creation, attachment, limit control and usage queries for cgroup v2
//! groups.
//!
//! All operations address a group by name under a configurable root, which
//! defaults to [`DEFAULT_CGROUP_ROOT`]. With cgroup v2 a single directory
//! carries every controller, so there is no per-controller path juggling.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::CgroupError;
use super::stats::{CpuStat, IoStat, KeyValueStat, MemoryUsage, SingleLineStat};
use crate::fsutil;

/// Mount point of the unified cgroup v2 hierarchy on standard systems.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Handle on a cgroup v2 hierarchy root.
#[derive(Debug, Clone)]
pub struct CgroupManager {
    root: PathBuf,
}

impl Default for CgroupManager {
    fn default() -> Self {
        Self::new(DEFAULT_CGROUP_ROOT)
    }
}

impl CgroupManager {
    /// Creates a manager rooted at `root`. Tests point this at a temporary
    /// directory instead of the live hierarchy.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn control_path(&self, name: &str, file: &str) -> PathBuf {
        self.group_path(name).join(file)
    }

    /// Creates the group directory. Idempotent: a group that already exists
    /// is success, and no existing configuration is touched.
    ///
    /// # Errors
    ///
    /// Fails with [`CgroupError::PermissionDenied`] without write access to
    /// the hierarchy root, or [`CgroupError::NotFound`] when the root itself
    /// is missing.
    pub fn create(&self, name: &str) -> Result<(), CgroupError> {
        let path = self.group_path(name);
        match fs::create_dir(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(err) => Err(CgroupError::from_io(path, err)),
        }
    }

    /// Moves `pid` into the group by writing it to `cgroup.procs`.
    pub fn attach(&self, name: &str, pid: i32) -> Result<(), CgroupError> {
        self.write_control(name, "cgroup.procs", &pid.to_string())
    }

    /// Sets the hard memory limit via `memory.max`. Any non-positive value
    /// removes the limit by writing the `max` sentinel.
    pub fn set_memory_limit(&self, name: &str, bytes: i64) -> Result<(), CgroupError> {
        let value = if bytes <= 0 {
            "max".to_string()
        } else {
            bytes.to_string()
        };
        self.write_control(name, "memory.max", &value)
    }

    /// Sets the CPU bandwidth limit via `cpu.max` as a fraction of cores per
    /// enforcement period. The quota is `cores * period_us` truncated to a
    /// whole microsecond count, so `0.5` cores over a 100ms period writes
    /// `50000 100000`.
    pub fn set_cpu_limit(&self, name: &str, cores: f64, period_us: u64) -> Result<(), CgroupError> {
        let quota = (cores * period_us as f64) as u64;
        self.write_control(name, "cpu.max", &format!("{quota} {period_us}"))
    }

    /// Reads the group's current memory usage in bytes from `memory.current`.
    pub fn memory_usage(&self, name: &str) -> Result<u64, CgroupError> {
        let usage: MemoryUsage = self.read_control(name, "memory.current")?;
        Ok(usage.usage_bytes)
    }

    /// Reads the group's cumulative CPU usage in microseconds from
    /// `cpu.stat`.
    pub fn cpu_usage(&self, name: &str) -> Result<u64, CgroupError> {
        Ok(self.cpu_stat(name)?.usage_usec)
    }

    /// Reads the full set of CPU counters from `cpu.stat`.
    pub fn cpu_stat(&self, name: &str) -> Result<CpuStat, CgroupError> {
        let path = self.control_path(name, "cpu.stat");
        let mut reader = fsutil::open_file_reader(&path).map_err(CgroupError::from_open)?;
        CpuStat::from_reader(&mut reader).map_err(|err| CgroupError::from_io(path, err))
    }

    /// Reads block I/O counters from `io.stat`, summed across devices.
    ///
    /// An empty file parses to all-zero counters; an unopenable file is an
    /// error, keeping "no I/O yet" distinct from "cannot tell".
    pub fn io_stats(&self, name: &str) -> Result<IoStat, CgroupError> {
        let path = self.control_path(name, "io.stat");
        let mut reader = fsutil::open_file_reader(&path).map_err(CgroupError::from_open)?;
        IoStat::from_reader(&mut reader).map_err(|err| CgroupError::from_io(path, err))
    }

    fn read_control<T: SingleLineStat>(&self, name: &str, file: &str) -> Result<T, CgroupError> {
        let path = self.control_path(name, file);
        let mut reader = fsutil::open_file_reader(&path).map_err(CgroupError::from_open)?;
        T::from_reader(&mut reader).map_err(|err| CgroupError::from_io(path, err))
    }

    fn write_control(&self, name: &str, file: &str, value: &str) -> Result<(), CgroupError> {
        let path = self.control_path(name, file);
        fs::write(&path, value).map_err(|err| CgroupError::from_io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The kernel materializes control files on mkdir; a plain tempdir does
    // not, so write-path tests create them up front.
    fn seed_group(root: &Path, name: &str) {
        let group = root.join(name);
        fs::create_dir_all(&group).unwrap();
        for file in ["cgroup.procs", "memory.max", "cpu.max"] {
            fs::write(group.join(file), "").unwrap();
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CgroupManager::new(dir.path());

        manager.create("workload").unwrap();
        assert!(dir.path().join("workload").is_dir());

        // Re-creating must succeed and leave existing configuration alone.
        fs::write(dir.path().join("workload/memory.max"), "1234").unwrap();
        manager.create("workload").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("workload/memory.max")).unwrap(),
            "1234"
        );
    }

    #[test]
    fn test_create_missing_root() {
        let manager = CgroupManager::new("/definitely/not/a/cgroup/root");
        let err = manager.create("workload").unwrap_err();
        assert!(matches!(err, CgroupError::NotFound { .. }));
    }

    #[test]
    fn test_attach_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        manager.attach("workload", 4321).unwrap();
        let written = fs::read_to_string(dir.path().join("workload/cgroup.procs")).unwrap();
        assert_eq!(written, "4321");
    }

    #[test]
    fn test_set_memory_limit_positive() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        manager.set_memory_limit("workload", 512 * 1024 * 1024).unwrap();
        let written = fs::read_to_string(dir.path().join("workload/memory.max")).unwrap();
        assert_eq!(written, "536870912");
    }

    #[test]
    fn test_set_memory_limit_non_positive_writes_max() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        manager.set_memory_limit("workload", 0).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("workload/memory.max")).unwrap(),
            "max"
        );

        manager.set_memory_limit("workload", -1).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("workload/memory.max")).unwrap(),
            "max"
        );
    }

    #[test]
    fn test_set_cpu_limit_half_core() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        manager.set_cpu_limit("workload", 0.5, 100_000).unwrap();
        let written = fs::read_to_string(dir.path().join("workload/cpu.max")).unwrap();
        assert_eq!(written, "50000 100000");
    }

    #[test]
    fn test_set_cpu_limit_truncates_quota() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        // 1.5 cores over a 33333us period: 49999.5 truncates to 49999.
        manager.set_cpu_limit("workload", 1.5, 33_333).unwrap();
        let written = fs::read_to_string(dir.path().join("workload/cpu.max")).unwrap();
        assert_eq!(written, "49999 33333");
    }

    #[test]
    fn test_memory_usage() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        fs::write(dir.path().join("workload/memory.current"), "1048576\n").unwrap();
        let manager = CgroupManager::new(dir.path());

        assert_eq!(manager.memory_usage("workload").unwrap(), 1_048_576);
    }

    #[test]
    fn test_cpu_usage_returns_usage_usec() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        fs::write(
            dir.path().join("workload/cpu.stat"),
            "usage_usec 5000\nuser_usec 3000\nsystem_usec 2000\n",
        )
        .unwrap();
        let manager = CgroupManager::new(dir.path());

        assert_eq!(manager.cpu_usage("workload").unwrap(), 5000);
    }

    #[test]
    fn test_io_stats_sums_devices() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        fs::write(
            dir.path().join("workload/io.stat"),
            "8:0 rbytes=100 wbytes=150 rios=3 wios=4\n254:0 rbytes=50 wbytes=50 rios=1 wios=2\n",
        )
        .unwrap();
        let manager = CgroupManager::new(dir.path());

        let stat = manager.io_stats("workload").unwrap();
        assert_eq!(stat.rbytes, 150);
        assert_eq!(stat.wbytes, 200);
    }

    #[test]
    fn test_missing_stat_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        let manager = CgroupManager::new(dir.path());

        let err = manager.io_stats("workload").unwrap_err();
        assert!(matches!(err, CgroupError::NotFound { .. }));
    }

    #[test]
    fn test_garbage_stat_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        seed_group(dir.path(), "workload");
        fs::write(dir.path().join("workload/memory.current"), "not-a-number\n").unwrap();
        let manager = CgroupManager::new(dir.path());

        let err = manager.memory_usage("workload").unwrap_err();
        assert!(matches!(err, CgroupError::Parse { .. }));
    }
}
