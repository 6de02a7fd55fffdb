//! cgroup v2 control and accounting.
//!
//! [`CgroupManager`] creates groups, attaches processes and applies memory
//! and CPU limits by writing the kernel's control files directly; the
//! [`stats`] submodule parses the accounting files (`cpu.stat`, `io.stat`,
//! `memory.current`) back into typed counters.

mod error;
mod manager;
pub mod stats;

pub use error::CgroupError;
pub use manager::{CgroupManager, DEFAULT_CGROUP_ROOT};
