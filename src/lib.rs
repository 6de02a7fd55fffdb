//! Per-process resource telemetry and control for Linux.
//!
//! This library reads the kernel's procfs accounting files to sample CPU,
//! memory and I/O usage of individual processes, drives cgroup v2 limits
//! through the unified hierarchy, and inspects namespace identities exposed
//! under `/proc/<pid>/ns/`. All data sources take a configurable filesystem
//! root so the whole stack can run against fixture trees in tests.

pub mod cgroup;
pub mod fsutil;
pub mod namespace;
pub mod proc;
pub mod record;
