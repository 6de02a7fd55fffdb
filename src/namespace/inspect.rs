//! Namespace identity queries over procfs.
//!
//! Identities are read by statting `/proc/<pid>/ns/<type>`, following the
//! symlink. A link that cannot be statted (process gone, privilege, type
//! unknown to this kernel) is treated as absence: the identity is simply
//! omitted, and an absent identity never compares equal to anything.

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{NamespaceError, NamespaceType};
use crate::proc::DEFAULT_PROC_ROOT;

/// One resolved namespace membership of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamespaceIdentity {
    pub kind: NamespaceType,
    /// Inode of the namespace instance. Equal inodes mean the same
    /// namespace.
    pub inode: u64,
}

/// Per-type outcome of comparing two processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComparedNamespace {
    pub kind: NamespaceType,
    /// True only when both processes resolved an identity and the inodes
    /// match.
    pub shared: bool,
}

/// One distinct namespace instance in a system-wide report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub kind: NamespaceType,
    pub inode: u64,
    /// Number of scanned processes holding this identity.
    pub member_count: u64,
}

/// Reads namespace identities from a procfs tree.
#[derive(Debug, Clone)]
pub struct Inspector {
    proc_root: PathBuf,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl Inspector {
    /// Creates an inspector over the procfs mounted at `proc_root`. Tests
    /// point this at a fixture directory.
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    fn ns_path(&self, pid: i32, kind: NamespaceType) -> PathBuf {
        self.proc_root
            .join(pid.to_string())
            .join("ns")
            .join(kind.proc_name())
    }

    /// Resolves one identity, following the symlink. `None` is absence.
    fn ns_inode(&self, pid: i32, kind: NamespaceType) -> Option<u64> {
        fs::metadata(self.ns_path(pid, kind))
            .ok()
            .map(|meta| meta.ino())
    }

    /// Returns every resolvable namespace identity of `pid`, in
    /// [`NamespaceType::ALL`] order. Unreadable identities are omitted.
    ///
    /// # Errors
    ///
    /// Fails with [`NamespaceError::NotFound`] when the process has no
    /// procfs entry at all.
    pub fn identities(&self, pid: i32) -> Result<Vec<NamespaceIdentity>, NamespaceError> {
        self.check_pid(pid)?;

        Ok(NamespaceType::ALL
            .into_iter()
            .filter_map(|kind| {
                self.ns_inode(pid, kind)
                    .map(|inode| NamespaceIdentity { kind, inode })
            })
            .collect())
    }

    /// Compares the namespace identities of two processes, one row per type
    /// in [`NamespaceType::ALL`] order.
    ///
    /// A type is shared only when both sides resolved and the inodes are
    /// equal; two unreadable identities are never considered shared.
    pub fn compare(&self, pid1: i32, pid2: i32) -> Result<Vec<ComparedNamespace>, NamespaceError> {
        self.check_pid(pid1)?;
        self.check_pid(pid2)?;

        Ok(NamespaceType::ALL
            .into_iter()
            .map(|kind| {
                let shared = match (self.ns_inode(pid1, kind), self.ns_inode(pid2, kind)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                ComparedNamespace { kind, shared }
            })
            .collect())
    }

    /// Lists the pids of every scanned process whose `kind` namespace has
    /// the given inode. Linear in the process count.
    pub fn members(&self, kind: NamespaceType, inode: u64) -> Result<Vec<i32>, NamespaceError> {
        let pids = self.scan_pids()?;
        Ok(pids
            .into_iter()
            .filter(|&pid| self.ns_inode(pid, kind) == Some(inode))
            .collect())
    }

    /// Builds a system-wide report: for each type, one row per distinct
    /// namespace inode with the number of processes holding it. Rows for a
    /// type are ordered by inode.
    pub fn system_report(&self) -> Result<Vec<ReportRow>, NamespaceError> {
        let pids = self.scan_pids()?;

        let mut rows = Vec::new();
        for kind in NamespaceType::ALL {
            let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
            for &pid in &pids {
                if let Some(inode) = self.ns_inode(pid, kind) {
                    *counts.entry(inode).or_insert(0) += 1;
                }
            }
            rows.extend(counts.into_iter().map(|(inode, member_count)| ReportRow {
                kind,
                inode,
                member_count,
            }));
        }

        Ok(rows)
    }

    fn check_pid(&self, pid: i32) -> Result<(), NamespaceError> {
        if self.proc_root.join(pid.to_string()).is_dir() {
            Ok(())
        } else {
            Err(NamespaceError::NotFound { pid })
        }
    }

    /// Collects the numeric procfs entries, sorted ascending.
    fn scan_pids(&self) -> Result<Vec<i32>, NamespaceError> {
        let entries = fs::read_dir(&self.proc_root)
            .map_err(|source| NamespaceError::from_io(self.proc_root.clone(), source))?;

        let mut pids: Vec<i32> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                entry.file_name().to_str()?.parse::<i32>().ok()
            })
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }
}
