//! Linux namespace identity inspection and isolation overhead measurement.
//!
//! A process's namespace memberships are exposed as symlinks under
//! `/proc/<pid>/ns/`; the inode behind each link identifies the namespace
//! instance, so two processes share a namespace exactly when the inodes
//! match. [`Inspector`] reads and aggregates those identities;
//! [`bench::OverheadBenchmark`] measures the cost of creating and tearing
//! down each namespace type with an isolated child process.

pub mod bench;
mod error;
mod inspect;

pub use error::NamespaceError;
pub use inspect::{ComparedNamespace, Inspector, NamespaceIdentity, ReportRow};

use std::fmt;

use serde::Serialize;

/// The namespace types a process holds an identity in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceType {
    Pid,
    Net,
    Mnt,
    Uts,
    Ipc,
    User,
    Cgroup,
}

impl NamespaceType {
    /// Every known type, in the order reports list them.
    pub const ALL: [NamespaceType; 7] = [
        NamespaceType::Pid,
        NamespaceType::Net,
        NamespaceType::Mnt,
        NamespaceType::Uts,
        NamespaceType::Ipc,
        NamespaceType::User,
        NamespaceType::Cgroup,
    ];

    /// Types whose creation cost can be measured with a cloned child.
    /// Cgroup namespaces are excluded: entering one meaningfully requires
    /// cgroup filesystem setup a no-op child does not perform.
    pub const BENCHMARKABLE: [NamespaceType; 6] = [
        NamespaceType::Pid,
        NamespaceType::Net,
        NamespaceType::Mnt,
        NamespaceType::Uts,
        NamespaceType::Ipc,
        NamespaceType::User,
    ];

    /// The link name under `/proc/<pid>/ns/`.
    pub fn proc_name(self) -> &'static str {
        match self {
            NamespaceType::Pid => "pid",
            NamespaceType::Net => "net",
            NamespaceType::Mnt => "mnt",
            NamespaceType::Uts => "uts",
            NamespaceType::Ipc => "ipc",
            NamespaceType::User => "user",
            NamespaceType::Cgroup => "cgroup",
        }
    }

    /// Resolves a procfs link name back to its type.
    pub fn from_proc_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.proc_name() == name)
    }
}

impl fmt::Display for NamespaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.proc_name())
    }
}
