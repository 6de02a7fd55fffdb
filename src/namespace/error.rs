use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::NamespaceType;

/// Errors from namespace inspection and benchmarking.
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// The process has no procfs entry, i.e. it does not exist.
    #[error("process {pid} does not exist")]
    NotFound { pid: i32 },

    /// A procfs path could not be read for privilege reasons. Individual
    /// namespace links degrade to absence instead; this covers the scan
    /// root itself.
    #[error("permission denied reading `{path}`")]
    PermissionDenied { path: PathBuf },

    /// Isolation of this kind cannot be performed here, either because the
    /// platform has no namespaces or the type is not benchmarkable.
    #[error("{kind} namespace isolation is not supported here")]
    Unsupported { kind: NamespaceType },

    /// Creating the isolated child failed, typically for lack of privilege
    /// (most namespace types require `CAP_SYS_ADMIN`).
    #[error("failed to spawn child isolated in a {kind} namespace: {source}")]
    Spawn {
        kind: NamespaceType,
        #[source]
        source: nix::Error,
    },

    /// Any other I/O failure.
    #[error("namespace I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NamespaceError {
    /// Classifies an I/O failure on `path` into the matching variant.
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io(source),
        }
    }
}
