use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fsutil::FileOpenError;

/// Errors returned by cgroup control and stat operations.
///
/// Variants are classified from the underlying `io::ErrorKind` so callers can
/// distinguish an absent group from a privilege problem or a disabled
/// controller without string matching.
#[derive(Debug, Error)]
pub enum CgroupError {
    /// The cgroup directory or control file does not exist.
    #[error("cgroup path `{path}` does not exist")]
    NotFound { path: PathBuf },

    /// The caller lacks privilege to touch the control file. Writes below
    /// `/sys/fs/cgroup` generally require root.
    #[error("permission denied for cgroup path `{path}`")]
    PermissionDenied { path: PathBuf },

    /// The controller backing the file is disabled at the kernel level, so
    /// the operation cannot succeed in this configuration.
    #[error("operation not supported for cgroup path `{path}`")]
    Unsupported { path: PathBuf },

    /// The control file existed but its contents did not parse. Distinct
    /// from zero usage, which is a valid parsed value.
    #[error("failed to parse cgroup file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error("cgroup I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CgroupError {
    /// Classifies an I/O failure on `path` into the matching variant.
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::Unsupported => Self::Unsupported { path },
            io::ErrorKind::InvalidData => Self::Parse { path, source },
            _ => Self::Io { path, source },
        }
    }

    pub(crate) fn from_open(err: FileOpenError) -> Self {
        Self::from_io(err.path, err.source)
    }
}
