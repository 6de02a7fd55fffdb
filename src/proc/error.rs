//! Error types for procfs sampling.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::fsutil::FileOpenError;

/// A failure while reading or parsing a `/proc` counter file.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The process's counter files could not be opened, typically because the
    /// process has exited or never existed.
    #[error("process {pid} not found (`{path}`)")]
    NotFound { pid: i32, path: PathBuf },

    /// Reading the counter file requires elevated privilege, which is common
    /// for `/proc/<pid>/io`.
    #[error("permission denied reading `{path}`")]
    PermissionDenied { path: PathBuf },

    /// I/O rates are undefined over a non-positive interval; this is a caller
    /// error, not a clamped value.
    #[error("sampling interval must be positive, got {interval}")]
    InvalidInterval { interval: f64 },

    #[error(transparent)]
    Parse(#[from] ProcParseError),

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl SampleError {
    /// Classifies a file-open failure for the given process.
    pub(crate) fn from_open(pid: i32, err: FileOpenError) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SampleError::NotFound {
                pid,
                path: err.path,
            },
            std::io::ErrorKind::PermissionDenied => {
                SampleError::PermissionDenied { path: err.path }
            }
            _ => SampleError::Io(err.source),
        }
    }
}

/// A `/proc` file was readable but its content did not match the expected
/// format.
#[derive(Debug, Error)]
pub enum ProcParseError {
    #[error("unexpected format in `{file}`: {content:?}")]
    UnexpectedFormat {
        file: &'static str,
        content: String,
    },

    #[error("invalid value for '{field}' in `{file}`: '{value}': {source}")]
    InvalidValue {
        file: &'static str,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}
