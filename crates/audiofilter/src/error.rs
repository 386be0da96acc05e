//! Error types for the audio filtering pipeline.
//!
//! Every failure is contained at the single-file boundary: the processor turns
//! these into a `Failed` outcome and moves on to the next file.

use std::io;
use std::path::PathBuf;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Track metadata could not be obtained for a file.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The identification tool could not be executed at all.
    #[error("failed to run {tool} on {}: {source}", path.display())]
    Spawn {
        tool: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The identification tool ran but reported failure.
    #[error("{tool} failed (exit code {}) for {}: {message}", code.map_or("none".to_string(), |c| c.to_string()), path.display())]
    Failed {
        tool: String,
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    /// The container is corrupt or of a format the tool cannot read.
    #[error("container not recognized: {}: {message}", path.display())]
    Unrecognized { path: PathBuf, message: String },

    /// The tool's output did not match the expected schema.
    #[error("malformed identification output for {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// The remux step failed or produced an unusable file.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to run {tool} for {}: {source}", path.display())]
    Spawn {
        tool: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed (exit code {}) for {}: {message}", code.map_or("none".to_string(), |c| c.to_string()), path.display())]
    Failed {
        tool: String,
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    /// Remux output did not pass the post-write checks.
    #[error("output verification failed for {}: {message}", path.display())]
    Verification { path: PathBuf, message: String },

    /// The remux tool writes Matroska; other containers are never replaced in place.
    #[error("refusing to rewrite {}: .{extension} is not a rewritable container", path.display())]
    UnsupportedContainer { path: PathBuf, extension: String },

    /// The original was modified by someone else while the remux ran.
    #[error("source changed during rewrite: {}", path.display())]
    SourceChanged { path: PathBuf },
}

/// A filesystem operation (temp creation, rename, delete, stat) failed.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed for {}: {source}", path.display())]
pub struct FilesystemError {
    pub operation: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FilesystemError {
    pub fn new(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// The external tools could not be located or do not run.
///
/// Only raised during pre-flight, before any file is processed.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{tool} not found at {}", path.display())]
    NotInDirectory { tool: String, path: PathBuf },

    #[error("{tool} not found in PATH or common install locations")]
    NotFound { tool: String },

    #[error("{tool} at {} is not usable: {message}", path.display())]
    Unusable {
        tool: String,
        path: PathBuf,
        message: String,
    },
}

/// Umbrella error for one file's processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl Error {
    /// Short label written to the outcome log.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Probe(_) => "probe",
            Error::Rewrite(_) => "rewrite",
            Error::Filesystem(_) => "filesystem",
        }
    }
}
