//! Failure reasons for metric collection.
//!
//! Every variant is cheap to clone so one failure can be reported against
//! each series an adapter owns without re-reading the source.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a reading (or a whole adapter) produced no data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    /// A counter or sensor file could not be read.
    #[error("failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// Source text was read but did not have the expected shape.
    #[error("could not parse {what}: {reason}")]
    Parse { what: String, reason: String },

    /// An external probe could not be launched or exited unsuccessfully.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    /// An external probe did not finish in time and was killed.
    #[error("command `{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    /// A key or label the adapter looks for was not present this tick.
    #[error("{0} not found")]
    Missing(String),

    /// A required counter source is wholly inaccessible.
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// The adapter panicked while sampling.
    #[error("adapter panicked: {0}")]
    Panicked(String),
}

impl SampleError {
    pub fn read(path: &Path, err: &std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, SampleError>;
