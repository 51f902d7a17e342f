//! WQM-prefixed error types with structured error codes.
//!
//! The scan/evaluate/escalate pipeline itself degrades quietly (empty
//! inventory, skipped entries, vacuous results) and never surfaces these.
//! The coded errors cover the layers that can legitimately fail: config file
//! loading, serialization, and CLI I/O.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, WqmError>;

/// Top-level error type for Workspace Quota Monitor.
#[derive(Debug, Error)]
pub enum WqmError {
    #[error("[WQM-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[WQM-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[WQM-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[WQM-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[WQM-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[WQM-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl WqmError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "WQM-1001",
            Self::MissingConfig { .. } => "WQM-1002",
            Self::ConfigParse { .. } => "WQM-1003",
            Self::Serialization { .. } => "WQM-2101",
            Self::Io { .. } => "WQM-3002",
            Self::Runtime { .. } => "WQM-3900",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for WqmError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for WqmError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
