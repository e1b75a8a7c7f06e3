//! Error types for the metadata store
//!
//! Missing resources are never errors: loads return `None` (or the default
//! state). What remains here is:
//! - Filesystem failures (propagated, never retried)
//! - JSON documents that exist but cannot be decoded
//! - Frontmatter that cannot be rendered
//! - Resource identifiers that would break the path layout
//! - Configuration problems

use std::path::PathBuf;

/// Main metadata store error type
#[derive(Debug, thiserror::Error)]
pub enum MetaStoreError {
    /// IO error while touching a resource
    #[error("io error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A JSON resource exists but could not be encoded or decoded
    #[error("json error at {path}: {source}")]
    Json {
        /// Path of the JSON resource
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Identifier cannot be mapped onto the layout
    #[error("invalid resource key '{key}': {reason}")]
    InvalidKey {
        /// Offending identifier
        key: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Frontmatter could not be rendered
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A merged state no longer matches the state schema
    #[error("invalid state: {0}")]
    InvalidState(#[source] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl MetaStoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create JSON error for path
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    /// Check if the error came from the filesystem
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Result type alias for store operations
pub type MetaResult<T> = Result<T, MetaStoreError>;
