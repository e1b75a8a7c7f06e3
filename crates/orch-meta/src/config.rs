//! Store configuration
//!
//! Built in code with the `with_*` methods or read from a TOML file:
//!
//! ```toml
//! root = "_meta"
//! log_retention_days = 14
//! atomic_writes = true
//! ```

use crate::error::{MetaResult, MetaStoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default root directory name
pub const DEFAULT_ROOT: &str = "_meta";

/// Default age in days after which logs are purged
pub const DEFAULT_LOG_RETENTION_DAYS: u64 = 30;

/// Metadata store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the store
    pub root: PathBuf,
    /// Log files older than this many days are removed by cleanup
    pub log_retention_days: u64,
    /// Write whole-file resources through a temp file and rename
    pub atomic_writes: bool,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With root directory
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// With log retention
    #[inline]
    #[must_use]
    pub fn with_log_retention_days(mut self, days: u64) -> Self {
        self.log_retention_days = days;
        self
    }

    /// With atomic writes enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`MetaStoreError::Config`] if the text is not valid TOML for this schema
    pub fn from_toml_str(text: &str) -> MetaResult<Self> {
        toml::from_str(text).map_err(|e| MetaStoreError::Config(e.to_string()))
    }

    /// Read configuration from a TOML file
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be read, or a config error if it
    /// does not parse
    pub fn from_toml_file(path: impl AsRef<Path>) -> MetaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MetaStoreError::io(path, e))?;
        Self::from_toml_str(&text)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
            atomic_writes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = StoreConfig::new();
        assert_eq!(config.root, PathBuf::from("_meta"));
        assert_eq!(config.log_retention_days, 30);
        assert!(config.atomic_writes);
    }

    #[test]
    fn config_builder() {
        let config = StoreConfig::new()
            .with_root("/tmp/run-1")
            .with_log_retention_days(7)
            .with_atomic_writes(false);

        assert_eq!(config.root, PathBuf::from("/tmp/run-1"));
        assert_eq!(config.log_retention_days, 7);
        assert!(!config.atomic_writes);
    }

    #[test]
    fn config_from_partial_toml() {
        let config = StoreConfig::from_toml_str("log_retention_days = 3\n").unwrap();
        assert_eq!(config.log_retention_days, 3);
        assert_eq!(config.root, PathBuf::from("_meta"));
        assert!(config.atomic_writes);
    }

    #[test]
    fn config_rejects_bad_types() {
        let result = StoreConfig::from_toml_str("atomic_writes = \"yes\"\n");
        assert!(matches!(result, Err(MetaStoreError::Config(_))));
    }

    #[test]
    fn config_from_missing_file_is_io() {
        let result = StoreConfig::from_toml_file("/definitely/not/here.toml");
        assert!(result.unwrap_err().is_io());
    }
}
