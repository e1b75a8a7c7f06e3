//! Resource keys and on-disk layout
//!
//! ```text
//! <root>/
//!   00-overview.md
//!   01-dag.md
//!   02-nodes/node-<id>.md
//!   logs/<name>.log
//!   cache/summary-<id>.md
//!   state.json
//!   manifest.json
//! ```
//!
//! Every [`Resource`] maps to one path. Identifiers are checked by
//! [`validate_id`] so two resources never share a file and none leaves the
//! root. Locks are keyed by the [`Resource`] value itself; [`Resource::key`] is
//! the human-readable name used in logs.

use crate::error::{MetaResult, MetaStoreError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Overview document file name
pub const OVERVIEW_FILE: &str = "00-overview.md";
/// DAG document file name
pub const DAG_FILE: &str = "01-dag.md";
/// Node spec directory
pub const NODES_DIR: &str = "02-nodes";
/// Log directory
pub const LOGS_DIR: &str = "logs";
/// Summary cache directory
pub const CACHE_DIR: &str = "cache";
/// State file name
pub const STATE_FILE: &str = "state.json";
/// Manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Name of the main orchestrator log
pub const ORCHESTRATOR_LOG: &str = "orchestrator";

/// Prefix of node spec file stems and node log names
pub const NODE_PREFIX: &str = "node-";
/// Prefix of summary file stems
pub const SUMMARY_PREFIX: &str = "summary-";
/// Extension of log files
pub const LOG_EXTENSION: &str = "log";

/// Subdirectories created on open, relative to the root
pub const SUBDIRECTORIES: [&str; 3] = [LOGS_DIR, CACHE_DIR, NODES_DIR];

/// One independently locked, independently persisted unit of data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `00-overview.md`
    Overview,
    /// `01-dag.md`
    Dag,
    /// `02-nodes/node-<id>.md`
    NodeSpec(String),
    /// `cache/summary-<id>.md`
    Summary(String),
    /// `logs/<name>.log`
    Log(String),
    /// `state.json`
    State,
    /// `manifest.json`
    Manifest,
}

impl Resource {
    /// Node spec resource for a validated node id
    ///
    /// # Errors
    /// Returns [`MetaStoreError::InvalidKey`] if `node_id` is not a safe identifier
    pub fn node_spec(node_id: &str) -> MetaResult<Self> {
        validate_id(node_id)?;
        Ok(Self::NodeSpec(node_id.to_string()))
    }

    /// Summary resource for a validated node id
    ///
    /// # Errors
    /// Returns [`MetaStoreError::InvalidKey`] if `node_id` is not a safe identifier
    pub fn summary(node_id: &str) -> MetaResult<Self> {
        validate_id(node_id)?;
        Ok(Self::Summary(node_id.to_string()))
    }

    /// Log resource; a trailing `.log` on `name` is ignored
    ///
    /// # Errors
    /// Returns [`MetaStoreError::InvalidKey`] if `name` is not a safe identifier
    pub fn log(name: &str) -> MetaResult<Self> {
        let stem = name
            .strip_suffix(".log")
            .filter(|s| !s.is_empty())
            .unwrap_or(name);
        validate_id(stem)?;
        Ok(Self::Log(stem.to_string()))
    }

    /// Log resource of a single node (`node-<id>`)
    ///
    /// # Errors
    /// Returns [`MetaStoreError::InvalidKey`] if `node_id` is not a safe identifier
    pub fn node_log(node_id: &str) -> MetaResult<Self> {
        validate_id(node_id)?;
        Ok(Self::Log(format!("{NODE_PREFIX}{node_id}")))
    }

    /// Resource name (`node-3`, `orchestrator.log`, `state.json`, ...)
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Overview => "overview".to_string(),
            Self::Dag => "dag".to_string(),
            Self::NodeSpec(id) => format!("{NODE_PREFIX}{id}"),
            Self::Summary(id) => format!("{SUMMARY_PREFIX}{id}"),
            Self::Log(name) => format!("{name}.{LOG_EXTENSION}"),
            Self::State => STATE_FILE.to_string(),
            Self::Manifest => MANIFEST_FILE.to_string(),
        }
    }

    /// Path of this resource under `root`
    #[must_use]
    pub fn path(&self, root: &Path) -> PathBuf {
        match self {
            Self::Overview => root.join(OVERVIEW_FILE),
            Self::Dag => root.join(DAG_FILE),
            Self::NodeSpec(id) => root.join(NODES_DIR).join(format!("{NODE_PREFIX}{id}.md")),
            Self::Summary(id) => root.join(CACHE_DIR).join(format!("{SUMMARY_PREFIX}{id}.md")),
            Self::Log(name) => root.join(LOGS_DIR).join(format!("{name}.{LOG_EXTENSION}")),
            Self::State => root.join(STATE_FILE),
            Self::Manifest => root.join(MANIFEST_FILE),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Check that an identifier maps to exactly one file inside its directory
///
/// # Errors
/// Returns [`MetaStoreError::InvalidKey`] for empty ids, `.`/`..`, and ids
/// containing path separators or NUL
pub fn validate_id(id: &str) -> MetaResult<()> {
    if id.is_empty() {
        return Err(MetaStoreError::invalid_key(id, "empty identifier"));
    }
    if id == "." || id == ".." {
        return Err(MetaStoreError::invalid_key(id, "path traversal"));
    }
    if id.contains(['/', '\\', '\0']) {
        return Err(MetaStoreError::invalid_key(id, "contains a path separator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fixed_paths() {
        let root = Path::new("/m");
        assert_eq!(Resource::Overview.path(root), PathBuf::from("/m/00-overview.md"));
        assert_eq!(Resource::Dag.path(root), PathBuf::from("/m/01-dag.md"));
        assert_eq!(Resource::State.path(root), PathBuf::from("/m/state.json"));
        assert_eq!(Resource::Manifest.path(root), PathBuf::from("/m/manifest.json"));
    }

    #[test]
    fn keyed_paths() {
        let root = Path::new("/m");
        assert_eq!(
            Resource::node_spec("3").unwrap().path(root),
            PathBuf::from("/m/02-nodes/node-3.md")
        );
        assert_eq!(
            Resource::summary("3").unwrap().path(root),
            PathBuf::from("/m/cache/summary-3.md")
        );
        assert_eq!(
            Resource::node_log("3").unwrap().path(root),
            PathBuf::from("/m/logs/node-3.log")
        );
        assert_eq!(
            Resource::log(ORCHESTRATOR_LOG).unwrap().path(root),
            PathBuf::from("/m/logs/orchestrator.log")
        );
    }

    #[test]
    fn keys_match_resource_names() {
        assert_eq!(Resource::node_spec("3").unwrap().key(), "node-3");
        assert_eq!(Resource::summary("3").unwrap().key(), "summary-3");
        assert_eq!(Resource::node_log("3").unwrap().key(), "node-3.log");
        assert_eq!(Resource::State.key(), "state.json");
    }

    #[test]
    fn log_name_suffix_is_normalized() {
        assert_eq!(
            Resource::log("orchestrator.log").unwrap(),
            Resource::log("orchestrator").unwrap()
        );
    }

    #[test]
    fn rejects_unsafe_ids() {
        for id in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(Resource::node_spec(id).is_err(), "accepted {id:?}");
        }
        assert!(Resource::log("../x.log").is_err());
    }

    fn all_resources(a: &str, b: &str) -> Vec<Resource> {
        vec![
            Resource::Overview,
            Resource::Dag,
            Resource::State,
            Resource::Manifest,
            Resource::NodeSpec(a.to_string()),
            Resource::NodeSpec(b.to_string()),
            Resource::Summary(a.to_string()),
            Resource::Summary(b.to_string()),
            Resource::Log(a.to_string()),
            Resource::Log(b.to_string()),
        ]
    }

    proptest! {
        #[test]
        fn distinct_resources_never_share_path(
            a in "[a-z0-9._-]{1,12}",
            b in "[a-z0-9._-]{1,12}",
        ) {
            prop_assume!(a != b && a != "." && a != ".." && b != "." && b != "..");
            let root = Path::new("/m");
            let resources = all_resources(&a, &b);
            for (i, left) in resources.iter().enumerate() {
                for right in &resources[i + 1..] {
                    prop_assert_ne!(left.path(root), right.path(root));
                }
            }
        }
    }
}
