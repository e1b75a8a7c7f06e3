//! Per-node summary cache
//!
//! A summary holds one node's output so downstream nodes can be primed with it.
//! Its lifecycle is independent of the workflow state.

use crate::error::{MetaResult, MetaStoreError};
use crate::layout::{Resource, CACHE_DIR, SUMMARY_PREFIX};
use crate::store::{read_optional, MetadataStore};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;

impl MetadataStore {
    /// Save `cache/summary-<id>.md`
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn save_summary(&self, node_id: &str, content: &str) -> MetaResult<PathBuf> {
        self.save_text(&Resource::summary(node_id)?, content)
    }

    /// Load `cache/summary-<id>.md`
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn load_summary(&self, node_id: &str) -> MetaResult<Option<String>> {
        self.load_text(&Resource::summary(node_id)?)
    }

    /// Every cached summary keyed by node id
    ///
    /// Entries follow directory-scan order, which is platform dependent.
    ///
    /// # Errors
    /// Returns an IO error if the cache directory or a summary cannot be read
    pub fn list_summaries(&self) -> MetaResult<IndexMap<String, String>> {
        let dir = self.root().join(CACHE_DIR);
        let mut summaries = IndexMap::new();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
            Err(e) => return Err(MetaStoreError::io(&dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| MetaStoreError::io(&dir, e))?;
            let file_name = entry.file_name();
            let Some(node_id) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(SUMMARY_PREFIX))
                .and_then(|rest| rest.strip_suffix(".md"))
                .filter(|id| !id.is_empty())
            else {
                continue;
            };

            // Removed between the scan and the read
            if let Some(content) = read_optional(&entry.path())? {
                summaries.insert(node_id.to_string(), content);
            }
        }

        Ok(summaries)
    }
}
