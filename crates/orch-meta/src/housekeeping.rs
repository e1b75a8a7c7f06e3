//! Housekeeping: age-based log purge and store statistics

use crate::error::{MetaResult, MetaStoreError};
use crate::layout::{validate_id, Resource, CACHE_DIR, LOGS_DIR, LOG_EXTENSION, SUMMARY_PREFIX};
use crate::store::MetadataStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 86_400;

/// Snapshot of the store's contents
///
/// Computed by walking the directory; may be stale as soon as it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Bytes of every regular file under the root
    pub total_bytes: u64,
    /// Number of node spec documents
    pub node_spec_count: usize,
    /// Parseable records in the orchestrator log
    pub log_entry_count: usize,
    /// Number of cached summaries
    pub summary_count: usize,
    /// Whether `state.json` exists
    pub has_state: bool,
    /// Whether `manifest.json` exists
    pub has_manifest: bool,
}

impl MetadataStore {
    /// Delete `logs/*.log` files last modified at least `max_age_days` ago
    ///
    /// `0` removes every log file. Each file is removed while holding its log
    /// lock, so an in-process append is never cut short. Other resources are
    /// never touched.
    ///
    /// # Errors
    /// Returns an IO error if the log directory cannot be listed or a file
    /// cannot be removed
    pub fn cleanup_old_logs(&self, max_age_days: u64) -> MetaResult<usize> {
        let dir = self.root().join(LOGS_DIR);
        let max_age = Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY));
        let now = SystemTime::now();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(MetaStoreError::io(&dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| MetaStoreError::io(&dir, e))?;
            let path = entry.path();
            let Some(resource) = log_resource_for(&path) else {
                continue;
            };

            let lock = self.acquire(&resource);
            let _guard = lock.lock();

            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(MetaStoreError::io(&path, e)),
            };
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age < max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(MetaStoreError::io(&path, e)),
            }
        }

        tracing::info!("Removed {} log file(s) older than {} day(s)", removed, max_age_days);
        Ok(removed)
    }

    /// Walk the store and summarize what it holds
    ///
    /// # Errors
    /// Returns an IO error if part of the tree cannot be read
    pub fn stats(&self) -> MetaResult<StoreStats> {
        Ok(StoreStats {
            total_bytes: dir_size(self.root())?,
            node_spec_count: self.list_node_specs()?.len(),
            log_entry_count: self.read_logs(None)?.len(),
            summary_count: self.count_summaries()?,
            has_state: self.path_of(&Resource::State).is_file(),
            has_manifest: self.path_of(&Resource::Manifest).is_file(),
        })
    }

    fn count_summaries(&self) -> MetaResult<usize> {
        let dir = self.root().join(CACHE_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(MetaStoreError::io(&dir, e)),
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| MetaStoreError::io(&dir, e))?;
            let name = entry.file_name();
            let is_summary = name
                .to_str()
                .and_then(|n| n.strip_prefix(SUMMARY_PREFIX))
                .and_then(|rest| rest.strip_suffix(".md"))
                .is_some_and(|id| !id.is_empty());
            if is_summary {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Log resource owning `path`, if it is a well-named `*.log` file
fn log_resource_for(path: &Path) -> Option<Resource> {
    if path.extension()? != LOG_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    validate_id(stem).ok()?;
    Some(Resource::Log(stem.to_string()))
}

/// Total size of regular files below `path`; symlinks are not followed
fn dir_size(path: &Path) -> MetaResult<u64> {
    let mut total = 0;
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(MetaStoreError::io(path, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| MetaStoreError::io(path, e))?;
        let entry_path = entry.path();
        let metadata = match fs::symlink_metadata(&entry_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(MetaStoreError::io(&entry_path, e)),
        };
        if metadata.is_dir() {
            total += dir_size(&entry_path)?;
        } else if metadata.is_file() {
            total += metadata.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, MetadataStore) {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn cleanup_zero_days_removes_all_logs() {
        let (dir, store) = open_temp();
        store.append_log(&json!({"a": 1})).unwrap();
        store.create_node_log("1").unwrap();
        store.create_node_log("2").unwrap();

        assert_eq!(store.cleanup_old_logs(0).unwrap(), 3);
        assert_eq!(fs::read_dir(dir.path().join("logs")).unwrap().count(), 0);
    }

    #[test]
    fn cleanup_huge_age_removes_nothing() {
        let (_dir, store) = open_temp();
        store.append_log(&json!({"a": 1})).unwrap();
        store.create_node_log("1").unwrap();

        assert_eq!(store.cleanup_old_logs(999_999).unwrap(), 0);
        assert_eq!(store.read_logs(None).unwrap().len(), 1);
    }

    #[test]
    fn cleanup_ignores_non_log_resources() {
        let (dir, store) = open_temp();
        store.save_overview("keep").unwrap();
        store.save_summary("1", "keep").unwrap();
        fs::write(dir.path().join("logs").join("notes.txt"), "keep").unwrap();
        store.append_log(&json!({"a": 1})).unwrap();

        assert_eq!(store.cleanup_old_logs(0).unwrap(), 1);
        assert!(store.load_overview().unwrap().is_some());
        assert!(store.load_summary("1").unwrap().is_some());
        assert!(dir.path().join("logs").join("notes.txt").exists());
    }

    fn backdate(path: &Path, days: u64) {
        let when = SystemTime::now() - Duration::from_secs(days * SECONDS_PER_DAY);
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[test]
    fn cleanup_respects_age_cutoff() {
        let (_dir, store) = open_temp();
        let old = store.create_node_log("old").unwrap();
        let fresh = store.create_node_log("fresh").unwrap();
        backdate(&old, 10);

        assert_eq!(store.cleanup_old_logs(30).unwrap(), 0);
        assert!(old.exists() && fresh.exists());

        assert_eq!(store.cleanup_old_logs(5).unwrap(), 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn cleanup_on_empty_store() {
        let (_dir, store) = open_temp();
        assert_eq!(store.cleanup_old_logs(30).unwrap(), 0);
    }

    #[test]
    fn stats_on_empty_store() {
        let (_dir, store) = open_temp();
        assert_eq!(store.stats().unwrap(), StoreStats::default());
    }

    #[test]
    fn stats_counts_everything() {
        let (_dir, store) = open_temp();
        store.save_overview("overview").unwrap();
        store.save_node_spec("1", "one").unwrap();
        store.save_node_spec("2", "two").unwrap();
        store.save_summary("1", "s1").unwrap();
        store.append_log(&json!({"a": 1})).unwrap();
        store.append_log(&json!({"a": 2})).unwrap();
        store.save_state(&crate::state::WorkflowState::new()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.node_spec_count, 2);
        assert_eq!(stats.summary_count, 1);
        assert_eq!(stats.log_entry_count, 2);
        assert!(stats.has_state);
        assert!(!stats.has_manifest);
        assert!(stats.total_bytes > "overviewonetwos1".len() as u64);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let value = serde_json::to_value(StoreStats::default()).unwrap();
        assert!(value.get("totalBytes").is_some());
        assert!(value.get("hasManifest").is_some());
    }

    #[test]
    fn log_resource_mapping() {
        assert_eq!(
            log_resource_for(Path::new("/m/logs/orchestrator.log")),
            Some(Resource::Log("orchestrator".to_string()))
        );
        assert_eq!(
            log_resource_for(Path::new("/m/logs/run.log.log")),
            Some(Resource::Log("run.log".to_string()))
        );
        assert_eq!(log_resource_for(Path::new("/m/logs/notes.txt")), None);
    }
}
