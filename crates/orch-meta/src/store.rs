//! Metadata store core
//!
//! [`MetadataStore`] owns the root directory and the lock registry. Typed
//! accessors for each resource kind live in the sibling modules as further
//! `impl MetadataStore` blocks; this module holds the shared plumbing they use.

use crate::config::StoreConfig;
use crate::error::{MetaResult, MetaStoreError};
use crate::layout::{Resource, SUBDIRECTORIES};
use crate::lock::{LockRegistry, ResourceLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File-backed metadata store with one lock per resource
#[derive(Debug)]
pub struct MetadataStore {
    root: PathBuf,
    config: StoreConfig,
    locks: LockRegistry<Resource>,
}

impl MetadataStore {
    /// Open a store at `root` with default settings
    ///
    /// # Errors
    /// Returns an IO error if the directory layout cannot be created
    pub fn open(root: impl Into<PathBuf>) -> MetaResult<Self> {
        Self::with_config(StoreConfig::new().with_root(root))
    }

    /// Open a store from configuration
    ///
    /// # Errors
    /// Returns an IO error if the directory layout cannot be created
    pub fn with_config(config: StoreConfig) -> MetaResult<Self> {
        let store = Self {
            root: config.root.clone(),
            config,
            locks: LockRegistry::new(),
        };
        store.ensure_layout()?;
        tracing::info!("Metadata store opened at {}", store.root.display());
        Ok(store)
    }

    /// Create the root and its fixed subdirectories if missing
    ///
    /// Idempotent; existing directories are left untouched.
    ///
    /// # Errors
    /// Returns an IO error if a directory cannot be created
    pub fn ensure_layout(&self) -> MetaResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| MetaStoreError::io(&self.root, e))?;
        for subdir in SUBDIRECTORIES {
            let dir = self.root.join(subdir);
            fs::create_dir_all(&dir).map_err(|e| MetaStoreError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Lock guarding `resource`
    ///
    /// Repeated calls for the same resource return the same instance.
    #[inline]
    #[must_use]
    pub fn acquire(&self, resource: &Resource) -> ResourceLock {
        self.locks.acquire(resource)
    }

    /// Number of resources touched so far
    #[inline]
    #[must_use]
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Path of `resource` under this store's root
    #[inline]
    #[must_use]
    pub fn path_of(&self, resource: &Resource) -> PathBuf {
        resource.path(&self.root)
    }

    /// Overwrite a text resource while holding its lock
    pub(crate) fn save_text(&self, resource: &Resource, content: &str) -> MetaResult<PathBuf> {
        let path = self.path_of(resource);
        let lock = self.acquire(resource);
        let _guard = lock.lock();
        self.write_file(&path, content.as_bytes())?;
        tracing::debug!("Saved {} ({} bytes)", resource, content.len());
        Ok(path)
    }

    /// Read a text resource without locking; `None` if it does not exist
    pub(crate) fn load_text(&self, resource: &Resource) -> MetaResult<Option<String>> {
        read_optional(&self.path_of(resource))
    }

    /// Serialize `value` as pretty JSON and overwrite `resource`
    ///
    /// The caller must hold the resource lock.
    pub(crate) fn write_json_unlocked<T: Serialize>(
        &self,
        resource: &Resource,
        value: &T,
    ) -> MetaResult<PathBuf> {
        let path = self.path_of(resource);
        let mut body =
            serde_json::to_string_pretty(value).map_err(|e| MetaStoreError::json(&path, e))?;
        body.push('\n');
        self.write_file(&path, body.as_bytes())?;
        tracing::debug!("Saved {}", resource);
        Ok(path)
    }

    /// Decode a JSON resource; `None` if it does not exist
    ///
    /// The caller must hold the resource lock.
    pub(crate) fn read_json_unlocked<T: DeserializeOwned>(
        &self,
        resource: &Resource,
    ) -> MetaResult<Option<T>> {
        let path = self.path_of(resource);
        match read_optional(&path)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| MetaStoreError::json(&path, e)),
            None => Ok(None),
        }
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> MetaResult<()> {
        if self.config.atomic_writes {
            atomic_write(path, bytes)
        } else {
            fs::write(path, bytes).map_err(|e| MetaStoreError::io(path, e))
        }
    }
}

/// Read a file to string, mapping `NotFound` to `None`
pub(crate) fn read_optional(path: &Path) -> MetaResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MetaStoreError::io(path, e)),
    }
}

/// Write through `<name>.tmp` and rename over the target
fn atomic_write(path: &Path, bytes: &[u8]) -> MetaResult<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path).map_err(|e| MetaStoreError::io(&tmp_path, e))?;
    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        discard_temp(&tmp_path);
        return Err(MetaStoreError::io(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        discard_temp(&tmp_path);
        MetaStoreError::io(path, e)
    })
}

/// Best-effort removal of an abandoned temp file
fn discard_temp(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path) {
        tracing::debug!("Could not remove {}: {}", tmp_path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, MetadataStore) {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open(dir.path().join("_meta")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_layout() {
        let (_dir, store) = open_temp();
        for subdir in SUBDIRECTORIES {
            assert!(store.root().join(subdir).is_dir(), "missing {subdir}");
        }
    }

    #[test]
    fn ensure_layout_is_idempotent() {
        let (_dir, store) = open_temp();
        store.save_text(&Resource::Overview, "keep me").unwrap();

        store.ensure_layout().unwrap();
        let again = MetadataStore::open(store.root().to_path_buf()).unwrap();

        assert_eq!(
            again.load_text(&Resource::Overview).unwrap().as_deref(),
            Some("keep me")
        );
    }

    #[test]
    fn acquire_is_stable_per_resource() {
        let (_dir, store) = open_temp();
        let a = store.acquire(&Resource::State);
        let b = store.acquire(&Resource::State);
        let c = store.acquire(&Resource::Manifest);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(store.lock_count(), 2);
    }

    #[test]
    fn node_spec_and_node_log_locks_are_distinct() {
        let (_dir, store) = open_temp();
        let spec = store.acquire(&Resource::NodeSpec("1.log".to_string()));
        let log = store.acquire(&Resource::Log("node-1".to_string()));
        assert!(!Arc::ptr_eq(&spec, &log));
    }

    #[test]
    fn missing_text_is_none() {
        let (_dir, store) = open_temp();
        assert!(store.load_text(&Resource::Dag).unwrap().is_none());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let (_dir, store) = open_temp();
        let path = store.save_text(&Resource::Dag, "graph").unwrap();

        assert!(path.exists());
        assert!(!store.root().join("01-dag.md.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let (_dir, store) = open_temp();
        // A directory in the target's place makes the rename fail
        let target = store.path_of(&Resource::Overview);
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupant"), "x").unwrap();

        let result = store.save_text(&Resource::Overview, "content");

        assert!(result.unwrap_err().is_io());
        assert!(!store.root().join("00-overview.md.tmp").exists());
    }

    #[test]
    fn plain_write_mode_overwrites() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new()
            .with_root(dir.path())
            .with_atomic_writes(false);
        let store = MetadataStore::with_config(config).unwrap();

        store.save_text(&Resource::Overview, "first, longer text").unwrap();
        store.save_text(&Resource::Overview, "second").unwrap();

        assert_eq!(
            store.load_text(&Resource::Overview).unwrap().as_deref(),
            Some("second")
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        let (_dir, store) = open_temp();
        fs::write(store.path_of(&Resource::Manifest), "{not json").unwrap();

        let result: MetaResult<Option<serde_json::Value>> =
            store.read_json_unlocked(&Resource::Manifest);
        assert!(matches!(result, Err(MetaStoreError::Json { .. })));
    }

    #[test]
    fn open_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "x").unwrap();

        let result = MetadataStore::open(&file);
        assert!(result.unwrap_err().is_io());
    }
}
