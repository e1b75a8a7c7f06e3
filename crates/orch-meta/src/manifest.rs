//! Workflow manifest (`manifest.json`)
//!
//! Written once when a workflow completes. The caller supplies the object; the
//! store stamps `generatedAt` at write time.

use crate::error::MetaResult;
use crate::layout::Resource;
use crate::store::MetadataStore;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Field stamped onto every saved manifest
pub const GENERATED_AT_FIELD: &str = "generatedAt";

impl MetadataStore {
    /// Stamp `generatedAt` onto `manifest` and overwrite `manifest.json`
    ///
    /// Any caller-supplied `generatedAt` is replaced.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written
    pub fn save_manifest(&self, mut manifest: Map<String, Value>) -> MetaResult<PathBuf> {
        manifest.insert(
            GENERATED_AT_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let lock = self.acquire(&Resource::Manifest);
        let _guard = lock.lock();
        self.write_json_unlocked(&Resource::Manifest, &manifest)
    }

    /// Load `manifest.json`; `None` if it does not exist
    ///
    /// # Errors
    /// Returns an IO error, or a JSON error if the file is not a JSON object
    pub fn load_manifest(&self) -> MetaResult<Option<Map<String, Value>>> {
        let lock = self.acquire(&Resource::Manifest);
        let _guard = lock.lock();
        self.read_json_unlocked(&Resource::Manifest)
    }
}
