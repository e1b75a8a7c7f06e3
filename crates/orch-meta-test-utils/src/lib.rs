//! Testing utilities for the orch-meta workspace
//!
//! Shared fixtures for stores rooted in temporary directories.

#![allow(missing_docs)]

use orch_meta::{MetadataStore, StoreConfig, WorkflowState};
use serde_json::{Map, Value};
use tempfile::TempDir;

/// A store whose root lives inside a temporary directory
///
/// The directory is removed when the fixture is dropped.
pub struct TempStore {
    pub dir: TempDir,
    pub store: MetadataStore,
}

impl std::ops::Deref for TempStore {
    type Target = MetadataStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

pub fn temp_store() -> TempStore {
    temp_store_with(StoreConfig::new())
}

/// Open a store from `config`, with its root replaced by a fresh temp dir
pub fn temp_store_with(config: StoreConfig) -> TempStore {
    let dir = TempDir::new().unwrap();
    let store = MetadataStore::with_config(config.with_root(dir.path().join("_meta"))).unwrap();
    TempStore { dir, store }
}

pub fn sample_state() -> WorkflowState {
    let mut state = WorkflowState::new();
    state.current_state = "executing".to_string();
    state.current_layer = 1;
    state.completed_nodes = vec!["1".to_string()];
    state.resumable = true;
    state
}

/// Unwrap a `json!` object literal into a map
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Write raw text into the store's orchestrator log, bypassing the store
pub fn write_raw_orchestrator_log(fixture: &TempStore, text: &str) {
    let path = fixture.store.root().join("logs").join("orchestrator.log");
    std::fs::write(path, text).unwrap();
}
