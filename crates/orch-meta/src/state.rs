//! Workflow state (`state.json`)
//!
//! # Consistency
//!
//! [`MetadataStore::update_state`] loads, merges and saves with three separate
//! lock acquisitions. Two concurrent updaters can interleave and the later
//! save wins, dropping the earlier update. Use [`MetadataStore::modify_state`]
//! when an update must not be lost; it holds the state lock for the whole
//! read-modify-write cycle.

use crate::error::{MetaResult, MetaStoreError};
use crate::layout::Resource;
use crate::store::MetadataStore;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Phase of a freshly created session
pub const DEFAULT_PHASE: &str = "idle";

/// Progress of one orchestration session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Session identifier
    pub session_id: String,
    /// When the session started, as ISO-8601 text
    ///
    /// Kept verbatim so timestamps written by other tools, with any offset or
    /// none, survive a load and save unchanged.
    pub start_time: String,
    /// Current phase name
    pub current_state: String,
    /// Index of the DAG layer being executed
    pub current_layer: u32,
    /// Ids of nodes that finished successfully
    #[serde(default)]
    pub completed_nodes: Vec<String>,
    /// Ids of nodes that failed
    #[serde(default)]
    pub failed_nodes: Vec<String>,
    /// Whether the session can be resumed
    #[serde(default)]
    pub resumable: bool,
    /// Last error message, if any
    #[serde(default)]
    pub last_error: Option<String>,
    /// Top-level keys this type does not know about, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowState {
    /// Fresh state: new session id, started now, idle at layer 0
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            start_time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            current_state: DEFAULT_PHASE.to_string(),
            current_layer: 0,
            completed_nodes: Vec::new(),
            failed_nodes: Vec::new(),
            resumable: false,
            last_error: None,
            extra: Map::new(),
        }
    }

    /// Copy of this state with `updates` replacing top-level keys
    ///
    /// Nested objects are replaced, not merged.
    ///
    /// # Errors
    /// Returns [`MetaStoreError::InvalidState`] if a replaced key no longer
    /// has the type the state requires
    pub fn merged(&self, updates: Map<String, Value>) -> MetaResult<Self> {
        let mut value = serde_json::to_value(self).map_err(MetaStoreError::InvalidState)?;
        if let Value::Object(map) = &mut value {
            map.extend(updates);
        }
        serde_json::from_value(value).map_err(MetaStoreError::InvalidState)
    }

    /// Record `node_id` as completed
    pub fn complete_node(&mut self, node_id: &str) {
        self.failed_nodes.retain(|id| id != node_id);
        if !self.completed_nodes.iter().any(|id| id == node_id) {
            self.completed_nodes.push(node_id.to_string());
        }
    }

    /// Record `node_id` as failed with `error`
    pub fn fail_node(&mut self, node_id: &str, error: impl Into<String>) {
        self.completed_nodes.retain(|id| id != node_id);
        if !self.failed_nodes.iter().any(|id| id == node_id) {
            self.failed_nodes.push(node_id.to_string());
        }
        self.last_error = Some(error.into());
    }

    /// Check if `node_id` completed
    #[must_use]
    pub fn is_completed(&self, node_id: &str) -> bool {
        self.completed_nodes.iter().any(|id| id == node_id)
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore {
    /// Load `state.json`, or a fresh unsaved state if it does not exist
    ///
    /// # Errors
    /// Returns an IO error, or a JSON error if the file is not a valid state
    pub fn load_state(&self) -> MetaResult<WorkflowState> {
        let lock = self.acquire(&Resource::State);
        let _guard = lock.lock();
        self.read_state_unlocked()
    }

    /// Overwrite `state.json`
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written
    pub fn save_state(&self, state: &WorkflowState) -> MetaResult<PathBuf> {
        let lock = self.acquire(&Resource::State);
        let _guard = lock.lock();
        self.write_json_unlocked(&Resource::State, state)
    }

    /// Load, shallow-merge `updates` and save
    ///
    /// Not atomic: see the module docs.
    ///
    /// # Errors
    /// Returns an IO or JSON error from load/save, or
    /// [`MetaStoreError::InvalidState`] if the merge breaks the schema
    pub fn update_state(&self, updates: Map<String, Value>) -> MetaResult<WorkflowState> {
        let merged = self.load_state()?.merged(updates)?;
        self.save_state(&merged)?;
        Ok(merged)
    }

    /// Apply `f` to the current state and save it, holding the state lock
    /// throughout
    ///
    /// The state lock is not reentrant: `f` must not call back into the
    /// store's state operations (`load_state`, `save_state`, `update_state`,
    /// `modify_state` or the node marks), or the calling thread deadlocks.
    ///
    /// # Errors
    /// Returns an IO or JSON error from load/save
    pub fn modify_state<F>(&self, f: F) -> MetaResult<WorkflowState>
    where
        F: FnOnce(&mut WorkflowState),
    {
        let lock = self.acquire(&Resource::State);
        let _guard = lock.lock();
        let mut state = self.read_state_unlocked()?;
        f(&mut state);
        self.write_json_unlocked(&Resource::State, &state)?;
        Ok(state)
    }

    /// Record a completed node in the saved state
    ///
    /// # Errors
    /// Returns an IO or JSON error from load/save
    pub fn mark_node_completed(&self, node_id: &str) -> MetaResult<WorkflowState> {
        self.modify_state(|state| state.complete_node(node_id))
    }

    /// Record a failed node and its error in the saved state
    ///
    /// # Errors
    /// Returns an IO or JSON error from load/save
    pub fn mark_node_failed(&self, node_id: &str, error: &str) -> MetaResult<WorkflowState> {
        self.modify_state(|state| state.fail_node(node_id, error))
    }

    fn read_state_unlocked(&self) -> MetaResult<WorkflowState> {
        Ok(self
            .read_json_unlocked(&Resource::State)?
            .unwrap_or_else(|| {
                tracing::debug!("No state file, using a fresh session");
                WorkflowState::new()
            }))
    }
}
