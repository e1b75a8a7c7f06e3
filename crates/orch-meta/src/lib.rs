//! Orchestration metadata store
//!
//! A local, file-backed store for the state, specs, logs and cached node
//! outputs of an orchestration workflow.
//!
//! # Concurrency
//!
//! Every resource (one document, one log, the state, the manifest) has its own
//! lock, created on first use and kept for the life of the store. Operations on
//! the same resource are serialized; different resources never contend. Locks
//! are in-process only: two processes sharing a root are not excluded.
//!
//! # Layout
//!
//! ```text
//! <root>/00-overview.md         overview document
//! <root>/01-dag.md              DAG description
//! <root>/02-nodes/node-<id>.md  per-node specs
//! <root>/logs/<name>.log        append-only JSON lines
//! <root>/cache/summary-<id>.md  per-node summaries
//! <root>/state.json             workflow state
//! <root>/manifest.json          completion manifest
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use orch_meta::MetadataStore;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), orch_meta::MetaStoreError> {
//! let store = MetadataStore::open("_meta")?;
//!
//! store.save_node_spec("1", "# Parse input\n")?;
//! store.append_log(&json!({"event": "node_started", "node": "1"}))?;
//! store.mark_node_completed("1")?;
//!
//! let state = store.load_state()?;
//! assert!(state.is_completed("1"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod error;
pub mod layout;
pub mod lock;
pub mod store;

// Resource accessors
pub mod document;
pub mod housekeeping;
pub mod log;
pub mod manifest;
pub mod node;
pub mod state;
pub mod summary;
pub mod validate;

// Re-exports for convenience
pub use config::StoreConfig;
pub use error::{MetaResult, MetaStoreError};
pub use housekeeping::StoreStats;
pub use layout::Resource;
pub use lock::{LockRegistry, ResourceLock};
pub use node::{NodeMetadata, NodeStatus};
pub use state::WorkflowState;
pub use store::MetadataStore;
pub use validate::{extract_frontmatter, validate_frontmatter, validate_markdown_balance};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the metadata store
    pub use crate::{
        MetaResult, MetaStoreError, MetadataStore, NodeMetadata, NodeStatus, StoreConfig,
        StoreStats, WorkflowState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
