//! Node metadata
//!
//! Describes one DAG node's execution record. Node spec documents may carry it
//! as YAML frontmatter ahead of the markdown body.

use crate::validate::extract_frontmatter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Currently executing
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl NodeStatus {
    /// Check if the node will not change status again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase name used on disk
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one DAG node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Node identifier
    pub node_id: String,
    /// Human-readable name
    pub node_name: String,
    /// Layer index in the DAG
    pub layer: u32,
    /// Ids of nodes this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Current status
    #[serde(default)]
    pub status: NodeStatus,
    /// ISO-8601 start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// ISO-8601 completion time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Wall-clock duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Where the node wrote its output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeMetadata {
    /// Create pending metadata for a node
    #[must_use]
    pub fn new(node_id: impl Into<String>, node_name: impl Into<String>, layer: u32) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            layer,
            dependencies: Vec::new(),
            status: NodeStatus::Pending,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            output_path: None,
            error: None,
        }
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Render `body` prefixed with this metadata as YAML frontmatter
    ///
    /// # Errors
    /// Returns the YAML error if serialization fails
    pub fn to_document(&self, body: &str) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{yaml}---\n{body}"))
    }

    /// Read metadata from a document's frontmatter
    ///
    /// `None` when the document has no frontmatter or it does not describe a node.
    #[must_use]
    pub fn from_document(text: &str) -> Option<Self> {
        let (value, _) = extract_frontmatter(text)?;
        serde_yaml::from_value(value).ok()
    }
}
