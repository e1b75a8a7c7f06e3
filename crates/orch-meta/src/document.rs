//! Document resources: overview, DAG description and per-node specs
//!
//! Saves overwrite the whole file under the document's lock. Loads do not lock.
//! With atomic writes on, a reader sees either the old or the new content.
//! With them off, a reader may see a write in progress.

use crate::error::{MetaResult, MetaStoreError};
use crate::layout::{Resource, NODES_DIR, NODE_PREFIX};
use crate::node::NodeMetadata;
use crate::store::MetadataStore;
use std::fs;
use std::path::PathBuf;

impl MetadataStore {
    /// Save `00-overview.md`
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written
    pub fn save_overview(&self, content: &str) -> MetaResult<PathBuf> {
        self.save_text(&Resource::Overview, content)
    }

    /// Load `00-overview.md`
    ///
    /// # Errors
    /// Returns an IO error if the file exists but cannot be read
    pub fn load_overview(&self) -> MetaResult<Option<String>> {
        self.load_text(&Resource::Overview)
    }

    /// Save `01-dag.md`
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written
    pub fn save_dag(&self, content: &str) -> MetaResult<PathBuf> {
        self.save_text(&Resource::Dag, content)
    }

    /// Load `01-dag.md`
    ///
    /// # Errors
    /// Returns an IO error if the file exists but cannot be read
    pub fn load_dag(&self) -> MetaResult<Option<String>> {
        self.load_text(&Resource::Dag)
    }

    /// Save `02-nodes/node-<id>.md`
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn save_node_spec(&self, node_id: &str, content: &str) -> MetaResult<PathBuf> {
        self.save_text(&Resource::node_spec(node_id)?, content)
    }

    /// Load `02-nodes/node-<id>.md`
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn load_node_spec(&self, node_id: &str) -> MetaResult<Option<String>> {
        self.load_text(&Resource::node_spec(node_id)?)
    }

    /// Save a node spec with `meta` rendered as YAML frontmatter
    ///
    /// # Errors
    /// Returns a YAML error if the metadata cannot be rendered, an invalid
    /// key error for unsafe ids, or an IO error
    pub fn save_node_spec_with_metadata(
        &self,
        meta: &NodeMetadata,
        body: &str,
    ) -> MetaResult<PathBuf> {
        let document = meta.to_document(body)?;
        self.save_node_spec(&meta.node_id, &document)
    }

    /// Read node metadata from a node spec's frontmatter
    ///
    /// `None` if the node spec is missing or carries no node frontmatter.
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn load_node_metadata(&self, node_id: &str) -> MetaResult<Option<NodeMetadata>> {
        Ok(self
            .load_node_spec(node_id)?
            .and_then(|text| NodeMetadata::from_document(&text)))
    }

    /// Stems (`node-<id>`) of every node spec on disk, sorted
    ///
    /// # Errors
    /// Returns an IO error if the node directory cannot be listed
    pub fn list_node_specs(&self) -> MetaResult<Vec<String>> {
        let dir = self.root().join(NODES_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MetaStoreError::io(&dir, e)),
        };

        let mut stems = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MetaStoreError::io(&dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".md") {
                if stem.starts_with(NODE_PREFIX) && stem.len() > NODE_PREFIX.len() {
                    stems.push(stem.to_string());
                }
            }
        }
        stems.sort();
        Ok(stems)
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{NodeMetadata, NodeStatus};
    use crate::store::MetadataStore;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, MetadataStore) {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn overview_roundtrip() {
        let (dir, store) = open_temp();
        let path = store.save_overview("# Overview\n").unwrap();

        assert_eq!(path, dir.path().join("00-overview.md"));
        assert_eq!(store.load_overview().unwrap().as_deref(), Some("# Overview\n"));
    }

    #[test]
    fn dag_overwrites_in_full() {
        let (_dir, store) = open_temp();
        store.save_dag("a -> b -> c -> d").unwrap();
        store.save_dag("a -> b").unwrap();

        assert_eq!(store.load_dag().unwrap().as_deref(), Some("a -> b"));
    }

    #[test]
    fn missing_documents_are_none() {
        let (_dir, store) = open_temp();
        assert!(store.load_overview().unwrap().is_none());
        assert!(store.load_dag().unwrap().is_none());
        assert!(store.load_node_spec("7").unwrap().is_none());
        assert!(store.load_node_metadata("7").unwrap().is_none());
    }

    #[test]
    fn node_spec_path_and_listing() {
        let (dir, store) = open_temp();
        let path = store.save_node_spec("2", "two").unwrap();
        store.save_node_spec("1", "one").unwrap();
        std::fs::write(dir.path().join("02-nodes").join("notes.md"), "ignored").unwrap();

        assert_eq!(path, dir.path().join("02-nodes").join("node-2.md"));
        assert_eq!(store.list_node_specs().unwrap(), vec!["node-1", "node-2"]);
        assert_eq!(store.load_node_spec("1").unwrap().as_deref(), Some("one"));
    }

    #[test]
    fn node_spec_rejects_traversal() {
        let (_dir, store) = open_temp();
        assert!(store.save_node_spec("../escape", "x").is_err());
        assert!(store.load_node_spec("..").is_err());
    }

    #[test]
    fn node_metadata_through_frontmatter() {
        let (_dir, store) = open_temp();
        let meta = NodeMetadata::new("4", "Write tests", 2)
            .with_dependencies(["3"])
            .with_status(NodeStatus::Completed);

        store.save_node_spec_with_metadata(&meta, "# Tests\n").unwrap();

        let text = store.load_node_spec("4").unwrap().unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.ends_with("# Tests\n"));
        assert_eq!(store.load_node_metadata("4").unwrap(), Some(meta));
    }

    #[test]
    fn plain_node_spec_has_no_metadata() {
        let (_dir, store) = open_temp();
        store.save_node_spec("5", "# no frontmatter").unwrap();
        assert_eq!(store.load_node_metadata("5").unwrap(), None);
    }
}
