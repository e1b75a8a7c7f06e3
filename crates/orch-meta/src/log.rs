//! Append-only JSON-lines logs
//!
//! One JSON record per line, newline-terminated. Writers open the file in
//! append mode under the log's lock and never truncate it. Readers skip lines
//! that do not parse, so one bad line never makes a log unreadable.

use crate::error::{MetaResult, MetaStoreError};
use crate::layout::{Resource, ORCHESTRATOR_LOG};
use crate::store::MetadataStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

impl MetadataStore {
    /// Append one record to `logs/<log_name>.log`
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe names, a JSON error if the
    /// record cannot be encoded, or an IO error
    pub fn append_record<T>(&self, log_name: &str, record: &T) -> MetaResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.append_to(&Resource::log(log_name)?, record)
    }

    /// Read records from `logs/<log_name>.log`, oldest first
    ///
    /// With `limit = Some(n)` and `n > 0`, only the last `n` records are
    /// returned, still oldest first. A missing log reads as empty.
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe names, or an IO error
    pub fn read_records(&self, log_name: &str, limit: Option<usize>) -> MetaResult<Vec<Value>> {
        self.read_from(&Resource::log(log_name)?, limit)
    }

    /// Read records that decode as `T`, skipping everything else
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe names, or an IO error
    pub fn read_records_as<T>(&self, log_name: &str, limit: Option<usize>) -> MetaResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let records = self
            .read_records(log_name, None)?
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        Ok(apply_limit(records, limit))
    }

    /// Append to the orchestrator log
    ///
    /// # Errors
    /// Returns a JSON error if the record cannot be encoded, or an IO error
    pub fn append_log<T>(&self, entry: &T) -> MetaResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.append_to(&Resource::Log(ORCHESTRATOR_LOG.to_string()), entry)
    }

    /// Read the orchestrator log
    ///
    /// # Errors
    /// Returns an IO error if the log exists but cannot be read
    pub fn read_logs(&self, limit: Option<usize>) -> MetaResult<Vec<Value>> {
        self.read_from(&Resource::Log(ORCHESTRATOR_LOG.to_string()), limit)
    }

    /// Create an empty `logs/node-<id>.log` if it does not exist
    ///
    /// Existing content is kept.
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn create_node_log(&self, node_id: &str) -> MetaResult<PathBuf> {
        let resource = Resource::node_log(node_id)?;
        let path = self.path_of(&resource);
        let lock = self.acquire(&resource);
        let _guard = lock.lock();
        open_append(&path)?;
        Ok(path)
    }

    /// Append to a node's own log
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, a JSON error, or an IO error
    pub fn append_node_log<T>(&self, node_id: &str, entry: &T) -> MetaResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.append_to(&Resource::node_log(node_id)?, entry)
    }

    /// Read a node's own log
    ///
    /// # Errors
    /// Returns an invalid key error for unsafe ids, or an IO error
    pub fn read_node_log(&self, node_id: &str, limit: Option<usize>) -> MetaResult<Vec<Value>> {
        self.read_from(&Resource::node_log(node_id)?, limit)
    }

    fn append_to<T>(&self, resource: &Resource, record: &T) -> MetaResult<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path_of(resource);
        let mut line = serde_json::to_string(record).map_err(|e| MetaStoreError::json(&path, e))?;
        line.push('\n');

        let lock = self.acquire(resource);
        let _guard = lock.lock();
        let mut file = open_append(&path)?;
        file.write_all(line.as_bytes())
            .map_err(|e| MetaStoreError::io(&path, e))?;
        tracing::debug!("Appended record to {}", resource);
        Ok(())
    }

    fn read_from(&self, resource: &Resource, limit: Option<usize>) -> MetaResult<Vec<Value>> {
        let path = self.path_of(resource);
        let bytes = {
            let lock = self.acquire(resource);
            let _guard = lock.lock();
            match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(MetaStoreError::io(&path, e)),
            }
        };
        Ok(apply_limit(parse_lines(&bytes, &path), limit))
    }
}

fn open_append(path: &Path) -> MetaResult<fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| MetaStoreError::io(path, e))
}

/// Decode one record per line, skipping blank and malformed lines
pub(crate) fn parse_lines(bytes: &[u8], path: &Path) -> Vec<Value> {
    let mut records = Vec::new();
    for (index, line) in bytes.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice(line) {
            Ok(value) => records.push(value),
            Err(e) => {
                tracing::debug!("Skipping malformed line {} in {}: {}", index + 1, path.display(), e);
            }
        }
    }
    records
}

fn apply_limit<T>(mut records: Vec<T>, limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(n) if n > 0 && records.len() > n => records.split_off(records.len() - n),
        _ => records,
    }
}
