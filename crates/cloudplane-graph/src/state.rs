//! Durable state between runs
//!
//! Tracks, per node identity, the inputs hash and outputs of the last
//! successful apply plus the opaque Terraform state blob. The diff step
//! reads these to decide whether an apply is needed at all, and a failed
//! run leaves enough behind to retry just the failed subgraph.

use crate::error::{GraphError, Result};
use chrono::{DateTime, Utc};
use cloudplane_cloud::OutputMap;
use cloudplane_core::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".cloudplane";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Last-applied record for one node, keyed by `kind/name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    pub kind: ResourceKind,

    /// Provider account the node was applied through
    pub provider_name: String,

    /// Hash of the resolved inputs at last apply
    pub inputs_hash: String,

    /// Resolved inputs at last apply (needed to synthesize a destroy)
    pub inputs: OutputMap,

    /// Outputs recorded at last apply
    pub outputs: OutputMap,

    /// Opaque Terraform state blob for this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_state: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The full persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub records: HashMap<String, StateRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            records: HashMap::new(),
        }
    }
}

impl StateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&StateRecord> {
        self.records.get(id)
    }

    pub fn set(&mut self, id: String, record: StateRecord) {
        self.records.insert(id, record);
        self.updated_at = Utc::now();
    }

    pub fn remove(&mut self, id: &str) -> Option<StateRecord> {
        let removed = self.records.remove(id);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Record ids present in state but absent from the given set of live
    /// node ids — candidates for deletion.
    pub fn orphans(&self, live_ids: &[String]) -> Vec<String> {
        let mut orphans: Vec<String> = self
            .records
            .keys()
            .filter(|id| !live_ids.contains(id))
            .cloned()
            .collect();
        orphans.sort();
        orphans
    }
}

/// Reads and writes the state document under `<root>/.cloudplane/`.
pub struct StateStore {
    project_root: PathBuf,
}

impl StateStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    /// Scratch space for per-node Terraform working directories.
    pub fn workdir(&self, node_id: &str) -> PathBuf {
        self.state_dir().join("work").join(node_id.replace('/', "--"))
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current document, or an empty one if none exists.
    pub async fn load(&self) -> Result<StateDocument> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(StateDocument::new());
        }

        let content = fs::read_to_string(&path).await?;
        let document: StateDocument = serde_json::from_str(&content)?;

        if document.version > STATE_VERSION {
            return Err(GraphError::StateError(format!(
                "State file version {} is newer than supported version {}",
                document.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} records", document.records.len());
        Ok(document)
    }

    /// Save the document, keeping the previous file as a backup.
    pub async fn save(&self, document: &StateDocument) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(document)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} records", document.records.len());
        Ok(())
    }

    /// Acquire the run lock. A lock older than an hour is considered stale
    /// and taken over.
    pub async fn acquire_lock(&self, holder: &str) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();
        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let info: LockInfo = serde_json::from_str(&content)?;

            let age = Utc::now().signed_duration_since(info.acquired_at);
            if age.num_hours() < 1 {
                return Err(GraphError::LockError(format!(
                    "State is locked by {} since {}",
                    info.holder, info.acquired_at
                )));
            }
            tracing::warn!("Removing stale lock from {}", info.holder);
        }

        let info = LockInfo {
            holder: holder.to_string(),
            acquired_at: Utc::now(),
        };
        fs::write(&lock_path, serde_json::to_string_pretty(&info)?).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the run lock.
#[derive(Debug)]
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            // Synchronous cleanup in drop - not ideal but necessary
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
