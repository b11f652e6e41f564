//! Run checkpoints
//!
//! A checkpoint is written after every applied step and when a run finishes
//! or fails, so a run can be inspected or resumed by its [`RunId`].

use super::state::SharedState;
use super::types::{Role, RunId};
use crate::error::{PolymathError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed { reason: String },
}

/// Snapshot of a run between steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub run_id: RunId,

    /// Steps applied so far
    pub step: usize,

    /// Role to run next; `None` once terminal
    pub next: Option<Role>,

    pub status: RunStatus,
    pub state: SharedState,

    /// Unix timestamp (seconds)
    pub updated_at: u64,
}

impl Checkpoint {
    pub fn new(
        run_id: RunId,
        step: usize,
        next: Option<Role>,
        status: RunStatus,
        state: SharedState,
    ) -> Self {
        Self {
            run_id,
            step,
            next,
            status,
            state,
            updated_at: now_secs(),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Persistence for checkpoints
pub trait RunStore: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    fn load(&self, run_id: RunId) -> Result<Option<Checkpoint>>;

    /// All known runs, most recently updated first
    fn list(&self) -> Result<Vec<Checkpoint>>;
}

/// Checkpoints kept in process memory
#[derive(Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<RunId, Checkpoint>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for InMemoryRunStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.runs
            .write()
            .insert(checkpoint.run_id, checkpoint.clone());
        Ok(())
    }

    fn load(&self, run_id: RunId) -> Result<Option<Checkpoint>> {
        Ok(self.runs.read().get(&run_id).cloned())
    }

    fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut runs: Vec<_> = self.runs.read().values().cloned().collect();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}

/// One pretty-printed JSON file per run
pub struct FileRunStore {
    dir: PathBuf,
}

impl FileRunStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, run_id: RunId) -> PathBuf {
        self.dir.join(format!("{}.json", run_id))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                PolymathError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create checkpoint directory: {}", e),
                ))
            })?;
        }
        Ok(())
    }

    fn read(&self, path: &std::path::Path) -> Result<Checkpoint> {
        let content = fs::read_to_string(path).map_err(|e| {
            PolymathError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read checkpoint: {}", e),
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            PolymathError::checkpoint(format!(
                "Failed to parse checkpoint {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl RunStore for FileRunStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(checkpoint).map_err(|e| {
            PolymathError::checkpoint(format!("Failed to serialize checkpoint: {}", e))
        })?;

        // Write atomically using temp file
        let path = self.path_for(checkpoint.run_id);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            PolymathError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write checkpoint: {}", e),
            ))
        })?;

        fs::rename(&temp_path, &path).map_err(|e| {
            PolymathError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to save checkpoint: {}", e),
            ))
        })?;

        Ok(())
    }

    fn load(&self, run_id: RunId) -> Result<Option<Checkpoint>> {
        let path = self.path_for(run_id);
        if !path.exists() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<Checkpoint>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                match self.read(&path) {
                    Ok(checkpoint) => runs.push(checkpoint),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable checkpoint"),
                }
            }
        }
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checkpoint(step: usize, status: RunStatus) -> Checkpoint {
        Checkpoint::new(
            RunId::new(),
            step,
            Some(Role::Reasoner),
            status,
            SharedState::new("What is 2+2?"),
        )
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemoryRunStore::new();
        let cp = checkpoint(1, RunStatus::Running);
        store.save(&cp).unwrap();

        assert_eq!(store.load(cp.run_id).unwrap(), Some(cp.clone()));
        assert_eq!(store.load(RunId::new()).unwrap(), None);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_overwrites_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStore::new(dir.path().join("runs"));

        let mut cp = checkpoint(1, RunStatus::Running);
        store.save(&cp).unwrap();

        cp.step = 2;
        cp.status = RunStatus::Failed {
            reason: "Request timed out".to_string(),
        };
        store.save(&cp).unwrap();

        let loaded = store.load(cp.run_id).unwrap().unwrap();
        assert_eq!(loaded, cp);
        assert!(!dir
            .path()
            .join("runs")
            .join(format!("{}.json.tmp", cp.run_id))
            .exists());
    }

    #[test]
    fn test_file_store_list_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStore::new(dir.path());
        store.save(&checkpoint(1, RunStatus::Running)).unwrap();
        store.save(&checkpoint(5, RunStatus::Completed)).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_file_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRunStore::new(dir.path().join("never-created"));
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.load(RunId::new()).unwrap(), None);
    }

    #[test]
    fn test_status_json() {
        let json = serde_json::to_value(RunStatus::Failed {
            reason: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "status": "failed", "reason": "boom" }));
    }
}
