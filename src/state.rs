use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted marker of the last successful run.
pub trait StateStore {
    fn read_last_update(&self) -> Result<Option<String>, AppError>;
    fn write_last_update(&mut self, timestamp: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_update: Option<String>,
}

/// State kept in the host environment's state files: read from
/// `<data_dir>/in/state.json`, written to `<data_dir>/out/state.json`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    input: PathBuf,
    output: PathBuf,
}

impl FileStateStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            input: data_dir.join("in").join("state.json"),
            output: data_dir.join("out").join("state.json"),
        }
    }
}

impl StateStore for FileStateStore {
    fn read_last_update(&self) -> Result<Option<String>, AppError> {
        if !self.input.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.input).map_err(|e| {
            AppError::StateError(format!("Failed to read {}: {}", self.input.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            AppError::StateError(format!("Invalid state file {}: {}", self.input.display(), e))
        })?;
        Ok(state.last_update)
    }

    fn write_last_update(&mut self, timestamp: &str) -> Result<(), AppError> {
        if let Some(dir) = self.output.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::StateError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        let state = StateFile {
            last_update: Some(timestamp.to_string()),
        };
        let content = serde_json::to_string(&state)
            .map_err(|e| AppError::StateError(format!("Failed to encode state: {}", e)))?;
        std::fs::write(&self.output, content).map_err(|e| {
            AppError::StateError(format!("Failed to write {}: {}", self.output.display(), e))
        })
    }
}

/// In-memory state, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    pub last_update: Option<String>,
}

impl StateStore for MemoryStateStore {
    fn read_last_update(&self) -> Result<Option<String>, AppError> {
        Ok(self.last_update.clone())
    }

    fn write_last_update(&mut self, timestamp: &str) -> Result<(), AppError> {
        self.last_update = Some(timestamp.to_string());
        Ok(())
    }
}
