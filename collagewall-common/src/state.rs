use crate::error::StateError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted selection memory. `history` backs the random
/// no-repeat-until-exhausted cycle; `cursor` is the last path handed out
/// in sequential mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            cursor: None,
            last_updated: chrono::Utc::now(),
        }
    }

    /// Loads state from disk. A missing or corrupt file is a cold start,
    /// never an error.
    pub fn load(state_file: &Path) -> Self {
        if !state_file.exists() {
            log::info!("No state file found, starting fresh");
            return Self::new();
        }

        match fs::read_to_string(state_file) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(state) => {
                    log::debug!("State loaded from {:?}", state_file);
                    state
                }
                Err(e) => {
                    log::warn!("State file {:?} is corrupt ({}), starting fresh", state_file, e);
                    Self::new()
                }
            },
            Err(e) => {
                log::warn!("Failed to read state file {:?} ({}), starting fresh", state_file, e);
                Self::new()
            }
        }
    }

    pub fn save(&self, state_file: &Path) -> Result<()> {
        if let Some(parent) = state_file.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::DirectoryCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;

        fs::write(state_file, json).map_err(|e| StateError::FileWrite {
            path: state_file.to_path_buf(),
            source: e,
        })?;

        log::debug!("State saved to {:?}", state_file);
        Ok(())
    }

    pub fn default_state_file() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("collagewall")
            .join("state.json")
    }

    pub fn touch(&mut self) {
        self.last_updated = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_state_save_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("state.json");

        let mut state = SelectionState::new();
        state.history = vec!["/w/a.jpg".to_string(), "/w/b.jpg".to_string()];
        state.cursor = Some("/w/b.jpg".to_string());

        state.save(&state_file).unwrap();
        let loaded = SelectionState::load(&state_file);

        assert_eq!(loaded.history, state.history);
        assert_eq!(loaded.cursor, state.cursor);
    }

    #[test]
    fn test_missing_state_file_loads_fresh() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("missing.json");

        let state = SelectionState::load(&state_file);
        assert!(state.history.is_empty());
        assert!(state.cursor.is_none());
    }

    #[test]
    fn test_corrupt_state_file_loads_fresh() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("state.json");
        fs::write(&state_file, "{not valid json at all").unwrap();

        let state = SelectionState::load(&state_file);
        assert!(state.history.is_empty());
        assert!(state.cursor.is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("deep").join("nested").join("state.json");

        let state = SelectionState::new();
        state.save(&state_file).unwrap();

        assert!(state_file.exists());
    }
}
