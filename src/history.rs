//! Dictation history persistence.
//!
//! Completed dictations are appended newest-first to `history.json` in
//! the app data directory, bounded to the most recent 500 entries.
//! Only finished results are stored; in-flight sessions never touch disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use uuid::Uuid;

/// Maximum retained entries; older ones are dropped.
const MAX_ENTRIES: usize = 500;

/// A single completed dictation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// When the recording started.
    pub timestamp: DateTime<Utc>,
    /// Final (formatted) text.
    pub text: String,
    /// Raw transcript before formatting.
    pub raw_text: String,
    /// Wall time from recording start to pipeline completion.
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct HistoryData {
    entries: Vec<HistoryEntry>,
}

/// Manages loading and saving of dictation history.
pub struct HistoryStorage {
    data: RwLock<HistoryData>,
    file_path: PathBuf,
}

impl HistoryStorage {
    /// Create a new history storage rooted at the given app data directory.
    pub fn new(app_data_dir: PathBuf) -> Self {
        let file_path = app_data_dir.join("history.json");

        if let Some(parent) = file_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let data = Self::load_from_file(&file_path).unwrap_or_default();

        Self {
            data: RwLock::new(data),
            file_path,
        }
    }

    fn load_from_file(file_path: &PathBuf) -> Option<HistoryData> {
        let content = fs::read_to_string(file_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn save(&self) -> Result<(), String> {
        let data = self
            .data
            .read()
            .map_err(|e| format!("Failed to read history: {}", e))?;

        let content = serde_json::to_string_pretty(&*data)
            .map_err(|e| format!("Failed to serialize history: {}", e))?;

        fs::write(&self.file_path, content)
            .map_err(|e| format!("Failed to write history file: {}", e))?;

        Ok(())
    }

    /// Append a completed dictation (newest first).
    pub fn append(
        &self,
        text: String,
        raw_text: String,
        timestamp: DateTime<Utc>,
        duration_ms: u64,
    ) -> Result<HistoryEntry, String> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            timestamp,
            text,
            raw_text,
            duration_ms,
        };

        {
            let mut data = self
                .data
                .write()
                .map_err(|e| format!("Failed to write history: {}", e))?;

            data.entries.insert(0, entry.clone());

            if data.entries.len() > MAX_ENTRIES {
                data.entries.truncate(MAX_ENTRIES);
            }
        }
        self.save()?;
        Ok(entry)
    }

    /// Get history entries (newest first), optionally limited.
    pub fn get_all(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, String> {
        let data = self
            .data
            .read()
            .map_err(|e| format!("Failed to read history: {}", e))?;

        let entries = match limit {
            Some(n) => data.entries.iter().take(n).cloned().collect(),
            None => data.entries.clone(),
        };

        Ok(entries)
    }

    /// Delete an entry by id. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, String> {
        let deleted = {
            let mut data = self
                .data
                .write()
                .map_err(|e| format!("Failed to write history: {}", e))?;

            let initial_len = data.entries.len();
            data.entries.retain(|e| e.id != id);
            data.entries.len() < initial_len
        };

        if deleted {
            self.save()?;
        }

        Ok(deleted)
    }

    /// Clear all history.
    pub fn clear(&self) -> Result<(), String> {
        {
            let mut data = self
                .data
                .write()
                .map_err(|e| format!("Failed to write history: {}", e))?;
            data.entries.clear();
        }
        self.save()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
