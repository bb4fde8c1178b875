//! Dictation history commands.

use crate::history::{HistoryEntry, HistoryStorage};
use std::sync::Arc;
use tauri::State;

#[tauri::command]
pub fn get_history(
    history: State<'_, Arc<HistoryStorage>>,
    limit: Option<usize>,
) -> Result<Vec<HistoryEntry>, String> {
    history.get_all(limit)
}

#[tauri::command]
pub fn delete_history_entry(
    history: State<'_, Arc<HistoryStorage>>,
    id: String,
) -> Result<bool, String> {
    history.delete(&id)
}

#[tauri::command]
pub fn clear_history(history: State<'_, Arc<HistoryStorage>>) -> Result<(), String> {
    history.clear()
}
