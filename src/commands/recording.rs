//! Widget recording intents.
//!
//! The widget's click-to-record path mirrors the hotkey path: same
//! capture session, same pipeline, different displayed state plus an
//! explicit Cancel affordance.

use crate::orchestrator::{Orchestrator, RecordingSource, WidgetState};
use tauri::State;

#[tauri::command]
pub fn start_widget_recording(orchestrator: State<'_, Orchestrator>) {
    orchestrator.activation_start(RecordingSource::Click);
}

#[tauri::command]
pub async fn stop_widget_recording(orchestrator: State<'_, Orchestrator>) -> Result<(), String> {
    let orchestrator = orchestrator.inner().clone();
    orchestrator.activation_stop().await;
    Ok(())
}

#[tauri::command]
pub fn cancel_widget_recording(orchestrator: State<'_, Orchestrator>) {
    orchestrator.cancel();
}

/// Current widget state, for windows (re)connecting late.
#[tauri::command]
pub fn widget_state(orchestrator: State<'_, Orchestrator>) -> WidgetState {
    orchestrator.widget_state()
}
