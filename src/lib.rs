use std::sync::{Arc, RwLock};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder};

mod audio;
mod capture;
mod commands;
mod formatting;
mod history;
mod hotkey;
mod orchestrator;
mod paste;
mod settings;
mod stt;

#[cfg(test)]
mod tests;

use capture::CpalCaptureSession;
use history::HistoryStorage;
use hotkey::{ActivationEdge, InputWatcher, SharedActivationConfig};
use orchestrator::{ErrorKind, GatewaySlot, Orchestrator, RecordingSource, StatusSink, WidgetState};
use paste::SystemInjector;
use settings::StoreSettings;

/// Status sink publishing orchestrator state to all webview windows.
///
/// `widget-state` carries one of the four widget states; `dictation-error`
/// carries `{ kind, message }`; `transcript-ready` and `history-changed`
/// fire once per completed dictation.
struct EventSink {
    app: AppHandle,
}

impl StatusSink for EventSink {
    fn widget_state(&self, state: WidgetState) {
        let _ = self.app.emit("widget-state", state);
    }

    fn notify_error(&self, kind: ErrorKind, message: &str) {
        let payload = serde_json::json!({
            "kind": kind,
            "message": message,
        });
        let _ = self.app.emit("dictation-error", payload);
    }

    fn dictation_complete(&self, text: &str) {
        let _ = self.app.emit("transcript-ready", text);
        let _ = self.app.emit("history-changed", ());
    }
}

/// Wire the global input watcher to the orchestrator.
///
/// Press edges start a recording synchronously; release edges hand off to
/// the async pipeline. The watcher's dispatch thread stays free to keep
/// observing keys while a pipeline runs.
fn spawn_input_watcher(
    app: &AppHandle,
    watcher_config: SharedActivationConfig,
    orchestrator: Orchestrator,
) {
    let result = InputWatcher::spawn(watcher_config, move |edge| match edge {
        ActivationEdge::Started => orchestrator.activation_start(RecordingSource::Hotkey),
        ActivationEdge::Stopped => {
            let orchestrator = orchestrator.clone();
            tauri::async_runtime::spawn(async move {
                orchestrator.activation_stop().await;
            });
        }
    });

    match result {
        Ok(watcher) => {
            app.manage(watcher);
            log::info!("Global input watcher running");
        }
        Err(e) => {
            // Fatal for push-to-talk; the widget's click path still works.
            // Usually this means Input Monitoring permission is missing.
            log::error!("Global input watcher failed to start: {}", e);
            let payload = serde_json::json!({
                "kind": ErrorKind::PermissionDenied,
                "message": format!(
                    "Push-to-talk unavailable: {}. Grant Input Monitoring permission in \
                     System Settings and restart StayFree.",
                    e
                ),
            });
            let _ = app.emit("dictation-error", payload);
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        .plugin(tauri_plugin_store::Builder::new().build())
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let handle = app.handle().clone();

            settings::ensure_default_settings(&handle)?;
            let stored = settings::load_settings(&handle);

            let app_data_dir = handle.path().app_data_dir()?;
            let history = Arc::new(HistoryStorage::new(app_data_dir));

            let gateways = Arc::new(GatewaySlot::from_keys(
                stored.groq_api_key.clone(),
                stored.sarvam_api_key.clone(),
            ));

            let orchestrator = Orchestrator::new(
                Box::new(CpalCaptureSession::new()),
                gateways.clone(),
                Arc::new(SystemInjector::new(handle.clone())),
                history.clone(),
                Arc::new(StoreSettings::new(handle.clone())),
                Arc::new(EventSink {
                    app: handle.clone(),
                }),
            );

            if stored.activation.use_combo {
                let names: Vec<String> = stored
                    .activation
                    .combo_keys
                    .iter()
                    .map(|code| hotkey::keycodes::code_to_name(*code))
                    .collect();
                log::info!("Push-to-talk combo: {}", names.join("+"));
            } else {
                log::info!(
                    "Push-to-talk key: {}",
                    hotkey::keycodes::code_to_name(stored.activation.primary_key)
                );
            }

            let watcher_config: SharedActivationConfig =
                Arc::new(RwLock::new(stored.activation.clone()));
            spawn_input_watcher(&handle, watcher_config.clone(), orchestrator.clone());

            app.manage(orchestrator);
            app.manage(watcher_config);
            app.manage(gateways);
            app.manage(history);

            if !stored.onboarding_complete {
                WebviewWindowBuilder::new(
                    app,
                    "onboarding",
                    WebviewUrl::App("onboarding.html".into()),
                )
                .title("Welcome to StayFree")
                .inner_size(520.0, 560.0)
                .resizable(false)
                .build()?;
            }

            log::info!("StayFree ready");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::recording::start_widget_recording,
            commands::recording::stop_widget_recording,
            commands::recording::cancel_widget_recording,
            commands::recording::widget_state,
            commands::settings::get_settings,
            commands::settings::set_activation_config,
            commands::settings::set_language,
            commands::settings::set_api_keys,
            commands::settings::set_sound_enabled,
            commands::settings::set_input_device,
            commands::settings::list_input_devices,
            commands::settings::check_accessibility,
            commands::settings::open_accessibility_settings,
            commands::settings::complete_onboarding,
            commands::settings::open_settings_window,
            commands::dictionary::get_dictionary,
            commands::dictionary::set_dictionary_entry,
            commands::dictionary::remove_dictionary_entry,
            commands::history::get_history,
            commands::history::delete_history_entry,
            commands::history::clear_history,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
