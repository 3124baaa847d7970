//! Tauri host: wires the print engine to the app's webviews, event channel
//! and frontend.

pub mod bridge;
pub mod commands;
pub mod host;
pub mod webview;
pub mod window;

use std::sync::Arc;

use tauri::Manager;

use crate::config::CaptureConfig;
use crate::print::PrintController;

use bridge::ReplyBridge;
use commands::{cancel_print, print_bridge_reply, print_status, print_to_pdf};
use host::{BridgeSavePrompt, TauriEvents};
use window::{create_content_webview, ensure_content_webview, track_main_window};

pub struct DesktopState {
    pub controller: PrintController,
    pub bridge: ReplyBridge,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("scrollprint starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let config = CaptureConfig::from_env();
            if config.test_mode {
                log::info!("test mode: capture delays disabled");
            }

            let bridge = ReplyBridge::default();
            let events = Arc::new(TauriEvents::new(app.handle().clone()));
            let prompt = Arc::new(BridgeSavePrompt::new(app.handle().clone(), bridge.clone()));

            app.manage(DesktopState {
                controller: PrintController::new(events, prompt, config),
                bridge,
            });

            ensure_content_webview(app.handle())?;
            track_main_window(app.handle())?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            print_to_pdf,
            cancel_print,
            print_status,
            print_bridge_reply,
            create_content_webview,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
