use serde_json::Value;
use tauri::{AppHandle, Manager, State};

use crate::config::CONTENT_WEBVIEW_LABEL;
use crate::errors::PrintError;
use crate::print::{PrintOutcome, PrintStatus};

use super::webview::WebviewSurface;
use super::DesktopState;

/// The requested webview, else the content webview. The main window only
/// holds the toolbar and is never printed by default.
fn resolve_surface_label(app: &AppHandle, requested: Option<String>) -> Option<String> {
    let label = requested.unwrap_or_else(|| CONTENT_WEBVIEW_LABEL.to_string());
    app.get_webview(&label).is_some().then_some(label)
}

#[tauri::command]
pub async fn print_to_pdf(
    app: AppHandle,
    state: State<'_, DesktopState>,
    label: Option<String>,
) -> Result<PrintOutcome, PrintError> {
    let label = resolve_surface_label(&app, label)
        .ok_or_else(|| PrintError::Internal("no webview to print".into()))?;
    let surface = WebviewSurface::new(app, label, state.bridge.clone());

    state.controller.trigger(&surface).await
}

#[tauri::command]
pub fn cancel_print(state: State<'_, DesktopState>) -> bool {
    state.controller.cancel()
}

#[tauri::command]
pub fn print_status(state: State<'_, DesktopState>) -> PrintStatus {
    state.controller.status()
}

#[tauri::command]
pub fn print_bridge_reply(state: State<'_, DesktopState>, id: String, value: Value) -> bool {
    state.bridge.resolve(&id, value)
}
