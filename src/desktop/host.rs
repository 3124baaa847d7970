use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager};

use crate::config::MAIN_WINDOW_LABEL;
use crate::print::{EventSink, PrintEvent, SavePrompt};

use super::bridge::ReplyBridge;

/// Event asking the presentation layer for a save location.
pub const SAVE_REQUEST_EVENT: &str = "print-save-request";

/// A dialog left unanswered this long fails the session.
const SAVE_REPLY_TIMEOUT: Duration = Duration::from_secs(600);

/// Emits print events on the app handle, as long as the main window is alive.
pub struct TauriEvents {
    app: AppHandle,
}

impl TauriEvents {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl EventSink for TauriEvents {
    fn is_destroyed(&self) -> bool {
        self.app.get_window(MAIN_WINDOW_LABEL).is_none()
    }

    fn emit(&self, event: &PrintEvent) -> Result<()> {
        self.app
            .emit(event.name(), event.clone())
            .map_err(|err| anyhow!("failed to emit {}: {err}", event.name()))
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    id: String,
    suggested_path: String,
}

/// Save location prompt answered by the frontend through `print_bridge_reply`
/// with a path string, or `null` when the dialog was dismissed.
pub struct BridgeSavePrompt {
    app: AppHandle,
    bridge: ReplyBridge,
}

impl BridgeSavePrompt {
    pub fn new(app: AppHandle, bridge: ReplyBridge) -> Self {
        Self { app, bridge }
    }
}

#[async_trait]
impl SavePrompt for BridgeSavePrompt {
    async fn choose_destination(&self, suggested: &Path) -> Result<Option<PathBuf>> {
        let pending = self.bridge.register();
        self.app
            .emit(
                SAVE_REQUEST_EVENT,
                SaveRequest {
                    id: pending.id.clone(),
                    suggested_path: suggested.display().to_string(),
                },
            )
            .map_err(|err| anyhow!("failed to request save location: {err}"))?;

        match pending.wait(Some(SAVE_REPLY_TIMEOUT)).await? {
            Value::Null => Ok(None),
            Value::String(path) if path.trim().is_empty() => Ok(None),
            Value::String(path) => Ok(Some(PathBuf::from(path))),
            other => Err(anyhow!("unexpected save location reply: {other}")),
        }
    }
}
