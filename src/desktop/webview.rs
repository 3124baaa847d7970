use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager};

use crate::capture::{ContentContext, RasterImage, RenderSurface};

use super::bridge::{ReplyBridge, BRIDGE_ERROR_KEY};

const SCRIPT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// The shell may have to repaint before it can rasterise, so this is looser
/// than the script timeout. A cancelled session stops waiting earlier.
const CAPTURE_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Event asking the native shell to rasterise a webview.
pub const CAPTURE_REQUEST_EVENT: &str = "print-capture-request";

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct CaptureRequest {
    id: String,
    label: String,
}

/// Wraps `script` so its completion value comes back over the reply bridge.
fn bridged_script(id: &str, script: &str) -> String {
    format!(
        r#"(async () => {{
  let value = null;
  try {{
    value = await ({script});
  }} catch (err) {{
    value = {{ "{BRIDGE_ERROR_KEY}": String(err) }};
  }}
  window.__TAURI_INTERNALS__.invoke("print_bridge_reply", {{ id: "{id}", value: value ?? null }});
}})();"#
    )
}

/// A Tauri webview seen as a print surface.
///
/// Cross-origin frames are not reachable through `eval`, so only the webview's
/// own document is offered as a frame.
#[derive(Clone)]
pub struct WebviewSurface {
    app: AppHandle,
    label: String,
    bridge: ReplyBridge,
}

impl WebviewSurface {
    pub fn new(app: AppHandle, label: impl Into<String>, bridge: ReplyBridge) -> Self {
        Self {
            app,
            label: label.into(),
            bridge,
        }
    }
}

struct WebviewFrame {
    surface: WebviewSurface,
}

#[async_trait]
impl ContentContext for WebviewFrame {
    fn url(&self) -> String {
        self.surface
            .app
            .get_webview(&self.surface.label)
            .and_then(|webview| webview.url().ok())
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let webview = self
            .surface
            .app
            .get_webview(&self.surface.label)
            .ok_or_else(|| anyhow!("webview {} is gone", self.surface.label))?;

        let pending = self.surface.bridge.register();
        webview
            .eval(&bridged_script(&pending.id, script))
            .context("failed to evaluate script")?;

        pending.wait(Some(SCRIPT_REPLY_TIMEOUT)).await
    }
}

#[async_trait]
impl RenderSurface for WebviewSurface {
    fn main_frame(&self) -> Arc<dyn ContentContext> {
        Arc::new(WebviewFrame {
            surface: self.clone(),
        })
    }

    fn child_frames(&self) -> Vec<Arc<dyn ContentContext>> {
        Vec::new()
    }

    async fn capture(&self) -> Result<RasterImage> {
        if self.is_destroyed() {
            return Err(anyhow!("webview {} is gone", self.label));
        }

        let pending = self.bridge.register();
        self.app
            .emit(
                CAPTURE_REQUEST_EVENT,
                CaptureRequest {
                    id: pending.id.clone(),
                    label: self.label.clone(),
                },
            )
            .map_err(|err| anyhow!("failed to request capture: {err}"))?;

        let value = pending.wait(Some(CAPTURE_REPLY_TIMEOUT)).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| anyhow!("capture reply is not a base64 string"))?;
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .context("capture reply is not valid base64")?;

        RasterImage::from_encoded(bytes)
    }

    fn is_destroyed(&self) -> bool {
        self.app.get_webview(&self.label).is_none()
    }
}
