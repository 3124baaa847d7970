//! The content webview: a child of the main window, below the toolbar.

use log::{error, info, warn};
use tauri::webview::WebviewBuilder;
use tauri::{
    AppHandle, Manager, PhysicalPosition, PhysicalSize, Position, Rect, Size, WebviewUrl,
    Window, WindowEvent,
};
use thiserror::Error;

use crate::config::{CONTENT_URL, CONTENT_WEBVIEW_LABEL, MAIN_WINDOW_LABEL};
use crate::layout::{content_bounds, ContentBounds, TITLEBAR_HEIGHT};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Failed to acquire window: {0}")]
    WindowNotFound(String),
    #[error("Tauri error: {0}")]
    Tauri(#[from] tauri::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for WindowError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

impl From<ContentBounds> for Rect {
    fn from(bounds: ContentBounds) -> Self {
        Rect {
            position: Position::Physical(PhysicalPosition {
                x: bounds.x,
                y: bounds.y,
            }),
            size: Size::Physical(PhysicalSize {
                width: bounds.width,
                height: bounds.height,
            }),
        }
    }
}

fn bounds_for(window: &Window) -> Result<Rect, WindowError> {
    let scale_factor = window.scale_factor()?;
    let size = window.inner_size()?;
    Ok(content_bounds(size.width, size.height, scale_factor, TITLEBAR_HEIGHT).into())
}

fn main_window(app: &AppHandle) -> Result<Window, WindowError> {
    app.get_window(MAIN_WINDOW_LABEL).ok_or_else(|| {
        let msg = format!("window {MAIN_WINDOW_LABEL} not found");
        error!("{msg}");
        WindowError::WindowNotFound(msg)
    })
}

/// Adds the content webview under the main window's toolbar. Does nothing if
/// it already exists.
pub fn ensure_content_webview(app: &AppHandle) -> Result<(), WindowError> {
    if app.get_webview(CONTENT_WEBVIEW_LABEL).is_some() {
        info!("content webview already exists");
        return Ok(());
    }

    let window = main_window(app)?;
    let bounds = bounds_for(&window)?;
    let url = CONTENT_URL
        .parse()
        .map_err(|e| WindowError::Internal(format!("invalid content URL: {e}")))?;

    let builder = WebviewBuilder::new(CONTENT_WEBVIEW_LABEL, WebviewUrl::External(url));
    window
        .add_child(builder, bounds.position, bounds.size)
        .map_err(|e| {
            error!("failed to add content webview: {e}");
            WindowError::Tauri(e)
        })?;

    info!("content webview created at {CONTENT_URL}");
    Ok(())
}

fn fit_content_webview(app: &AppHandle) -> Result<(), WindowError> {
    let Some(webview) = app.get_webview(CONTENT_WEBVIEW_LABEL) else {
        return Ok(());
    };
    let bounds = bounds_for(&main_window(app)?)?;
    webview.set_position(bounds.position)?;
    webview.set_size(bounds.size)?;
    Ok(())
}

/// Keeps the content webview filling the window as it is resized.
pub fn track_main_window(app: &AppHandle) -> Result<(), WindowError> {
    let handle = app.clone();
    main_window(app)?.on_window_event(move |event| {
        if matches!(event, WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }) {
            if let Err(err) = fit_content_webview(&handle) {
                warn!("failed to resize content webview: {err}");
            }
        }
    });
    Ok(())
}

#[tauri::command]
pub async fn create_content_webview(app: AppHandle) -> Result<(), WindowError> {
    ensure_content_webview(&app)
}
