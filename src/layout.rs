//! Placement of the content webview inside the main window.

/// Height of the toolbar strip above the content, in logical pixels.
pub const TITLEBAR_HEIGHT: f64 = 32.0;

/// Physical-pixel rectangle the content webview occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Fills the window below a titlebar of `titlebar_height` logical pixels.
///
/// Window sizes are physical pixels. A window shorter than the titlebar leaves
/// the content zero pixels tall.
pub fn content_bounds(
    window_width: u32,
    window_height: u32,
    scale_factor: f64,
    titlebar_height: f64,
) -> ContentBounds {
    let titlebar_px = (titlebar_height * scale_factor) as u32;

    ContentBounds {
        x: 0,
        y: i32::try_from(titlebar_px).unwrap_or(i32::MAX),
        width: window_width,
        height: window_height.saturating_sub(titlebar_px),
    }
}
