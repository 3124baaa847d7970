use std::io::Cursor;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::CaptureConfig;
use crate::print::events::{notify, EventSink, PrintEvent};

use super::context::RenderSurface;

/// An encoded screenshot together with its pixel size.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// Reads the pixel size from the image header without decoding pixels.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self> {
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .context("unreadable image data")?
            .into_dimensions()
            .context("failed to read image dimensions")?;

        Ok(Self {
            bytes,
            width,
            height,
        })
    }
}

/// Captures what the surface currently shows, with the print chrome hidden.
///
/// Returns `Ok(None)` when `cancel` fires before the surface delivers a
/// bitmap. `overlay-show` is sent on every path.
pub async fn capture_viewport(
    surface: &dyn RenderSurface,
    events: &dyn EventSink,
    config: &CaptureConfig,
    cancel: &CancellationToken,
) -> Result<Option<RasterImage>> {
    notify(events, PrintEvent::OverlayHide);
    if let Some(delay) = config.overlay_delay() {
        tokio::time::sleep(delay).await;
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        raster = surface.capture() => raster.map(Some),
    };

    notify(events, PrintEvent::OverlayShow);

    result
}
