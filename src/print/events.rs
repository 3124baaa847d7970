use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStart {
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub current_page: u32,
    pub total_pages: u32,
    pub percent: u32,
}

impl ProgressUpdate {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let percent = if total_pages == 0 {
            0
        } else {
            ((current_page as f64 / total_pages as f64) * 100.0).round() as u32
        };
        Self {
            current_page,
            total_pages,
            percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEnd {
    pub cancelled: bool,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Saved {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Failed {
    pub message: String,
}

/// Everything the engine tells the presentation layer.
///
/// Serialises to the bare payload; the channel name comes from [`PrintEvent::name`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PrintEvent {
    OverlayHide,
    OverlayShow,
    ProgressStart(ProgressStart),
    ProgressUpdate(ProgressUpdate),
    ProgressEnd(ProgressEnd),
    Success(Saved),
    Error(Failed),
}

impl PrintEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PrintEvent::OverlayHide => "print-overlay-hide",
            PrintEvent::OverlayShow => "print-overlay-show",
            PrintEvent::ProgressStart(_) => "print-progress-start",
            PrintEvent::ProgressUpdate(_) => "print-progress-update",
            PrintEvent::ProgressEnd(_) => "print-progress-end",
            PrintEvent::Success(_) => "print-success",
            PrintEvent::Error(_) => "print-error",
        }
    }
}

/// Outbound channel to whoever renders print progress.
pub trait EventSink: Send + Sync {
    /// True once the receiving surface is gone; nothing should be sent then.
    fn is_destroyed(&self) -> bool;

    fn emit(&self, event: &PrintEvent) -> Result<()>;
}

/// Sends `event` unless the receiver is gone. Never fails the caller.
pub fn notify(sink: &dyn EventSink, event: PrintEvent) {
    if sink.is_destroyed() {
        debug!("dropping {} event: receiver destroyed", event.name());
        return;
    }

    if let Err(err) = sink.emit(&event) {
        warn!("failed to emit {}: {err:#}", event.name());
    }
}

/// Sink that discards everything, for headless runs.
pub struct NullSink;

impl EventSink for NullSink {
    fn is_destroyed(&self) -> bool {
        false
    }

    fn emit(&self, _event: &PrintEvent) -> Result<()> {
        Ok(())
    }
}
