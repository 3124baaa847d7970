use tokio_util::sync::CancellationToken;

use crate::config::CaptureConfig;
use crate::errors::PrintError;
use crate::print::events::{
    notify, EventSink, PrintEvent, ProgressEnd, ProgressStart, ProgressUpdate,
};

use super::context::{ContextResolver, RenderSurface};
use super::plan::CapturePlan;
use super::probe::probe;
use super::scroller::scroll_to;
use super::viewport::{capture_viewport, RasterImage};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_info, log_warn};

/// One viewport capture. `ordinal` is its page index in the final document.
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub ordinal: u32,
    pub image_buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CapturedPage {
    fn new(ordinal: u32, raster: RasterImage) -> Self {
        Self {
            ordinal,
            image_buffer: raster.bytes,
            width: raster.width,
            height: raster.height,
        }
    }
}

#[derive(Debug)]
pub struct CaptureRun {
    pub pages: Vec<CapturedPage>,
    pub cancelled: bool,
    /// Where the container was before the run; `None` when nothing was scrolled.
    pub original_scroll_top: Option<u32>,
}

/// Drives the scroll → capture loop over one surface.
pub struct CaptureOrchestrator<'a> {
    resolver: &'a ContextResolver,
    events: &'a dyn EventSink,
    config: &'a CaptureConfig,
}

impl<'a> CaptureOrchestrator<'a> {
    pub fn new(
        resolver: &'a ContextResolver,
        events: &'a dyn EventSink,
        config: &'a CaptureConfig,
    ) -> Self {
        Self {
            resolver,
            events,
            config,
        }
    }

    /// Captures the whole scrollable content, one viewport per step.
    ///
    /// Cancellation is checked before each step and also ends a capture the
    /// surface has not answered yet; pages captured so far are still returned
    /// with `cancelled` set. Every exit path restores the
    /// original scroll offset and sends exactly one `progress-end`.
    pub async fn capture_full_page(
        &self,
        surface: &dyn RenderSurface,
        cancel: &CancellationToken,
    ) -> Result<CaptureRun, PrintError> {
        let metrics = probe(self.resolver, surface, &self.config.selectors).await;
        let plan = CapturePlan::from_metrics(
            metrics.as_ref(),
            self.config.step_percent,
            self.config.max_pages,
        );
        let original_scroll_top = metrics.map(|m| m.scroll_top);

        match &metrics {
            Some(m) => log_info!(
                "capture plan: {} steps of {}px (scrollHeight={}, clientHeight={}, scrollTop={})",
                plan.total_steps,
                plan.step_size,
                m.scroll_height,
                m.client_height,
                m.scroll_top
            ),
            None => log_warn!("scroll probe unavailable, capturing the visible viewport only"),
        }
        if plan.truncated {
            log_warn!(
                "content needs more than {} pages, capturing the first {}",
                self.config.max_pages,
                plan.total_steps
            );
        }

        notify(
            self.events,
            PrintEvent::ProgressStart(ProgressStart {
                total_pages: plan.total_steps,
            }),
        );

        let mut pages = Vec::new();
        let result = self
            .run_steps(surface, &plan, metrics.is_some(), cancel, &mut pages)
            .await;

        if let Some(top) = original_scroll_top {
            if surface.is_destroyed() {
                log_warn!("surface destroyed, skipping scroll restore");
            } else if !scroll_to(self.resolver, surface, self.config, top).await {
                log_warn!("could not restore scroll offset {top}");
            }
        }

        let cancelled = cancel.is_cancelled();
        notify(
            self.events,
            PrintEvent::ProgressEnd(ProgressEnd {
                cancelled,
                success: result.is_ok() && !cancelled && !pages.is_empty(),
            }),
        );

        result?;
        log_info!(
            "captured {} of {} pages (cancelled={cancelled})",
            pages.len(),
            plan.total_steps
        );

        Ok(CaptureRun {
            pages,
            cancelled,
            original_scroll_top,
        })
    }

    async fn run_steps(
        &self,
        surface: &dyn RenderSurface,
        plan: &CapturePlan,
        scrollable: bool,
        cancel: &CancellationToken,
        pages: &mut Vec<CapturedPage>,
    ) -> Result<(), PrintError> {
        for step in 0..plan.total_steps {
            if cancel.is_cancelled() {
                log_info!("capture cancelled before step {}", step + 1);
                break;
            }

            if scrollable {
                // A failed scroll still captures; the page just repeats the current view.
                scroll_to(self.resolver, surface, self.config, plan.offset(step)).await;
            }

            let Some(raster) = capture_viewport(surface, self.events, self.config, cancel)
                .await
                .map_err(PrintError::CaptureFailure)?
            else {
                log_info!("capture cancelled during step {}", step + 1);
                break;
            };
            log_debug!(
                "step {}/{}: {}x{} ({} bytes)",
                step + 1,
                plan.total_steps,
                raster.width,
                raster.height,
                raster.bytes.len()
            );
            pages.push(CapturedPage::new(step, raster));

            notify(
                self.events,
                PrintEvent::ProgressUpdate(ProgressUpdate::new(step + 1, plan.total_steps)),
            );
        }

        Ok(())
    }
}
