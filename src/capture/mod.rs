pub mod context;
pub mod orchestrator;
pub mod plan;
pub mod probe;
pub mod scroller;
pub mod viewport;

pub use context::{ContentContext, ContextResolver, FrameStrategy, RenderSurface};
pub use orchestrator::{CaptureOrchestrator, CaptureRun, CapturedPage};
pub use plan::CapturePlan;
pub use probe::{probe, ScrollMetrics};
pub use scroller::scroll_to;
pub use viewport::{capture_viewport, RasterImage};
