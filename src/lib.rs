pub mod capture;
pub mod config;
pub mod errors;
pub mod layout;
pub mod pdf;
pub mod print;
mod utils;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use capture::{
    CaptureOrchestrator, CapturePlan, CapturedPage, ContentContext, RenderSurface, ScrollMetrics,
};
pub use config::CaptureConfig;
pub use errors::PrintError;
pub use print::{PrintController, PrintOutcome, PrintState};

#[cfg(feature = "desktop")]
pub use desktop::run;
