use super::probe::ScrollMetrics;

/// How far to scroll per step and how many captures that takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturePlan {
    pub step_size: u32,
    pub total_steps: u32,
    /// Set when `max_pages` cut the plan short of the end of the content.
    pub truncated: bool,
}

impl CapturePlan {
    /// A single capture of whatever is on screen.
    pub const SINGLE: CapturePlan = CapturePlan {
        step_size: 0,
        total_steps: 1,
        truncated: false,
    };

    /// `step_size = floor(client_height * step_percent / 100)`,
    /// `total_steps = min(ceil(scroll_height / step_size), max_pages)`.
    pub fn from_metrics(
        metrics: Option<&ScrollMetrics>,
        step_percent: u32,
        max_pages: u32,
    ) -> Self {
        let Some(metrics) = metrics else {
            return Self::SINGLE;
        };
        if metrics.scroll_height <= metrics.client_height {
            return Self::SINGLE;
        }

        let step_size = (u64::from(metrics.client_height) * u64::from(step_percent) / 100) as u32;
        if step_size == 0 {
            return Self::SINGLE;
        }

        let needed = metrics.scroll_height.div_ceil(step_size);
        let max_pages = max_pages.max(1);
        Self {
            step_size,
            total_steps: needed.min(max_pages),
            truncated: needed > max_pages,
        }
    }

    pub fn offset(&self, step: u32) -> u32 {
        step.saturating_mul(self.step_size)
    }
}
