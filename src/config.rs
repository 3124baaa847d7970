use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Host the printable conversation is served from.
pub const CONTENT_HOST: &str = "gemini.google.com";

/// Page the content webview opens on.
pub const CONTENT_URL: &str = "https://gemini.google.com/app";

/// Label for the main application window.
pub const MAIN_WINDOW_LABEL: &str = "main";

/// Label for the embedded content webview.
pub const CONTENT_WEBVIEW_LABEL: &str = "gemini-webview";

/// Each step advances by this share of the viewport, leaving a 10% overlap.
pub const STEP_PERCENT: u32 = 90;

/// Upper bound on captures per session. Page geometry comes from the page
/// itself and is not trusted.
pub const MAX_PAGES: u32 = 200;

const CONFIG_PATH_ENV: &str = "SCROLLPRINT_CONFIG";
const TEST_MODE_ENV: &str = "SCROLLPRINT_TEST_MODE";
const E2E_ENV: &str = "SCROLLPRINT_E2E";

/// Scroll container candidates, most specific first. The owning document is
/// always tried after these.
fn default_selectors() -> Vec<String> {
    [
        "infinite-scroller.chat-history",
        "infinite-scroller",
        ".chat-history-scroll-container",
        ".chat-history",
        "main .conversation-container",
        "main",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    pub content_host: String,
    pub selectors: Vec<String>,
    pub step_percent: u32,
    pub max_pages: u32,
    pub settle_delay_ms: u64,
    pub overlay_delay_ms: u64,
    pub file_stem: String,
    /// Skips the settle and overlay delays so automated runs stay fast.
    pub test_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            content_host: CONTENT_HOST.into(),
            selectors: default_selectors(),
            step_percent: STEP_PERCENT,
            max_pages: MAX_PAGES,
            settle_delay_ms: 800,
            overlay_delay_ms: 100,
            file_stem: "gemini-chat".into(),
            test_mode: false,
        }
    }
}

impl CaptureConfig {
    pub fn from_env() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path)).unwrap_or_else(|err| {
                warn!("Ignoring capture config {path}: {err:#}");
                Self::default()
            }),
            _ => Self::default(),
        };

        if env_flag(TEST_MODE_ENV) || env_flag(E2E_ENV) {
            config.test_mode = true;
        }

        config
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read capture config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid capture config in {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Config tuned for automation: no delays at all.
    pub fn for_tests() -> Self {
        Self {
            test_mode: true,
            settle_delay_ms: 0,
            overlay_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn settle_delay(&self) -> Option<Duration> {
        if self.test_mode || self.settle_delay_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.settle_delay_ms))
        }
    }

    pub fn overlay_delay(&self) -> Option<Duration> {
        if self.test_mode || self.overlay_delay_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.overlay_delay_ms))
        }
    }

    fn sanitized(mut self) -> Self {
        if self.step_percent == 0 || self.step_percent > 100 {
            warn!(
                "step_percent {} out of range, using {}",
                self.step_percent, STEP_PERCENT
            );
            self.step_percent = STEP_PERCENT;
        }
        if self.max_pages == 0 {
            warn!("max_pages must be at least 1, using {MAX_PAGES}");
            self.max_pages = MAX_PAGES;
        }
        if self.selectors.is_empty() {
            self.selectors = default_selectors();
        }
        if self.file_stem.trim().is_empty() {
            self.file_stem = Self::default().file_stem;
        }
        self
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
