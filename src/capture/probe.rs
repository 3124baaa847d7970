use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::{ContextResolver, RenderSurface};

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_warn};

/// Scroll geometry of the content container at probe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_height: u32,
    pub scroll_top: u32,
    pub client_height: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetrics {
    scroll_height: f64,
    scroll_top: f64,
    client_height: f64,
}

impl ScrollMetrics {
    fn from_script_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let raw: RawMetrics = serde_json::from_value(value).ok()?;
        Some(Self {
            scroll_height: to_px(raw.scroll_height)?,
            scroll_top: to_px(raw.scroll_top)?,
            client_height: to_px(raw.client_height)?,
        })
    }
}

fn to_px(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= u32::MAX as f64).then(|| value.round() as u32)
}

/// JS function expression that finds the scroll container: the first selector
/// match that actually overflows, else the document's scrolling element.
pub(crate) fn container_lookup_js(selectors: &[String]) -> String {
    let selectors = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".into());
    format!(
        r#"() => {{
  const selectors = {selectors};
  const doc = document.scrollingElement || document.documentElement;
  const overflows = (el) => !!el && el.scrollHeight > el.clientHeight;
  for (const selector of selectors) {{
    let el = null;
    try {{ el = document.querySelector(selector); }} catch (_) {{ continue; }}
    if (overflows(el)) return el;
  }}
  if (overflows(doc)) return doc;
  return doc || null;
}}"#
    )
}

pub(crate) fn probe_script(selectors: &[String]) -> String {
    format!(
        r#"(() => {{
  const target = ({lookup})();
  if (!target) return null;
  return {{
    scrollHeight: target.scrollHeight,
    scrollTop: Math.round(target.scrollTop),
    clientHeight: target.clientHeight,
  }};
}})()"#,
        lookup = container_lookup_js(selectors)
    )
}

/// Reads the scroll geometry of the content frame.
///
/// `None` means "no usable content frame": not found, script failed, or the
/// surface went away. Callers fall back to a single viewport capture.
pub async fn probe(
    resolver: &ContextResolver,
    surface: &dyn RenderSurface,
    selectors: &[String],
) -> Option<ScrollMetrics> {
    let Some(frame) = resolver.resolve(surface) else {
        log_warn!("no frame on {} found to probe", resolver.host());
        return None;
    };

    let value = match frame.execute_script(&probe_script(selectors)).await {
        Ok(value) => value,
        Err(err) => {
            log_warn!("scroll probe failed in {}: {err:#}", frame.url());
            return None;
        }
    };

    let metrics = ScrollMetrics::from_script_value(value);
    log_debug!("scroll probe result: {metrics:?}");
    metrics
}
