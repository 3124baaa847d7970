use serde_json::Value;

use crate::config::CaptureConfig;

use super::context::{ContextResolver, RenderSurface};
use super::probe::container_lookup_js;

const ENABLE_LOGS: bool = true;
use crate::{log_debug, log_warn};

pub(crate) fn scroll_script(selectors: &[String], position: u32) -> String {
    format!(
        r#"(() => {{
  const target = ({lookup})();
  if (!target) return false;
  target.scrollTo({{ top: {position}, behavior: "instant" }});
  return true;
}})()"#,
        lookup = container_lookup_js(selectors)
    )
}

/// Jumps the content container to `position` and waits for lazy content.
///
/// The frame is resolved again on every call. Returns `false` when no frame or
/// container could be scrolled; the caller keeps capturing from wherever the
/// view currently is.
pub async fn scroll_to(
    resolver: &ContextResolver,
    surface: &dyn RenderSurface,
    config: &CaptureConfig,
    position: u32,
) -> bool {
    let Some(frame) = resolver.resolve(surface) else {
        log_warn!("no frame to scroll to {position}");
        return false;
    };

    let scrolled = match frame
        .execute_script(&scroll_script(&config.selectors, position))
        .await
    {
        Ok(Value::Bool(found)) => found,
        Ok(other) => {
            log_warn!("unexpected scroll result {other}");
            false
        }
        Err(err) => {
            log_warn!("scroll to {position} failed: {err:#}");
            false
        }
    };

    if let Some(delay) = config.settle_delay() {
        tokio::time::sleep(delay).await;
    }

    log_debug!("scrolled to {position}: {scrolled}");
    scrolled
}
