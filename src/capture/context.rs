use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::viewport::RasterImage;

/// A scriptable document: the root page or one of its frames.
#[async_trait]
pub trait ContentContext: Send + Sync {
    fn url(&self) -> String;

    /// Evaluates `script` and returns its completion value as JSON.
    async fn execute_script(&self, script: &str) -> Result<Value>;
}

/// The hosting surface: owns the frame tree and can be rasterised.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    fn main_frame(&self) -> Arc<dyn ContentContext>;

    /// Immediate child frames of the main frame.
    fn child_frames(&self) -> Vec<Arc<dyn ContentContext>>;

    async fn capture(&self) -> Result<RasterImage>;

    fn is_destroyed(&self) -> bool;
}

/// One way of locating the content frame inside a surface.
pub trait FrameStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn pick(&self, surface: &dyn RenderSurface, host: &str) -> Option<Arc<dyn ContentContext>>;
}

/// The surface itself is showing the content.
pub struct RootUrlMatch;

impl FrameStrategy for RootUrlMatch {
    fn name(&self) -> &'static str {
        "root-url"
    }

    fn pick(&self, surface: &dyn RenderSurface, host: &str) -> Option<Arc<dyn ContentContext>> {
        let root = surface.main_frame();
        host_matches(&root.url(), host).then_some(root)
    }
}

/// The content is embedded one level down, e.g. in an iframe.
pub struct ChildUrlMatch;

impl FrameStrategy for ChildUrlMatch {
    fn name(&self) -> &'static str {
        "child-url"
    }

    fn pick(&self, surface: &dyn RenderSurface, host: &str) -> Option<Arc<dyn ContentContext>> {
        surface
            .child_frames()
            .into_iter()
            .find(|frame| host_matches(&frame.url(), host))
    }
}

/// Resolves the content frame by trying each strategy in order.
///
/// Frames come and go as the page navigates, so callers resolve again before
/// every script instead of holding on to a previous result.
pub struct ContextResolver {
    host: String,
    strategies: Vec<Box<dyn FrameStrategy>>,
}

impl ContextResolver {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_strategies(host, vec![Box::new(RootUrlMatch), Box::new(ChildUrlMatch)])
    }

    pub fn with_strategies(
        host: impl Into<String>,
        strategies: Vec<Box<dyn FrameStrategy>>,
    ) -> Self {
        Self {
            host: host.into(),
            strategies,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn resolve(&self, surface: &dyn RenderSurface) -> Option<Arc<dyn ContentContext>> {
        if surface.is_destroyed() {
            return None;
        }

        self.strategies.iter().find_map(|strategy| {
            let frame = strategy.pick(surface, &self.host)?;
            log::debug!("content frame resolved via {}: {}", strategy.name(), frame.url());
            Some(frame)
        })
    }
}

/// True when the URL's host is `host` or one of its subdomains.
pub fn host_matches(url: &str, host: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    let url_host = authority.split(':').next().unwrap_or_default().to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    !url_host.is_empty()
        && (url_host == host
            || url_host
                .strip_suffix(host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame(&'static str);

    #[async_trait]
    impl ContentContext for Frame {
        fn url(&self) -> String {
            self.0.to_string()
        }

        async fn execute_script(&self, _script: &str) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    struct Surface {
        root: &'static str,
        children: Vec<&'static str>,
        destroyed: bool,
    }

    #[async_trait]
    impl RenderSurface for Surface {
        fn main_frame(&self) -> Arc<dyn ContentContext> {
            Arc::new(Frame(self.root))
        }

        fn child_frames(&self) -> Vec<Arc<dyn ContentContext>> {
            self.children
                .iter()
                .map(|url| Arc::new(Frame(*url)) as Arc<dyn ContentContext>)
                .collect()
        }

        async fn capture(&self) -> Result<RasterImage> {
            anyhow::bail!("not used")
        }

        fn is_destroyed(&self) -> bool {
            self.destroyed
        }
    }

    #[test]
    fn host_match_rules() {
        assert!(host_matches("https://gemini.google.com/app/123", "gemini.google.com"));
        assert!(host_matches("https://GEMINI.google.com:443", "gemini.google.com"));
        assert!(host_matches("https://eu.gemini.google.com/", "gemini.google.com"));
        assert!(!host_matches("https://notgemini.google.com/", "gemini.google.com"));
        assert!(!host_matches("https://example.com/?next=gemini.google.com", "gemini.google.com"));
        assert!(!host_matches("about:blank", "gemini.google.com"));
        assert!(!host_matches("tauri://localhost/index.html", "gemini.google.com"));
    }

    #[test]
    fn root_wins_over_children() {
        let surface = Surface {
            root: "https://gemini.google.com/app",
            children: vec!["https://gemini.google.com/embed"],
            destroyed: false,
        };
        let frame = ContextResolver::new(CONTENT_HOST_FOR_TESTS).resolve(&surface).unwrap();
        assert_eq!(frame.url(), "https://gemini.google.com/app");
    }

    #[test]
    fn falls_back_to_matching_child() {
        let surface = Surface {
            root: "tauri://localhost/index.html",
            children: vec!["https://accounts.google.com/", "https://gemini.google.com/app"],
            destroyed: false,
        };
        let frame = ContextResolver::new(CONTENT_HOST_FOR_TESTS).resolve(&surface).unwrap();
        assert_eq!(frame.url(), "https://gemini.google.com/app");
    }

    #[test]
    fn no_match_and_destroyed_resolve_to_none() {
        let unrelated = Surface {
            root: "tauri://localhost/index.html",
            children: vec!["https://accounts.google.com/"],
            destroyed: false,
        };
        assert!(ContextResolver::new(CONTENT_HOST_FOR_TESTS).resolve(&unrelated).is_none());

        let destroyed = Surface {
            root: "https://gemini.google.com/app",
            children: vec![],
            destroyed: true,
        };
        assert!(ContextResolver::new(CONTENT_HOST_FOR_TESTS).resolve(&destroyed).is_none());
    }

    #[test]
    fn strategy_list_is_replaceable() {
        let surface = Surface {
            root: "https://gemini.google.com/app",
            children: vec![],
            destroyed: false,
        };
        let resolver =
            ContextResolver::with_strategies(CONTENT_HOST_FOR_TESTS, vec![Box::new(ChildUrlMatch)]);
        assert!(resolver.resolve(&surface).is_none());
    }

    const CONTENT_HOST_FOR_TESTS: &str = "gemini.google.com";
}
