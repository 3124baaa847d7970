#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use scrollprint_lib::capture::{ContentContext, RasterImage, RenderSurface};
use scrollprint_lib::print::{EventSink, PrintEvent, SavePrompt};

pub const CONTENT_URL: &str = "https://gemini.google.com/app/6f1c";
/// Where the conversation lives after the page swaps its frame.
pub const MOVED_CONTENT_URL: &str = "https://gemini.google.com/app/9d2e";
pub const SHELL_URL: &str = "tauri://localhost/index.html";
pub const CAPTURE_WIDTH: u32 = 8;

type Hook = Box<dyn FnMut(u32) + Send>;

/// Scrollable page state shared by the fake frame and surface.
pub struct Page {
    pub scroll_height: u32,
    pub client_height: u32,
    pub scroll_top: u32,
    pub scroll_log: Vec<u32>,
    pub scripts_run: usize,
    pub captures: u32,
    pub fail_capture_at: Option<u32>,
    pub destroy_at_capture: Option<u32>,
    pub destroyed: bool,
    pub probe_error: bool,
    /// Child frame URLs once the first script has run.
    pub swapped_frames: Option<Vec<String>>,
    /// Every frame URL a script ran in, in order.
    pub script_urls: Vec<String>,
    /// A capture is parked on the gate.
    pub holding: bool,
}

#[derive(Clone)]
pub struct FakeSurface {
    pub page: Arc<Mutex<Page>>,
    root_url: String,
    child_urls: Vec<String>,
    on_capture: Arc<Mutex<Option<Hook>>>,
    capture_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl FakeSurface {
    /// Surface whose own document is the scrollable content.
    pub fn content(scroll_height: u32, client_height: u32, scroll_top: u32) -> Self {
        Self::build(CONTENT_URL, Vec::new(), scroll_height, client_height, scroll_top)
    }

    /// App shell embedding the content in a child frame.
    pub fn embedded(scroll_height: u32, client_height: u32, scroll_top: u32) -> Self {
        Self::build(
            SHELL_URL,
            vec!["https://accounts.google.com/".into(), CONTENT_URL.into()],
            scroll_height,
            client_height,
            scroll_top,
        )
    }

    /// No frame on the content host anywhere.
    pub fn unrelated(client_height: u32) -> Self {
        Self::build(
            SHELL_URL,
            vec!["https://example.com/".into()],
            client_height * 4,
            client_height,
            0,
        )
    }

    fn build(
        root: &str,
        children: Vec<String>,
        scroll_height: u32,
        client_height: u32,
        scroll_top: u32,
    ) -> Self {
        Self {
            page: Arc::new(Mutex::new(Page {
                scroll_height,
                client_height,
                scroll_top,
                scroll_log: Vec::new(),
                scripts_run: 0,
                captures: 0,
                fail_capture_at: None,
                destroy_at_capture: None,
                destroyed: false,
                probe_error: false,
                swapped_frames: None,
                script_urls: Vec::new(),
                holding: false,
            })),
            root_url: root.to_string(),
            child_urls: children,
            on_capture: Arc::new(Mutex::new(None)),
            capture_gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Parks the next capture until `gate` is notified.
    pub fn hold_next_capture(&self, gate: Arc<Notify>) {
        *self.capture_gate.lock().unwrap() = Some(gate);
    }

    pub fn is_holding(&self) -> bool {
        self.page.lock().unwrap().holding
    }

    pub fn script_urls(&self) -> Vec<String> {
        self.page.lock().unwrap().script_urls.clone()
    }

    /// Runs after each successful capture with the number of captures so far.
    pub fn on_capture(&self, hook: impl FnMut(u32) + Send + 'static) {
        *self.on_capture.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn captures(&self) -> u32 {
        self.page.lock().unwrap().captures
    }

    pub fn scroll_top(&self) -> u32 {
        self.page.lock().unwrap().scroll_top
    }

    pub fn scroll_log(&self) -> Vec<u32> {
        self.page.lock().unwrap().scroll_log.clone()
    }

    pub fn scripts_run(&self) -> usize {
        self.page.lock().unwrap().scripts_run
    }

    fn frame(&self, url: &str) -> Arc<dyn ContentContext> {
        Arc::new(FakeFrame {
            url: url.to_string(),
            page: Arc::clone(&self.page),
            is_content: url.starts_with("https://gemini.google.com/"),
        })
    }
}

struct FakeFrame {
    url: String,
    page: Arc<Mutex<Page>>,
    is_content: bool,
}

fn requested_offset(script: &str) -> Option<u32> {
    let rest = script.split("top: ").nth(1)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[async_trait]
impl ContentContext for FakeFrame {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let mut page = self.page.lock().unwrap();
        if page.destroyed {
            bail!("frame detached");
        }
        page.scripts_run += 1;
        page.script_urls.push(self.url.clone());
        if !self.is_content {
            return Ok(Value::Null);
        }

        if script.contains("scrollTo(") {
            let Some(offset) = requested_offset(script) else {
                bail!("unparseable scroll script");
            };
            let max = page.scroll_height.saturating_sub(page.client_height);
            page.scroll_top = offset.min(max);
            page.scroll_log.push(offset);
            return Ok(Value::Bool(true));
        }

        if page.probe_error {
            bail!("Execution context was destroyed");
        }
        Ok(json!({
            "scrollHeight": page.scroll_height,
            "scrollTop": page.scroll_top,
            "clientHeight": page.client_height,
        }))
    }
}

fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, 255 - shade, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[async_trait]
impl RenderSurface for FakeSurface {
    fn main_frame(&self) -> Arc<dyn ContentContext> {
        self.frame(&self.root_url)
    }

    fn child_frames(&self) -> Vec<Arc<dyn ContentContext>> {
        let urls = {
            let page = self.page.lock().unwrap();
            match &page.swapped_frames {
                Some(urls) if page.scripts_run > 0 => urls.clone(),
                _ => self.child_urls.clone(),
            }
        };
        urls.iter().map(|url| self.frame(url)).collect()
    }

    async fn capture(&self) -> Result<RasterImage> {
        let gate = self.capture_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.page.lock().unwrap().holding = true;
            gate.notified().await;
            self.page.lock().unwrap().holding = false;
        }

        let (count, bytes) = {
            let mut page = self.page.lock().unwrap();
            if page.destroyed {
                bail!("surface destroyed");
            }
            let next = page.captures + 1;
            if page.destroy_at_capture == Some(next) {
                page.destroyed = true;
                bail!("surface destroyed during capture");
            }
            if page.fail_capture_at == Some(next) {
                bail!("capturePage rejected: GPU process crashed");
            }
            page.captures = next;
            let shade = (page.scroll_top % 251) as u8;
            (next, png(CAPTURE_WIDTH, page.client_height, shade))
        };

        if let Some(hook) = self.on_capture.lock().unwrap().as_mut() {
            hook(count);
        }

        RasterImage::from_encoded(bytes)
    }

    fn is_destroyed(&self) -> bool {
        self.page.lock().unwrap().destroyed
    }
}

/// Records every event it is handed.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PrintEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PrintEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(PrintEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }
}

impl EventSink for RecordingSink {
    fn is_destroyed(&self) -> bool {
        false
    }

    fn emit(&self, event: &PrintEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub enum Answer {
    Accept,
    Override(PathBuf),
    Dismiss,
}

/// Save prompt with a canned answer, optionally held until released.
pub struct ScriptedPrompt {
    answer: Answer,
    gate: Option<Arc<Notify>>,
    pub asked: AtomicUsize,
    pub suggested: Mutex<Option<PathBuf>>,
}

impl ScriptedPrompt {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer,
            gate: None,
            asked: AtomicUsize::new(0),
            suggested: Mutex::new(None),
        }
    }

    pub fn gated(answer: Answer, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(answer)
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SavePrompt for ScriptedPrompt {
    async fn choose_destination(&self, suggested: &Path) -> Result<Option<PathBuf>> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        *self.suggested.lock().unwrap() = Some(suggested.to_path_buf());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(match &self.answer {
            Answer::Accept => Some(suggested.to_path_buf()),
            Answer::Override(path) => Some(path.clone()),
            Answer::Dismiss => None,
        })
    }
}

pub fn page_sizes(pdf: &[u8]) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_object(*id).unwrap().as_dict().unwrap();
            let media = page.get(b"MediaBox").unwrap().as_array().unwrap();
            (media[2].as_i64().unwrap(), media[3].as_i64().unwrap())
        })
        .collect()
}

pub fn pdf_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    files.sort();
    files
}
