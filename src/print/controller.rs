use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Local;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capture::{
    CaptureOrchestrator, CaptureRun, CapturedPage, ContextResolver, RenderSurface,
};
use crate::config::CaptureConfig;
use crate::errors::PrintError;
use crate::pdf::assemble;

use super::destination::{
    downloads_dir, ensure_pdf_extension, suggested_destination, write_document, SavePrompt,
};
use super::events::{notify, EventSink, Failed, PrintEvent, Saved};
use super::state::PrintState;

const ENABLE_LOGS: bool = true;
use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "path")]
pub enum PrintOutcome {
    Saved(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintStatus {
    pub busy: bool,
    pub state: Option<PrintState>,
}

struct ActiveSession {
    id: Uuid,
    state: PrintState,
    cancel: CancellationToken,
}

type Slot = Arc<Mutex<Option<ActiveSession>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<ActiveSession>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// One print run. Holding it is what "a session is active" means: dropping it
/// frees the slot, whatever path the run took.
pub struct PrintSession {
    id: Uuid,
    slot: Slot,
    state: PrintState,
    cancel: CancellationToken,
}

impl PrintSession {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn transition(&mut self, next: PrintState) {
        if !self.state.can_transition_to(next) {
            log_warn!(
                "print session {}: unexpected transition {:?} -> {:?}",
                self.id,
                self.state,
                next
            );
        }
        log_info!("print session {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;

        if let Some(active) = lock(&self.slot).as_mut().filter(|active| active.id == self.id) {
            active.state = next;
        }
    }
}

impl Drop for PrintSession {
    fn drop(&mut self) {
        let mut guard = lock(&self.slot);
        if guard.as_ref().is_some_and(|active| active.id == self.id) {
            *guard = None;
        }
    }
}

/// Owns the single-flight slot and runs print sessions against a surface.
#[derive(Clone)]
pub struct PrintController {
    slot: Slot,
    events: Arc<dyn EventSink>,
    prompt: Arc<dyn SavePrompt>,
    resolver: Arc<ContextResolver>,
    config: Arc<CaptureConfig>,
    download_dir: PathBuf,
}

impl PrintController {
    pub fn new(
        events: Arc<dyn EventSink>,
        prompt: Arc<dyn SavePrompt>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            events,
            prompt,
            resolver: Arc::new(ContextResolver::new(config.content_host.clone())),
            config: Arc::new(config),
            download_dir: downloads_dir(),
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_resolver(mut self, resolver: ContextResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.slot).is_some()
    }

    pub fn current_state(&self) -> Option<PrintState> {
        lock(&self.slot).as_ref().map(|active| active.state)
    }

    pub fn status(&self) -> PrintStatus {
        let guard = lock(&self.slot);
        PrintStatus {
            busy: guard.is_some(),
            state: guard.as_ref().map(|active| active.state),
        }
    }

    /// Asks the live session to stop at its next step. Returns whether there
    /// was one.
    pub fn cancel(&self) -> bool {
        match lock(&self.slot).as_ref() {
            Some(active) => {
                log_info!("cancel requested for print session {}", active.id);
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Captures `surface`, assembles the PDF and saves it where the user picks.
    ///
    /// Rejected with [`PrintError::Busy`] while another session is live; that
    /// session is left alone.
    pub async fn trigger(
        &self,
        surface: &dyn RenderSurface,
    ) -> Result<PrintOutcome, PrintError> {
        let mut session = self.begin()?;

        let result = self.run(&mut session, surface).await;

        match &result {
            Ok(PrintOutcome::Saved(path)) => {
                log_info!("print session {} saved {}", session.id, path.display());
                notify(
                    self.events.as_ref(),
                    PrintEvent::Success(Saved {
                        path: path.display().to_string(),
                    }),
                );
            }
            Ok(PrintOutcome::Cancelled) => {
                log_info!("print session {} cancelled", session.id);
            }
            Err(err) => {
                session.transition(PrintState::Failed);
                log_error!("print session {} failed: {err:#}", session.id);
                notify(
                    self.events.as_ref(),
                    PrintEvent::Error(Failed {
                        message: err.user_message(),
                    }),
                );
            }
        }

        result
    }

    fn begin(&self) -> Result<PrintSession, PrintError> {
        let mut guard = lock(&self.slot);
        if let Some(active) = guard.as_ref() {
            log_warn!(
                "print requested while session {} is {:?}; ignoring",
                active.id,
                active.state
            );
            return Err(PrintError::Busy);
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        *guard = Some(ActiveSession {
            id,
            state: PrintState::Idle,
            cancel: cancel.clone(),
        });
        log_info!("print session {id} started");

        Ok(PrintSession {
            id,
            slot: Arc::clone(&self.slot),
            state: PrintState::Idle,
            cancel,
        })
    }

    async fn run(
        &self,
        session: &mut PrintSession,
        surface: &dyn RenderSurface,
    ) -> Result<PrintOutcome, PrintError> {
        session.transition(PrintState::Capturing);

        let run = CaptureOrchestrator::new(&self.resolver, self.events.as_ref(), &self.config)
            .capture_full_page(surface, &session.cancel)
            .await?;

        let cancelled = run.cancelled || session.is_cancelled();
        let Some(pages) = pages_to_assemble(run, cancelled)? else {
            session.transition(PrintState::Cancelled);
            return Ok(PrintOutcome::Cancelled);
        };

        session.transition(PrintState::Assembling);
        let page_count = pages.len();
        let bytes = assemble(pages).await?;
        log_info!("assembled {page_count} pages into {} bytes", bytes.len());

        session.transition(PrintState::Saving);
        let suggested =
            suggested_destination(&self.download_dir, &self.config.file_stem, Local::now());
        let cancel = session.cancel.clone();
        let chosen = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_info!("cancelled while waiting for a save location");
                Ok(None)
            }
            chosen = self.prompt.choose_destination(&suggested) => chosen,
        };
        let chosen =
            chosen.map_err(|err| PrintError::Internal(format!("save prompt failed: {err:#}")))?;

        let Some(path) = chosen else {
            log_info!("save location prompt dismissed");
            session.transition(PrintState::Cancelled);
            return Ok(PrintOutcome::Cancelled);
        };

        let path = ensure_pdf_extension(path);
        write_document(&path, &bytes).await?;
        session.transition(PrintState::Done);

        Ok(PrintOutcome::Saved(path))
    }
}

/// Pages worth assembling, or `None` when the run was cancelled. Partial
/// captures of a cancelled run are dropped so nothing gets written.
fn pages_to_assemble(
    run: CaptureRun,
    cancelled: bool,
) -> Result<Option<Vec<CapturedPage>>, PrintError> {
    if cancelled {
        return Ok(None);
    }
    if run.pages.is_empty() {
        return Err(PrintError::EmptyCapture);
    }
    Ok(Some(run.pages))
}
