use thiserror::Error;

/// Failure kinds a print session can end with.
///
/// A missing scroll container is not represented here: the probe recovers from
/// it locally by falling back to a single viewport capture.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("a print session is already in progress")]
    Busy,
    #[error("viewport capture failed: {0:#}")]
    CaptureFailure(anyhow::Error),
    #[error("no pages were captured")]
    EmptyCapture,
    #[error("PDF assembly failed: {0:#}")]
    AssemblyFailure(anyhow::Error),
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrintError {
    /// Text that is safe to show to the user. Never carries the underlying
    /// error chain or filesystem internals.
    pub fn user_message(&self) -> String {
        match self {
            PrintError::Busy => "A print is already in progress.".into(),
            PrintError::CaptureFailure(_) => "Could not capture the page.".into(),
            PrintError::EmptyCapture => "Nothing was captured to print.".into(),
            PrintError::AssemblyFailure(_) => "Could not create the PDF document.".into(),
            PrintError::WriteFailure { .. } => "Could not save the PDF file.".into(),
            PrintError::Internal(_) => "Printing failed unexpectedly.".into(),
        }
    }
}

// Commands hand errors straight back to the frontend as strings
impl serde::Serialize for PrintError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
