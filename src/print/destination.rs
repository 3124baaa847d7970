use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::warn;

use crate::errors::PrintError;

/// Asks the user where the PDF should go.
#[async_trait]
pub trait SavePrompt: Send + Sync {
    /// `Ok(None)` means the user backed out.
    async fn choose_destination(&self, suggested: &Path) -> Result<Option<PathBuf>>;
}

pub fn downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_file_name(stem: &str, now: DateTime<Local>) -> String {
    format!("{stem}-{}.pdf", now.format("%Y-%m-%d"))
}

/// First of `name.ext`, `name-1.ext`, `name-2.ext`, … that does not exist in `dir`.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}{extension}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

pub fn suggested_destination(dir: &Path, stem: &str, now: DateTime<Local>) -> PathBuf {
    unique_path(dir, &default_file_name(stem, now))
}

pub fn ensure_pdf_extension(path: PathBuf) -> PathBuf {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        path
    } else {
        let mut os = path.into_os_string();
        os.push(".pdf");
        PathBuf::from(os)
    }
}

/// Writes through a sibling temp file so an interrupted write never leaves a
/// truncated PDF under the final name.
pub async fn write_document(path: &Path, bytes: &[u8]) -> Result<(), PrintError> {
    let write_failure = |source| PrintError::WriteFailure {
        path: path.display().to_string(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".into());
    let partial = path.with_file_name(format!(".{file_name}.part"));

    if let Err(err) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(write_failure(err));
    }

    if let Err(err) = tokio::fs::rename(&partial, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            warn!("failed to remove {}: {cleanup}", partial.display());
        }
        return Err(write_failure(err));
    }

    Ok(())
}
