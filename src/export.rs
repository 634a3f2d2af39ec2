//! Export and share side effects.
//!
//! All platform capabilities (writing downloads, native share targets, the
//! clipboard) sit behind the `Platform` trait so the effect code is testable
//! and the controller never touches the filesystem directly.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use url::Url;

use crate::error::ExportError;
use crate::records::ExplanationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
}

/// Host capabilities for export/share effects.
pub trait Platform: Send + Sync {
    /// Persist an artifact under the given filename; returns where it landed.
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<String, ExportError>;

    fn can_share(&self) -> bool;

    fn share(&self, url: &str, title: &str) -> Result<(), ExportError>;

    fn copy_to_clipboard(&self, text: &str) -> Result<(), ExportError>;
}

/// Serialize the record in the requested format and hand it to the platform.
/// Only JSON is produced today; the other formats surface a recoverable
/// not-available error rather than a panic.
pub fn export_as(
    record: &ExplanationRecord,
    format: ExportFormat,
    platform: &dyn Platform,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => {
            let filename = format!("explanation_{}.json", record.explanation_id);
            let bytes = serde_json::to_vec_pretty(record)?;
            platform.download(&filename, &bytes)
        }
        ExportFormat::Pdf => Err(ExportError::NotAvailable("pdf")),
        ExportFormat::Csv => Err(ExportError::NotAvailable("csv")),
    }
}

/// Canonical shareable link for an explanation.
pub fn share_url(share_base: &str, explanation_id: &str) -> Result<String, ExportError> {
    let mut url = Url::parse(share_base).map_err(|e| ExportError::Share(e.to_string()))?;
    url.set_path("explanation");
    url.query_pairs_mut()
        .append_pair("explanationId", explanation_id);
    Ok(url.to_string())
}

/// Share through the platform when it can, otherwise copy the link to the
/// clipboard. A native share failure also falls back to the clipboard.
pub fn share_explanation(
    explanation_id: &str,
    share_base: &str,
    platform: &dyn Platform,
) -> Result<ShareOutcome, ExportError> {
    let url = share_url(share_base, explanation_id)?;
    if platform.can_share() {
        match platform.share(&url, "Cognitive Health Explanation") {
            Ok(()) => return Ok(ShareOutcome::Shared),
            Err(_) => {}
        }
    }
    platform.copy_to_clipboard(&url)?;
    Ok(ShareOutcome::CopiedToClipboard)
}

/// Platform backed by a local directory. No native share target; the
/// clipboard is an in-process value.
pub struct DiskPlatform {
    dir: PathBuf,
    clipboard: Mutex<Option<String>>,
}

impl DiskPlatform {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clipboard: Mutex::new(None),
        }
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.lock().ok().and_then(|c| c.clone())
    }
}

impl Platform for DiskPlatform {
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<String, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn can_share(&self) -> bool {
        false
    }

    fn share(&self, _url: &str, _title: &str) -> Result<(), ExportError> {
        Err(ExportError::Share("no native share target".to_string()))
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<(), ExportError> {
        match self.clipboard.lock() {
            Ok(mut slot) => {
                *slot = Some(text.to_string());
                Ok(())
            }
            Err(_) => Err(ExportError::ClipboardUnavailable),
        }
    }
}

/// In-memory platform for tests: records every interaction.
#[derive(Default)]
pub struct MemoryPlatform {
    pub share_available: bool,
    pub share_fails: bool,
    pub downloads: Mutex<Vec<(String, Vec<u8>)>>,
    pub shares: Mutex<Vec<String>>,
    pub clipboard: Mutex<Option<String>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_share() -> Self {
        Self {
            share_available: true,
            ..Self::default()
        }
    }
}

impl Platform for MemoryPlatform {
    fn download(&self, filename: &str, bytes: &[u8]) -> Result<String, ExportError> {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push((filename.to_string(), bytes.to_vec()));
        }
        Ok(filename.to_string())
    }

    fn can_share(&self) -> bool {
        self.share_available
    }

    fn share(&self, url: &str, _title: &str) -> Result<(), ExportError> {
        if self.share_fails {
            return Err(ExportError::Share("share dismissed".to_string()));
        }
        if let Ok(mut shares) = self.shares.lock() {
            shares.push(url.to_string());
        }
        Ok(())
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<(), ExportError> {
        match self.clipboard.lock() {
            Ok(mut slot) => {
                *slot = Some(text.to_string());
                Ok(())
            }
            Err(_) => Err(ExportError::ClipboardUnavailable),
        }
    }
}
