//! Text extraction from library attachments.

use std::path::{Path, PathBuf};

use crate::constants::paths;
use crate::error::PaperError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file attached to a library item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Host item key; also the name of the attachment's storage directory.
    pub key: String,
    pub path: PathBuf,
    pub content_type: String,
    pub title: Option<String>,
}

impl Attachment {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            content_type: content_type.into(),
            title: None,
        }
    }

    /// Describe a file on disk, guessing its content type from the extension.
    /// The key defaults to the name of the containing directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let key = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = guess_content_type(&path).to_string();
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        Self {
            key,
            path,
            content_type,
            title,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE
    }

    pub fn is_text(&self) -> bool {
        self.content_type.starts_with("text/")
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => PDF_CONTENT_TYPE,
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "txt" | "text" | "tex" | "bib" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Yields the raw text of an attachment.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, attachment: &Attachment) -> Result<String, PaperError>;
}

/// Reads text attachments straight from disk.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

#[async_trait::async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<String, PaperError> {
        read_text(&attachment.path).await
    }
}

/// Reads the host's full-text index for a PDF attachment
/// (`<storage>/<key>/.zotero-ft-cache`).
#[derive(Debug, Clone)]
pub struct FulltextCacheExtractor {
    storage_dir: PathBuf,
}

impl FulltextCacheExtractor {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    pub fn cache_path(&self, attachment: &Attachment) -> PathBuf {
        self.storage_dir
            .join(&attachment.key)
            .join(paths::FULLTEXT_CACHE_FILE)
    }
}

#[async_trait::async_trait]
impl TextExtractor for FulltextCacheExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<String, PaperError> {
        if attachment.key.is_empty() {
            return Err(PaperError::no_text());
        }
        read_text(&self.cache_path(attachment)).await
    }
}

/// Picks the extractor matching the attachment's content type.
#[derive(Debug, Clone)]
pub struct AttachmentExtractor {
    fulltext: FulltextCacheExtractor,
    plain: PlainTextExtractor,
}

impl AttachmentExtractor {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            fulltext: FulltextCacheExtractor::new(storage_dir),
            plain: PlainTextExtractor,
        }
    }
}

#[async_trait::async_trait]
impl TextExtractor for AttachmentExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<String, PaperError> {
        if attachment.is_pdf() {
            self.fulltext.extract(attachment).await
        } else if attachment.is_text() {
            self.plain.extract(attachment).await
        } else {
            Err(PaperError::Extraction(format!(
                "unsupported attachment type {}",
                attachment.content_type
            )))
        }
    }
}

async fn read_text(path: &Path) -> Result<String, PaperError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No text source at {}", path.display());
            return Err(PaperError::no_text());
        }
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();
    if text.trim().is_empty() {
        return Err(PaperError::no_text());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_from_path() {
        let attachment = Attachment::from_path("/home/u/Zotero/storage/ABCD1234/Paper.PDF");
        assert_eq!(attachment.key, "ABCD1234");
        assert_eq!(attachment.content_type, PDF_CONTENT_TYPE);
        assert_eq!(attachment.title.as_deref(), Some("Paper"));
        assert!(attachment.is_pdf());
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(guess_content_type(Path::new("notes.md")), "text/markdown");
        assert_eq!(guess_content_type(Path::new("a.txt")), "text/plain");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
