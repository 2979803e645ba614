//! Note creation in the host library.

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::PaperError;

/// Where a new note is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteTarget {
    /// Standalone note at the library root.
    Library,
    /// Child note of the item with this key.
    ParentItem(String),
    /// Standalone note filed into the collection with this key.
    Collection(String),
}

/// A created note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRef {
    pub id: String,
    pub location: String,
}

#[async_trait::async_trait]
pub trait NoteStore: Send + Sync {
    async fn create_note(
        &self,
        html: &str,
        library_id: u64,
        target: &NoteTarget,
    ) -> Result<NoteRef, PaperError>;
}

/// Writes each note as an HTML file:
/// `<dir>/<library>/{library | items/<key> | collections/<key>}/<id>.html`.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    base_dir: PathBuf,
}

impl FsNoteStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn target_dir(&self, library_id: u64, target: &NoteTarget) -> Result<PathBuf, PaperError> {
        let library_dir = self.base_dir.join(library_id.to_string());
        Ok(match target {
            NoteTarget::Library => library_dir.join("library"),
            NoteTarget::ParentItem(key) => library_dir.join("items").join(checked_key(key)?),
            NoteTarget::Collection(key) => {
                library_dir.join("collections").join(checked_key(key)?)
            }
        })
    }
}

fn checked_key(key: &str) -> Result<&str, PaperError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(key)
    } else {
        Err(PaperError::Other(format!("Invalid item key: {:?}", key)))
    }
}

/// Wrap rendered HTML the way the host stores note bodies.
pub fn note_body(html: &str) -> String {
    format!("<div data-schema-version=\"9\">{}</div>\n", html.trim_end())
}

#[async_trait::async_trait]
impl NoteStore for FsNoteStore {
    async fn create_note(
        &self,
        html: &str,
        library_id: u64,
        target: &NoteTarget,
    ) -> Result<NoteRef, PaperError> {
        let dir = self.target_dir(library_id, target)?;
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PaperError::Other(format!("Failed to create note directory {}: {}", dir.display(), e))
        })?;

        let id = Uuid::new_v4().to_string();
        let path = dir.join(format!("{}.html", id));
        let tmp_path = path.with_extension("html.tmp");
        tokio::fs::write(&tmp_path, note_body(html)).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        tracing::info!("Created note {} at {}", id, path.display());
        Ok(NoteRef {
            id,
            location: path.display().to_string(),
        })
    }
}
