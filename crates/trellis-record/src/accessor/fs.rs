//! Filesystem record store
//!
//! One Markdown document per record, discovered recursively under a root.
//! Writes land in a sibling temp file that is renamed over the original,
//! so a reader never observes a half-written record.

use super::RecordAccessor;
use crate::document::Document;
use crate::error::AccessError;
use crate::record::{FieldUpdates, RawRecord, RecordKey};
use std::path::{Path, PathBuf};

/// Record store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsAccessor {
    root: PathBuf,
    extension: String,
}

impl FsAccessor {
    /// Create store over `*.md` files under `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, "md")
    }

    /// Create store over files with a custom extension
    #[must_use]
    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Store root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a record
    #[must_use]
    pub fn path_of(&self, key: &RecordKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    fn key_for(&self, path: &Path) -> Option<RecordKey> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(RecordKey::new(segments.join("/")))
    }

    async fn read_document(&self, key: &RecordKey) -> Result<Document, AccessError> {
        let path = self.path_of(key);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AccessError::NotFound(key.clone()));
            }
            Err(e) => return Err(AccessError::io(key, e)),
        };
        Document::parse(&text).map_err(|e| AccessError::parse(key, e))
    }
}

#[async_trait::async_trait]
impl RecordAccessor for FsAccessor {
    async fn list(&self) -> Result<Vec<RecordKey>, AccessError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let dir_key = || RecordKey::new(dir.to_string_lossy().into_owned());
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| AccessError::io(dir_key(), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| AccessError::io(dir_key(), e))?
            {
                let path = entry.path();
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if hidden {
                    continue;
                }
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| AccessError::io(dir_key(), e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.matches_extension(&path) {
                    if let Some(key) = self.key_for(&path) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        tracing::debug!(root = %self.root.display(), count = keys.len(), "listed records");
        Ok(keys)
    }

    async fn read(&self, key: &RecordKey) -> Result<RawRecord, AccessError> {
        let doc = self.read_document(key).await?;
        Ok(doc.to_record(key))
    }

    async fn write(&self, key: &RecordKey, updates: &FieldUpdates) -> Result<(), AccessError> {
        let mut doc = self.read_document(key).await?;
        doc.apply(updates);
        let rendered = doc.render().map_err(|e| AccessError::parse(key, e))?;

        let path = self.path_of(key);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = path.with_file_name(format!(".{file_name}.trellis-tmp"));

        tokio::fs::write(&temp, rendered)
            .await
            .map_err(|e| AccessError::io(key, e))?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(AccessError::io(key, e));
        }

        tracing::debug!(record = %key, fields = updates.len(), "wrote record");
        Ok(())
    }
}
