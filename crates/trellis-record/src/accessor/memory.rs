//! In-memory record store
//!
//! Holds document text rather than decoded records so reads and writes go
//! through the same codec as the filesystem store.

use super::RecordAccessor;
use crate::document::Document;
use crate::error::AccessError;
use crate::record::{FieldUpdates, RawRecord, RecordKey};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Record store backed by a sorted in-memory map
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    documents: RwLock<BTreeMap<RecordKey, String>>,
}

impl MemoryAccessor {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With document inserted
    #[must_use]
    pub fn with_document(self, key: impl Into<RecordKey>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    /// Insert or replace document text
    pub fn insert(&self, key: impl Into<RecordKey>, text: impl Into<String>) {
        self.documents.write().insert(key.into(), text.into());
    }

    /// Current document text
    #[must_use]
    pub fn document(&self, key: &RecordKey) -> Option<String> {
        self.documents.read().get(key).cloned()
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// True when no documents are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait::async_trait]
impl RecordAccessor for MemoryAccessor {
    async fn list(&self) -> Result<Vec<RecordKey>, AccessError> {
        Ok(self.documents.read().keys().cloned().collect())
    }

    async fn read(&self, key: &RecordKey) -> Result<RawRecord, AccessError> {
        let text = self
            .document(key)
            .ok_or_else(|| AccessError::NotFound(key.clone()))?;
        let doc = Document::parse(&text).map_err(|e| AccessError::parse(key, e))?;
        Ok(doc.to_record(key))
    }

    async fn write(&self, key: &RecordKey, updates: &FieldUpdates) -> Result<(), AccessError> {
        let mut documents = self.documents.write();
        let text = documents
            .get(key)
            .ok_or_else(|| AccessError::NotFound(key.clone()))?;
        let mut doc = Document::parse(text).map_err(|e| AccessError::parse(key, e))?;
        doc.apply(updates);
        let rendered = doc.render().map_err(|e| AccessError::parse(key, e))?;
        documents.insert(key.clone(), rendered);
        Ok(())
    }
}
