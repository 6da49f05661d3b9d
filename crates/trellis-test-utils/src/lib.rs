//! Testing utilities for the Trellis workspace
//!
//! Shared test helpers, fixtures, and collaborator doubles.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use trellis_core::{Diagram, DiagramMaterializer, TrellisError};
use trellis_record::{AccessError, FieldUpdates, MemoryAccessor, RawRecord, RecordAccessor, RecordKey};

/// Front-matter document for an entity, `fields` as raw YAML lines
pub fn entity_doc(id: &str, fields: &[&str]) -> String {
    let mut text = format!("---\nid: {id}\n");
    for field in fields {
        text.push_str(field);
        text.push('\n');
    }
    text.push_str("---\n");
    text
}

/// Memory store holding `(key, text)` documents
pub fn store(documents: &[(&str, &str)]) -> MemoryAccessor {
    documents
        .iter()
        .fold(MemoryAccessor::new(), |store, (key, text)| {
            store.with_document(*key, *text)
        })
}

/// Memory store with one `<id>.md` document per `(id, fields)` entry
pub fn entity_store(entities: &[(&str, &[&str])]) -> MemoryAccessor {
    entities
        .iter()
        .fold(MemoryAccessor::new(), |store, (id, fields)| {
            store.with_document(format!("{id}.md"), entity_doc(id, fields))
        })
}

/// Field items of a stored document, after re-reading it
pub async fn stored_items(store: &MemoryAccessor, key: &str, field: &str) -> Vec<String> {
    let record: RawRecord = match store.read(&RecordKey::new(key)).await {
        Ok(record) => record,
        Err(e) => panic!("reading {key}: {e}"),
    };
    record.items(field).into_iter().map(str::to_string).collect()
}

/// Accessor that fails writes (or all access) for chosen keys
#[derive(Debug, Default)]
pub struct FailingAccessor {
    inner: MemoryAccessor,
    fail_writes: BTreeSet<RecordKey>,
    unavailable: bool,
    writes: Mutex<Vec<RecordKey>>,
}

impl FailingAccessor {
    pub fn new(inner: MemoryAccessor) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Writes to `key` fail with an IO error
    #[must_use]
    pub fn failing_writes(mut self, key: &str) -> Self {
        self.fail_writes.insert(RecordKey::new(key));
        self
    }

    /// Listing fails, which aborts any batch
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Keys of attempted writes, in order
    pub fn attempted_writes(&self) -> Vec<RecordKey> {
        self.writes.lock().clone()
    }

    pub fn inner(&self) -> &MemoryAccessor {
        &self.inner
    }
}

#[async_trait]
impl RecordAccessor for FailingAccessor {
    async fn list(&self) -> Result<Vec<RecordKey>, AccessError> {
        if self.unavailable {
            return Err(AccessError::Unavailable("store offline".into()));
        }
        self.inner.list().await
    }

    async fn read(&self, key: &RecordKey) -> Result<RawRecord, AccessError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &RecordKey, updates: &FieldUpdates) -> Result<(), AccessError> {
        self.writes.lock().push(key.clone());
        if self.fail_writes.contains(key) {
            return Err(AccessError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        self.inner.write(key, updates).await
    }
}

/// Materializer that keeps every diagram it receives
#[derive(Debug, Default)]
pub struct RecordingMaterializer {
    diagrams: Mutex<Vec<Diagram>>,
    fail: bool,
}

impl RecordingMaterializer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Materializer whose every apply fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn diagrams(&self) -> Vec<Diagram> {
        self.diagrams.lock().clone()
    }

    /// Most recent diagram
    pub fn last(&self) -> Option<Diagram> {
        self.diagrams.lock().last().cloned()
    }
}

#[async_trait]
impl DiagramMaterializer for RecordingMaterializer {
    fn watch_key(&self) -> Option<String> {
        Some("recorded.canvas".to_string())
    }

    async fn apply(&self, diagram: &Diagram) -> Result<(), TrellisError> {
        if self.fail {
            return Err(TrellisError::materialize("canvas locked"));
        }
        self.diagrams.lock().push(diagram.clone());
        Ok(())
    }
}
