//! Raw records as seen by the engine
//!
//! A [`RawRecord`] is the decoded front matter of one backing document,
//! addressed by its [`RecordKey`]. Updates travel back as [`FieldUpdates`].

use crate::field::FieldValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path-like key of a backing document, `/`-separated and store-relative
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Create key, normalizing path separators
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().replace('\\', "/"))
    }

    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment without its extension
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&RecordKey> for RecordKey {
    fn from(value: &RecordKey) -> Self {
        value.clone()
    }
}

/// A single field edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Replace (or create) the field
    Set(FieldValue),
    /// Delete the field
    Remove,
}

/// Ordered set of edits applied to one record in a single write
pub type FieldUpdates = IndexMap<String, FieldUpdate>;

/// Decoded front matter of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Where the record lives
    pub key: RecordKey,
    /// Field values in document order
    pub fields: IndexMap<String, FieldValue>,
    /// Display title (`title` field or first level-1 heading)
    pub title: Option<String>,
}

impl RawRecord {
    /// Create empty record
    #[must_use]
    pub fn new(key: impl Into<RecordKey>) -> Self {
        Self {
            key: key.into(),
            fields: IndexMap::new(),
            title: None,
        }
    }

    /// With field set
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// With title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Field value by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// First item of a field
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::first)
    }

    /// All items of a field (empty when absent)
    #[must_use]
    pub fn items(&self, name: &str) -> Vec<&str> {
        self.get(name).map(FieldValue::items).unwrap_or_default()
    }

    /// Apply edits in place, as a store would on write
    pub fn apply(&mut self, updates: &FieldUpdates) {
        for (name, update) in updates {
            match update {
                FieldUpdate::Set(value) => {
                    self.fields.insert(name.clone(), value.clone());
                }
                FieldUpdate::Remove => {
                    self.fields.shift_remove(name);
                }
            }
        }
    }
}
