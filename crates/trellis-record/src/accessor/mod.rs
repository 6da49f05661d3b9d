//! Record accessors
//!
//! The [`RecordAccessor`] trait is the only way the engine touches stored
//! records. Two implementations ship with the crate:
//! - [`FsAccessor`]: Markdown files with YAML front matter under a root directory
//! - [`MemoryAccessor`]: the same documents held in memory

use crate::error::AccessError;
use crate::record::{FieldUpdates, RawRecord, RecordKey};

mod fs;
mod memory;

pub use fs::FsAccessor;
pub use memory::MemoryAccessor;

/// Read/write access to the external record store
///
/// Implementations must make a single `write` atomic for its record. No
/// atomicity is expected across records.
#[async_trait::async_trait]
pub trait RecordAccessor: Send + Sync {
    /// All record keys, sorted
    async fn list(&self) -> Result<Vec<RecordKey>, AccessError>;

    /// Read and decode one record
    async fn read(&self, key: &RecordKey) -> Result<RawRecord, AccessError>;

    /// Apply field updates to one record in a single write
    async fn write(&self, key: &RecordKey, updates: &FieldUpdates) -> Result<(), AccessError>;
}
