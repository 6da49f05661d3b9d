//! Trellis Record Layer
//!
//! The boundary between the external record store (one document per entity)
//! and the relationship engine.
//!
//! # Core Operations
//!
//! - **Read**: decode a document's front matter into typed [`FieldValue`]s
//! - **Write**: merge [`FieldUpdates`] into the front matter and re-encode it
//! - **List**: enumerate record keys in a deterministic order
//!
//! # Architecture
//!
//! ```text
//! Store (files / memory) → Document (YAML front matter + body) → RawRecord
//!                ↑                                                  │
//!                └────────────── FieldUpdates ◄─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_record::{FsAccessor, RecordAccessor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FsAccessor::new("./project");
//! for key in store.list().await? {
//!     let record = store.read(&key).await?;
//!     println!("{} -> {:?}", key, record.scalar("id"));
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod accessor;
pub mod document;
pub mod error;
pub mod field;
pub mod record;

// Re-exports for convenience
pub use accessor::{FsAccessor, MemoryAccessor, RecordAccessor};
pub use document::Document;
pub use error::{AccessError, ParseError};
pub use field::FieldValue;
pub use record::{FieldUpdate, FieldUpdates, RawRecord, RecordKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the record layer
    pub use crate::accessor::{FsAccessor, MemoryAccessor, RecordAccessor};
    pub use crate::error::{AccessError, ParseError};
    pub use crate::field::FieldValue;
    pub use crate::record::{FieldUpdate, FieldUpdates, RawRecord, RecordKey};
}
