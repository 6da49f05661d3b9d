//! Trellis Core - batch operations over a project-tracking record store
//!
//! Ties the record layer, the relationship engine and the layout engine
//! together:
//! - Serializes batches through a [`BatchGate`] and journals their writes
//! - Runs reconcile passes and writes one patch per touched record
//! - Computes the layout and hands it to a [`DiagramMaterializer`]
//! - Reports every batch as a [`BatchSummary`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trellis_core::prelude::*;
//!
//! # async fn example() -> Result<(), TrellisError> {
//! let config = TrellisConfig::load_or_default("trellis.toml".as_ref())?;
//! let runner = BatchRunner::new(
//!     Arc::new(FsAccessor::new(&config.root)),
//!     Arc::new(CanvasMaterializer::new(config.canvas_path()).with_root(&config.root)),
//!     &config,
//! );
//!
//! let summary = runner.sync().await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod batch;
pub mod config;
pub mod error;
pub mod materializer;
pub mod runner;
pub mod summary;

// Re-exports for convenience
pub use batch::{BatchGate, BatchKind, BatchToken};
pub use config::{TrellisConfig, CONFIG_FILE};
pub use error::TrellisError;
pub use materializer::{CanvasMaterializer, Diagram, DiagramMaterializer, DiagramNode};
pub use runner::BatchRunner;
pub use summary::{BatchSummary, WriteFailure};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running Trellis batches
    pub use crate::{
        BatchGate, BatchKind, BatchRunner, BatchSummary, CanvasMaterializer, DiagramMaterializer,
        TrellisConfig, TrellisError,
    };
    pub use trellis_record::{FsAccessor, MemoryAccessor, RecordAccessor};
}
