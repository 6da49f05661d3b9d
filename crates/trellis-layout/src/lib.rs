//! Trellis Spatial Layout Engine
//!
//! Turns a reconciled [`Graph`](trellis_graph::Graph) into absolute rectangles
//! for a node diagram.
//!
//! # Core Concepts
//!
//! - **Lanes**: one horizontal band per workstream, stacked top to bottom
//! - **Containers**: a milestone plus everything nested under it via `parent`
//! - **Shared items**: entities owned by several milestones, centred between them
//! - **Orphans**: anything outside a container, gridded below the lanes
//!
//! Two properties hold for every output: nodes within a container keep the
//! configured gap, and containers within a lane never overlap.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_layout::prelude::*;
//!
//! let layout = LaneLayout::with_config(LayoutConfig::default());
//! let output = layout.compute(&graph);
//! for (id, rect) in &output.positions {
//!     println!("{id}: {rect}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod geometry;
pub mod lane;
pub mod output;
pub mod strategy;

// Re-exports for convenience
pub use config::{LayoutConfig, NodeSize, NodeSizes};
pub use geometry::{Rect, Side};
pub use lane::LaneLayout;
pub use output::{Container, Lane, LayoutOutput, LayoutWarning, RoutedEdge};
pub use strategy::LayoutStrategy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for computing layouts
    pub use crate::config::LayoutConfig;
    pub use crate::geometry::{Rect, Side};
    pub use crate::lane::LaneLayout;
    pub use crate::output::{LayoutOutput, LayoutWarning, RoutedEdge};
    pub use crate::strategy::LayoutStrategy;
}
