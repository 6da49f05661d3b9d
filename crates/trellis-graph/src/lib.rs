//! Trellis Relationship Graph
//!
//! Builds the entity relationship graph from decoded records and keeps it
//! logically consistent.
//!
//! # Core Operations
//!
//! - **Build**: [`GraphBuilder`] turns [`RawRecord`](trellis_record::RawRecord)s
//!   into a [`Graph`] arena with `dependents` / `children` indices
//! - **Restore**: add missing sides of bidirectional relationship pairs
//! - **Reduce**: prune transitively implied edges
//! - **Break cycles**: remove one ordering edge per cycle
//! - **Migrate**: fold legacy `enables`/`enabled_by` into current fields
//!
//! Passes only plan. A [`Plan`] carries one [`RecordPatch`] per touched record
//! for the caller to write back.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_graph::prelude::*;
//!
//! let graph = GraphBuilder::new().build(&records);
//! let plan = Reconciler::default().restore_bidirectional(&graph);
//! for patch in &plan.patches {
//!     store.write(&patch.key, &patch.updates).await?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod builder;
pub mod entity;
pub mod error;
pub mod graph;
pub mod patch;
pub mod reconcile;
pub mod relation;

// Re-exports for convenience
pub use builder::GraphBuilder;
pub use entity::{Entity, EntityId, EntityType, DEFAULT_WORKSTREAM};
pub use error::GraphError;
pub use graph::{DanglingRef, Graph, GraphWarning};
pub use patch::{BrokenCycle, ChangeKind, Conflict, EdgeChange, PatchSet, Plan, RecordPatch};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use relation::{Cardinality, Relation, RelationPair, RELATION_PAIRS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and reconciling the graph
    pub use crate::builder::GraphBuilder;
    pub use crate::entity::{Entity, EntityId, EntityType};
    pub use crate::graph::{Graph, GraphWarning};
    pub use crate::patch::{BrokenCycle, Conflict, Plan, RecordPatch};
    pub use crate::reconcile::{ReconcileOptions, Reconciler};
    pub use crate::relation::{Relation, RELATION_PAIRS};
}
