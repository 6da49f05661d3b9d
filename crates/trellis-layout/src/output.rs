//! Layout results

use crate::geometry::{Rect, Side};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use trellis_graph::{EntityId, Relation};

/// A milestone and everything nested under it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    /// Root milestone
    pub milestone: EntityId,
    /// Lane the milestone sits in
    pub workstream: String,
    /// Union of the milestone and member rects
    pub bounds: Rect,
    /// Subtree members, deferred shared items excluded
    pub members: Vec<EntityId>,
}

/// One workstream lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    /// Workstream label
    pub workstream: String,
    /// Milestones left to right
    pub milestones: Vec<EntityId>,
    /// Union of container bounds
    pub bounds: Rect,
}

/// An edge with resolved connector sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedEdge {
    /// Source entity
    pub from: EntityId,
    /// Target entity
    pub to: EntityId,
    /// Field the edge comes from
    pub relation: Relation,
    /// Side of the source node
    pub from_side: Side,
    /// Side of the target node
    pub to_side: Side,
}

/// Entity that could not be placed deterministically
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// `parent` names a missing entity; placed with the orphans
    DanglingParent {
        /// Affected entity
        entity: EntityId,
        /// Missing parent
        parent: EntityId,
    },
    /// `parent` chain loops without reaching a milestone
    ParentCycle {
        /// Affected entity
        entity: EntityId,
    },
    /// `parent` chain ends at an entity that is not a milestone
    DetachedParent {
        /// Affected entity
        entity: EntityId,
        /// Topmost ancestor
        root: EntityId,
    },
    /// Milestones left in a dependency cycle; placed in encountered order
    MilestoneCycle {
        /// Lane
        workstream: String,
        /// Milestones outside the topological order
        milestones: Vec<EntityId>,
    },
    /// Local overlap remained after the iteration cap
    UnresolvedOverlap {
        /// Container root
        milestone: EntityId,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingParent { entity, parent } => {
                write!(f, "{entity} has missing parent {parent}")
            }
            Self::ParentCycle { entity } => write!(f, "{entity} is in a parent cycle"),
            Self::DetachedParent { entity, root } => {
                write!(f, "{entity} has no milestone above it (root {root})")
            }
            Self::MilestoneCycle {
                workstream,
                milestones,
            } => {
                let ids: Vec<_> = milestones.iter().map(EntityId::as_str).collect();
                write!(f, "lane {workstream}: dependency cycle among {}", ids.join(", "))
            }
            Self::UnresolvedOverlap { milestone } => {
                write!(f, "container {milestone} still has overlapping nodes")
            }
        }
    }
}

/// Everything a layout strategy produces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutOutput {
    /// Final rect per entity
    pub positions: BTreeMap<EntityId, Rect>,
    /// Milestone containers
    pub containers: Vec<Container>,
    /// Workstream lanes, top to bottom
    pub lanes: Vec<Lane>,
    /// Shared items placed between their owners
    pub deferred: Vec<EntityId>,
    /// Items placed in the fallback grid
    pub orphans: Vec<EntityId>,
    /// Routed edges
    pub edges: Vec<RoutedEdge>,
    /// Placement warnings
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutOutput {
    /// Number of placed entities
    #[must_use]
    pub fn placed(&self) -> usize {
        self.positions.len()
    }

    /// Rect of an entity
    #[must_use]
    pub fn rect(&self, id: &str) -> Option<&Rect> {
        self.positions.get(id)
    }

    /// Container rooted at `milestone`
    #[must_use]
    pub fn container(&self, milestone: &str) -> Option<&Container> {
        self.containers
            .iter()
            .find(|c| c.milestone.as_str() == milestone)
    }
}
