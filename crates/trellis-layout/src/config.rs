//! Layout tunables
//!
//! Every field has a default, so a partial `[layout]` table in `trellis.toml`
//! only overrides what it names.

use serde::{Deserialize, Serialize};
use trellis_graph::EntityType;

/// Width and height of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl NodeSize {
    /// Create size
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum
    #[must_use]
    pub fn max(self, other: NodeSize) -> NodeSize {
        NodeSize::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Node sizes per entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSizes {
    /// Milestones
    pub milestone: NodeSize,
    /// Stories
    pub story: NodeSize,
    /// Tasks
    pub task: NodeSize,
    /// Decisions
    pub decision: NodeSize,
    /// Documents
    pub document: NodeSize,
    /// Features
    pub feature: NodeSize,
    /// Anything else
    pub other: NodeSize,
}

impl Default for NodeSizes {
    fn default() -> Self {
        Self {
            milestone: NodeSize::new(320.0, 160.0),
            story: NodeSize::new(260.0, 140.0),
            task: NodeSize::new(240.0, 120.0),
            decision: NodeSize::new(240.0, 120.0),
            document: NodeSize::new(240.0, 120.0),
            feature: NodeSize::new(240.0, 120.0),
            other: NodeSize::new(240.0, 120.0),
        }
    }
}

/// Spacing and sizing for [`LaneLayout`](crate::LaneLayout)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Node sizes
    pub sizes: NodeSizes,
    /// Minimum gap between nodes in one container
    pub item_gap: f64,
    /// Minimum gap between containers in one lane
    pub container_gap: f64,
    /// Minimum gap between lanes
    pub lane_gap: f64,
    /// Columns of the orphan grid
    pub orphan_columns: usize,
    /// Passes of the local overlap resolver before giving up
    pub overlap_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sizes: NodeSizes::default(),
            item_gap: 40.0,
            container_gap: 120.0,
            lane_gap: 200.0,
            orphan_columns: 6,
            overlap_iterations: 64,
        }
    }
}

impl LayoutConfig {
    /// Size of a node of the given type
    #[must_use]
    pub fn size_of(&self, entity_type: EntityType) -> NodeSize {
        let sizes = &self.sizes;
        match entity_type {
            EntityType::Milestone => sizes.milestone,
            EntityType::Story => sizes.story,
            EntityType::Task => sizes.task,
            EntityType::Decision => sizes.decision,
            EntityType::Document => sizes.document,
            EntityType::Feature => sizes.feature,
            EntityType::Other => sizes.other,
        }
    }
}
