//! Lane layout
//!
//! Workstreams become horizontal lanes stacked top to bottom. Each milestone
//! roots a container holding its `parent` subtree:
//!
//! 1. Group milestones into lanes and order each lane by `depends_on`
//! 2. Place every container around its milestone, then resolve local overlaps
//! 3. Pack containers left to right and lanes top to bottom
//! 4. Centre shared items between their owners
//! 5. Grid the leftovers below everything
//! 6. Route edges
//!
//! The output depends only on the graph and the config.

mod order;
mod orphans;
mod overlap;
mod place;
mod routing;
mod shared;
mod subtree;

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::output::{Container, Lane, LayoutOutput, LayoutWarning};
use crate::strategy::LayoutStrategy;
use place::{Growth, Placed};
use trellis_graph::{Entity, Graph};

/// A container placed in local coordinates
struct LocalContainer<'g> {
    milestone: &'g Entity,
    nodes: Vec<Placed<'g>>,
    bounds: Rect,
}

/// Lane-and-container layout strategy
#[derive(Debug, Clone, Default)]
pub struct LaneLayout {
    config: LayoutConfig,
}

impl LaneLayout {
    /// Create with default spacing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with the given spacing
    #[must_use]
    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn local_container<'g>(
        &self,
        graph: &'g Graph,
        milestone: &'g Entity,
        members: &[&'g Entity],
        position: usize,
        warnings: &mut Vec<LayoutWarning>,
    ) -> LocalContainer<'g> {
        let config = &self.config;
        let mut nodes = place::place_container(
            graph,
            milestone,
            members,
            Growth::for_position(position),
            config,
        );
        if !overlap::resolve_overlaps(&mut nodes, config.item_gap, config.overlap_iterations) {
            tracing::warn!(milestone = %milestone.id, "overlaps left after iteration cap");
            warnings.push(LayoutWarning::UnresolvedOverlap {
                milestone: milestone.id.clone(),
            });
        }
        let size = config.size_of(milestone.entity_type);
        let bounds = Rect::bounding(nodes.iter().map(|n| &n.rect))
            .unwrap_or(Rect::new(0.0, 0.0, size.width, size.height));
        LocalContainer {
            milestone,
            nodes,
            bounds,
        }
    }
}

impl LayoutStrategy for LaneLayout {
    fn name(&self) -> &'static str {
        "lane"
    }

    fn compute(&self, graph: &Graph) -> LayoutOutput {
        let config = &self.config;
        let mut out = LayoutOutput::default();
        let shared = subtree::shared_items(graph);
        let lanes = order::plan_lanes(graph, &mut out.warnings);

        let mut cursor_y = 0.0;
        for lane in &lanes {
            let locals: Vec<LocalContainer<'_>> = lane
                .milestones
                .iter()
                .enumerate()
                .map(|(position, &milestone)| {
                    let members = subtree::subtree(graph, milestone, &shared);
                    self.local_container(graph, milestone, &members, position, &mut out.warnings)
                })
                .collect();
            let Some(top) = locals.iter().map(|c| c.bounds.y).reduce(f64::min) else {
                continue;
            };
            let dy = cursor_y - top;

            let mut cursor_x = 0.0;
            let mut lane_bounds: Option<Rect> = None;
            for local in locals {
                let dx = cursor_x - local.bounds.x;
                let bounds = local.bounds.translate(dx, dy);
                cursor_x = bounds.right() + config.container_gap;

                let mut members = Vec::with_capacity(local.nodes.len());
                for node in &local.nodes {
                    out.positions.insert(node.id.clone(), node.rect.translate(dx, dy));
                    if node.id != &local.milestone.id {
                        members.push(node.id.clone());
                    }
                }
                out.containers.push(Container {
                    milestone: local.milestone.id.clone(),
                    workstream: lane.workstream.to_string(),
                    bounds,
                    members,
                });
                lane_bounds = Some(lane_bounds.map_or(bounds, |b| b.union(&bounds)));
            }

            if let Some(bounds) = lane_bounds {
                cursor_y = bounds.bottom() + config.lane_gap;
                out.lanes.push(Lane {
                    workstream: lane.workstream.to_string(),
                    milestones: lane.milestones.iter().map(|m| m.id.clone()).collect(),
                    bounds,
                });
            }
        }

        shared::place_shared(graph, &shared, config, &mut out);
        orphans::place_orphans(graph, config, &mut out);
        out.edges = routing::route_edges(graph, &shared, &out);

        tracing::info!(
            strategy = self.name(),
            placed = out.placed(),
            lanes = out.lanes.len(),
            shared = out.deferred.len(),
            orphans = out.orphans.len(),
            edges = out.edges.len(),
            warnings = out.warnings.len(),
            "layout computed"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_graph::{EntityType, Relation};

    #[test]
    fn containers_in_a_lane_do_not_overlap() {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone),
            Entity::new("M-002", EntityType::Milestone).with(Relation::DependsOn, ["M-001"]),
            Entity::new("S-001", EntityType::Story).with(Relation::Parent, ["M-001"]),
            Entity::new("S-002", EntityType::Story).with(Relation::Parent, ["M-002"]),
            Entity::new("DOC-001", EntityType::Document).with(Relation::Parent, ["M-001"]),
        ]);
        let layout = LaneLayout::new();
        let out = layout.compute(&graph);

        let (a, b) = (
            out.container("M-001").unwrap(),
            out.container("M-002").unwrap(),
        );
        assert!(!a.bounds.overlaps(&b.bounds, layout.config().container_gap - 1.0));
        assert!(a.bounds.right() < b.bounds.x);
        assert_eq!(a.members.len(), 2);
        assert_eq!(out.placed(), 5);
    }

    #[test]
    fn lanes_stack_downward() {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone).with_workstream("eng"),
            Entity::new("M-002", EntityType::Milestone).with_workstream("ops"),
        ]);
        let out = LaneLayout::new().compute(&graph);

        assert_eq!(out.lanes.len(), 2);
        assert!(out.lanes[0].bounds.bottom() < out.lanes[1].bounds.y);
        assert_eq!(out.lanes[0].workstream, "eng");
    }

    #[test]
    fn name_is_stable() {
        assert_eq!(LaneLayout::new().name(), "lane");
    }
}
