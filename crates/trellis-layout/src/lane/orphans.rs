//! Fallback grid for entities outside every container

use crate::config::{LayoutConfig, NodeSize};
use crate::geometry::Rect;
use crate::output::{LayoutOutput, LayoutWarning};
use std::collections::HashSet;
use trellis_graph::{Entity, EntityType, Graph};

/// Why an entity could not be nested
fn classify(graph: &Graph, entity: &Entity) -> Option<LayoutWarning> {
    let parent = entity.parent()?;
    if !graph.contains(parent.as_str()) {
        return Some(LayoutWarning::DanglingParent {
            entity: entity.id.clone(),
            parent: parent.clone(),
        });
    }

    let mut seen = HashSet::from([entity.id.as_str()]);
    let mut root = entity;
    let mut current = graph.get(parent.as_str());
    while let Some(next) = current {
        if !seen.insert(next.id.as_str()) {
            return Some(LayoutWarning::ParentCycle {
                entity: entity.id.clone(),
            });
        }
        if next.entity_type == EntityType::Milestone {
            return None;
        }
        root = next;
        current = next.parent().and_then(|p| graph.get(p.as_str()));
    }
    Some(LayoutWarning::DetachedParent {
        entity: entity.id.clone(),
        root: root.id.clone(),
    })
}

/// Grid every unplaced entity below everything placed so far
pub(crate) fn place_orphans(graph: &Graph, config: &LayoutConfig, out: &mut LayoutOutput) {
    let mut orphans: Vec<&Entity> = graph
        .entities()
        .filter(|e| !out.positions.contains_key(e.id.as_str()))
        .collect();
    if orphans.is_empty() {
        return;
    }
    orphans.sort_by(|a, b| {
        (a.entity_type.priority(), &a.id).cmp(&(b.entity_type.priority(), &b.id))
    });

    let (left, top) = match Rect::bounding(out.positions.values()) {
        Some(bounds) => (bounds.x, bounds.bottom() + config.lane_gap),
        None => (0.0, 0.0),
    };
    let cell = orphans
        .iter()
        .map(|e| config.size_of(e.entity_type))
        .fold(NodeSize::new(0.0, 0.0), NodeSize::max);
    let columns = config.orphan_columns.max(1);
    let gap = config.item_gap;

    for (index, entity) in orphans.into_iter().enumerate() {
        if let Some(warning) = classify(graph, entity) {
            tracing::warn!(%warning, "placing entity with the orphans");
            out.warnings.push(warning);
        }
        let (col, row) = (index % columns, index / columns);
        let size = config.size_of(entity.entity_type);
        let rect = Rect::new(
            left + col as f64 * (cell.width + gap),
            top + row as f64 * (cell.height + gap),
            size.width,
            size.height,
        );
        out.positions.insert(entity.id.clone(), rect);
        out.orphans.push(entity.id.clone());
    }
}
