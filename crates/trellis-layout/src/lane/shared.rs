//! Placement of items shared by several milestones

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::output::LayoutOutput;
use std::collections::BTreeMap;
use trellis_graph::{EntityId, Graph};

/// Centre each shared item over the span of its owners' containers
///
/// Candidate slots alternate above the owners' top edge and below their
/// bottom edge, stepping outward one node height at a time; the first slot
/// clear of every placed rect and container wins.
pub(crate) fn place_shared(
    graph: &Graph,
    shared: &BTreeMap<&EntityId, Vec<&EntityId>>,
    config: &LayoutConfig,
    out: &mut LayoutOutput,
) {
    let gap = config.item_gap;

    for (&item, owners) in shared {
        let Some(entity) = graph.get(item.as_str()) else {
            continue;
        };
        let span = Rect::bounding(
            out.containers
                .iter()
                .filter(|c| owners.contains(&&c.milestone))
                .map(|c| &c.bounds),
        );
        let Some(span) = span else {
            tracing::warn!(item = %item, "no placed owner for shared item");
            continue;
        };

        let size = config.size_of(entity.entity_type);
        let x = span.center().0 - size.width / 2.0;
        let step = size.height + gap;
        let is_free = |rect: &Rect| {
            !out.positions.values().any(|r| r.overlaps(rect, gap))
                && !out.containers.iter().any(|c| c.bounds.overlaps(rect, gap))
        };

        // Beyond every placed rect a slot is always free
        let top = out
            .positions
            .values()
            .chain(out.containers.iter().map(|c| &c.bounds))
            .map(|r| r.y)
            .fold(span.y, f64::min);
        let reach = ((span.y - top) / step).ceil().max(0.0) as usize + 1;

        let rect = (0..=reach)
            .flat_map(|k| {
                let offset = k as f64 * step;
                [
                    Rect::new(x, span.y - gap - size.height - offset, size.width, size.height),
                    Rect::new(x, span.bottom() + gap + offset, size.width, size.height),
                ]
            })
            .find(|r| is_free(r))
            .unwrap_or_else(|| {
                Rect::new(x, top - gap - size.height, size.width, size.height)
            });

        tracing::debug!(item = %item, owners = owners.len(), rect = %rect, "placed shared item");
        out.positions.insert(item.clone(), rect);
        out.deferred.push(item.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Container;
    use trellis_graph::{Entity, EntityType, Relation};

    fn container(milestone: &str, bounds: Rect) -> Container {
        Container {
            milestone: EntityId::new(milestone),
            workstream: "eng".into(),
            bounds,
            members: Vec::new(),
        }
    }

    #[test]
    fn centred_above_owners() {
        let graph = Graph::from_entities([Entity::new("F-001", EntityType::Feature)
            .with(Relation::ImplementedBy, ["S-001", "S-002"])]);
        let config = LayoutConfig::default();
        let mut out = LayoutOutput::default();
        out.containers.push(container("M-001", Rect::new(0.0, 0.0, 400.0, 200.0)));
        out.containers.push(container("M-002", Rect::new(600.0, 0.0, 400.0, 200.0)));

        let (item, m1, m2) = (
            EntityId::new("F-001"),
            EntityId::new("M-001"),
            EntityId::new("M-002"),
        );
        let shared = BTreeMap::from([(&item, vec![&m1, &m2])]);
        place_shared(&graph, &shared, &config, &mut out);

        let rect = out.positions["F-001"];
        assert_eq!(rect.center().0, 500.0);
        assert_eq!(rect.bottom(), -config.item_gap);
        assert_eq!(out.deferred, vec![item.clone()]);
    }

    #[test]
    fn falls_below_when_above_is_taken() {
        let graph = Graph::from_entities([Entity::new("F-001", EntityType::Feature)]);
        let config = LayoutConfig::default();
        let mut out = LayoutOutput::default();
        out.containers.push(container("M-001", Rect::new(0.0, 0.0, 400.0, 200.0)));
        out.containers.push(container("M-000", Rect::new(0.0, -2000.0, 400.0, 1990.0)));

        let (item, m1) = (EntityId::new("F-001"), EntityId::new("M-001"));
        let shared = BTreeMap::from([(&item, vec![&m1])]);
        place_shared(&graph, &shared, &config, &mut out);

        assert_eq!(out.positions["F-001"].y, 200.0 + config.item_gap);
    }
}
