//! Connector sides for retained edges

use crate::geometry::{Rect, Side};
use crate::output::{LayoutOutput, RoutedEdge};
use std::collections::{BTreeMap, BTreeSet};
use trellis_graph::{EntityId, Graph, Relation};

/// Fields drawn as edges, from the entity holding the field to its target
/// (`parent` and `depends_on` are drawn from the target instead). Items
/// stored only on the reverse field are drawn the same way.
const DRAWN: [Relation; 8] = [
    Relation::Parent,
    Relation::DependsOn,
    Relation::Implements,
    Relation::Documents,
    Relation::Affects,
    Relation::Enables,
    Relation::Supersedes,
    Relation::NextVersion,
];

/// Sides by the dominant axis between two rect centres
pub(crate) fn sides_between(from: &Rect, to: &Rect) -> (Side, Side) {
    let ((fx, fy), (tx, ty)) = (from.center(), to.center());
    let (dx, dy) = (tx - fx, ty - fy);
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

struct Router<'a> {
    graph: &'a Graph,
    shared: &'a BTreeMap<&'a EntityId, Vec<&'a EntityId>>,
    out: &'a LayoutOutput,
}

impl Router<'_> {
    /// Leftmost and rightmost owner milestones of a shared item
    fn owner_extremes(&self, item: &EntityId) -> Option<(&EntityId, &EntityId)> {
        let owners = self.shared.get(item)?;
        let mut placed: Vec<(&EntityId, f64)> = owners
            .iter()
            .filter_map(|&m| self.out.container(m.as_str()).map(|c| (m, c.bounds.x)))
            .collect();
        placed.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        Some((placed.first()?.0, placed.last()?.0))
    }

    /// `(shared_side, other_side)` when `other` belongs to an extreme owner
    fn shared_sides(&self, item: &EntityId, other: &EntityId) -> Option<(Side, Side)> {
        let (leftmost, rightmost) = self.owner_extremes(item)?;
        let milestone = self.graph.milestone_of(other.as_str())?;
        if milestone == leftmost {
            Some((Side::Left, Side::Right))
        } else if milestone == rightmost {
            Some((Side::Right, Side::Left))
        } else {
            None
        }
    }

    fn route(&self, from: &EntityId, to: &EntityId, relation: Relation) -> Option<RoutedEdge> {
        let (a, b) = (self.out.rect(from.as_str())?, self.out.rect(to.as_str())?);
        let sides = if self.shared.contains_key(from) {
            self.shared_sides(from, to)
        } else if self.shared.contains_key(to) {
            self.shared_sides(to, from).map(|(t, f)| (f, t))
        } else {
            None
        };
        let (from_side, to_side) = sides.unwrap_or_else(|| sides_between(a, b));
        Some(RoutedEdge {
            from: from.clone(),
            to: to.clone(),
            relation,
            from_side,
            to_side,
        })
    }
}

/// Route every drawn edge between two placed entities
pub(crate) fn route_edges(
    graph: &Graph,
    shared: &BTreeMap<&EntityId, Vec<&EntityId>>,
    out: &LayoutOutput,
) -> Vec<RoutedEdge> {
    let router = Router { graph, shared, out };
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();

    for entity in graph.entities() {
        for relation in DRAWN {
            let forward = graph
                .targets(entity.id.as_str(), relation)
                .map(|target| (&entity.id, target));
            let reverse = graph
                .targets(entity.id.as_str(), relation.reverse())
                .map(|holder| (holder, &entity.id));

            for (holder, target) in forward.chain(reverse) {
                let (from, to) = match relation {
                    Relation::Parent | Relation::DependsOn => (target, holder),
                    _ => (holder, target),
                };
                if from == to || !seen.insert((from, to, relation)) {
                    continue;
                }
                if let Some(edge) = router.route(from, to, relation) {
                    edges.push(edge);
                }
            }
        }
    }
    edges
}
