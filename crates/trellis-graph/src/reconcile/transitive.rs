//! Transitive reduction
//!
//! For each configured field, an item is redundant when another kept item of
//! the same field reaches it by following that field. Reach sets are computed
//! once per item and memoized; traversals carry a visited set so cycles in the
//! field graph terminate.
//!
//! `children` has one exception: a redundant child with no dependents is
//! kept, since dropping it would leave it without any positional anchor.

use crate::entity::EntityId;
use crate::graph::Graph;
use crate::patch::{PatchSet, Plan};
use crate::relation::Relation;
use std::collections::{HashMap, HashSet, VecDeque};

/// Plan removal of transitively implied edges in `fields`
#[must_use]
pub fn reduce_transitive(graph: &Graph, fields: &[Relation]) -> Plan {
    let mut set = PatchSet::new(graph);

    for &field in fields {
        let mut reach = ReachCache::new(graph, field);

        for entity in graph.entities() {
            let items: Vec<&EntityId> = graph.targets(entity.id.as_str(), field).collect();
            if items.len() < 2 {
                continue;
            }

            let mut pruned: HashSet<&str> = HashSet::new();
            for &item in &items {
                let redundant = items.iter().any(|&other| {
                    other != item
                        && !pruned.contains(other.as_str())
                        && reach.reaches(other.as_str(), item.as_str())
                });
                if !redundant {
                    continue;
                }
                if field == Relation::Children && graph.dependents(item.as_str()).is_empty() {
                    tracing::debug!(owner = %entity.id, child = %item, "keeping redundant child without dependents");
                    continue;
                }

                pruned.insert(item.as_str());
                set.remove(&entity.id, field, item);
                set.remove(item, field.reverse(), &entity.id);
            }
        }
    }

    let plan = set.finish();
    tracing::info!(
        removed = plan.edges_removed(),
        writes = plan.patches.len(),
        "planned transitive reduction"
    );
    plan
}

/// Memoized reachability over one field
struct ReachCache<'g> {
    graph: &'g Graph,
    field: Relation,
    memo: HashMap<&'g str, HashSet<&'g str>>,
}

impl<'g> ReachCache<'g> {
    fn new(graph: &'g Graph, field: Relation) -> Self {
        Self {
            graph,
            field,
            memo: HashMap::new(),
        }
    }

    /// Check whether `from` reaches `to` by following the field
    fn reaches(&mut self, from: &str, to: &str) -> bool {
        let graph = self.graph;
        let field = self.field;
        let Some(start) = graph.get(from).map(|e| e.id.as_str()) else {
            return false;
        };
        self.memo
            .entry(start)
            .or_insert_with(|| bfs(graph, field, start))
            .contains(to)
    }
}

fn bfs<'g>(graph: &'g Graph, field: Relation, start: &'g str) -> HashSet<&'g str> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for next in graph.targets(current, field) {
            if seen.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }
    seen
}
