//! Cycle detection and breaking over ordering relationships
//!
//! The ordering graph has one node per entity (optionally restricted to one
//! type) and an edge `u → v` whenever `u` must come before `v`:
//!
//! - `u.blocks` lists `v`
//! - `v.depends_on` lists `u`
//!
//! Each round runs a DFS from every unvisited node, records the path suffix
//! closed by every back edge, dedupes cycles by their rotation to the smallest
//! id, and removes one edge per unique cycle. Rounds repeat until the graph
//! is acyclic.

use crate::entity::{EntityId, EntityType};
use crate::graph::Graph;
use crate::patch::{BrokenCycle, PatchSet, Plan};
use crate::relation::Relation;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashSet;

type OrderingGraph<'g> = DiGraphMap<&'g str, ()>;

/// Plan removal of one edge per ordering cycle
#[must_use]
pub fn break_cycles(graph: &Graph, type_filter: Option<EntityType>) -> Plan {
    let mut set = PatchSet::new(graph);
    let (nodes, mut ordering) = ordering_graph(graph, type_filter);

    loop {
        let cycles = find_cycles(&ordering, &nodes);
        if cycles.is_empty() {
            break;
        }

        let mut broke_any = false;
        for cycle in cycles {
            let edges = cycle_edges(&cycle);
            if edges.iter().any(|&(u, v)| !ordering.contains_edge(u, v)) {
                continue;
            }
            let Some((u, v)) = select_edge(&ordering, &edges) else {
                continue;
            };

            ordering.remove_edge(u, v);
            broke_any = true;

            let before = EntityId::new(u);
            let after = EntityId::new(v);
            set.remove(&before, Relation::Blocks, &after);
            set.remove(&after, Relation::DependsOn, &before);
            set.cycle(BrokenCycle {
                path: cycle.iter().map(|id| EntityId::new(*id)).collect(),
                removed: (before, after),
            });
        }

        if !broke_any {
            break;
        }
    }

    let plan = set.finish();
    tracing::info!(
        filter = type_filter.map_or("all", EntityType::as_str),
        cycles = plan.cycles.len(),
        writes = plan.patches.len(),
        "planned cycle breaking"
    );
    plan
}

fn ordering_graph(graph: &Graph, type_filter: Option<EntityType>) -> (Vec<&str>, OrderingGraph<'_>) {
    let mut nodes: Vec<&str> = graph
        .entities()
        .filter(|e| type_filter.map_or(true, |t| e.entity_type == t))
        .map(|e| e.id.as_str())
        .collect();
    nodes.sort_unstable();

    let included: HashSet<&str> = nodes.iter().copied().collect();
    let mut ordering = OrderingGraph::new();
    for &node in &nodes {
        ordering.add_node(node);
    }
    for &node in &nodes {
        for target in graph.targets(node, Relation::Blocks) {
            if included.contains(target.as_str()) {
                ordering.add_edge(node, target.as_str(), ());
            }
        }
        for source in graph.targets(node, Relation::DependsOn) {
            if included.contains(source.as_str()) {
                ordering.add_edge(source.as_str(), node, ());
            }
        }
    }

    (nodes, ordering)
}

fn successors<'g>(ordering: &OrderingGraph<'g>, node: &'g str) -> Vec<&'g str> {
    let mut next: Vec<&str> = ordering.neighbors_directed(node, Direction::Outgoing).collect();
    next.sort_unstable();
    next
}

/// Unique cycles closed by back edges, each rotated to its smallest node
fn find_cycles<'g>(ordering: &OrderingGraph<'g>, nodes: &[&'g str]) -> Vec<Vec<&'g str>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut signatures: HashSet<String> = HashSet::new();
    let mut cycles = Vec::new();

    for &start in nodes {
        if !visited.insert(start) {
            continue;
        }

        let mut path = vec![start];
        let mut on_path: HashSet<&str> = HashSet::from([start]);
        let mut stack = vec![successors(ordering, start).into_iter()];

        while let Some(pending) = stack.last_mut() {
            match pending.next() {
                Some(next) if on_path.contains(next) => {
                    let from = path.iter().position(|n| *n == next).unwrap_or_default();
                    let cycle = normalize(&path[from..]);
                    if signatures.insert(cycle.join("→")) {
                        cycles.push(cycle);
                    }
                }
                Some(next) => {
                    if visited.insert(next) {
                        path.push(next);
                        on_path.insert(next);
                        stack.push(successors(ordering, next).into_iter());
                    }
                }
                None => {
                    stack.pop();
                    if let Some(done) = path.pop() {
                        on_path.remove(done);
                    }
                }
            }
        }
    }

    cycles
}

fn normalize<'g>(cycle: &[&'g str]) -> Vec<&'g str> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(idx, _)| idx);
    cycle[pivot..].iter().chain(&cycle[..pivot]).copied().collect()
}

fn cycle_edges<'g>(cycle: &[&'g str]) -> Vec<(&'g str, &'g str)> {
    (0..cycle.len())
        .map(|i| (cycle[i], cycle[(i + 1) % cycle.len()]))
        .collect()
}

/// Edge whose source has the highest current out-degree, first one on ties
fn select_edge<'g>(
    ordering: &OrderingGraph<'g>,
    edges: &[(&'g str, &'g str)],
) -> Option<(&'g str, &'g str)> {
    let mut best: Option<((&str, &str), usize)> = None;
    for &(u, v) in edges {
        let degree = ordering.neighbors_directed(u, Direction::Outgoing).count();
        if best.map_or(true, |(_, d)| degree > d) {
            best = Some(((u, v), degree));
        }
    }
    best.map(|(edge, _)| edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use trellis_record::FieldUpdate;

    fn milestones(edges: &[(&str, &str)]) -> Graph {
        let mut ids: Vec<&str> = edges.iter().flat_map(|(a, b)| [*a, *b]).collect();
        ids.sort_unstable();
        ids.dedup();
        Graph::from_entities(ids.into_iter().map(|id| {
            let blocks: Vec<&str> = edges
                .iter()
                .filter(|(a, _)| *a == id)
                .map(|(_, b)| *b)
                .collect();
            Entity::new(id, EntityType::Milestone).with(Relation::Blocks, blocks)
        }))
    }

    #[test]
    fn breaks_simple_cycle() {
        let graph = milestones(&[("M-002", "M-003"), ("M-003", "M-001"), ("M-001", "M-002")]);

        let plan = break_cycles(&graph, Some(EntityType::Milestone));

        assert_eq!(plan.cycles.len(), 1);
        let path: Vec<_> = plan.cycles[0].path.iter().map(EntityId::as_str).collect();
        assert_eq!(path, vec!["M-001", "M-002", "M-003"]);
        assert_eq!(plan.edges_removed(), 1);
    }

    #[test]
    fn prefers_source_with_most_outgoing_edges() {
        let graph = milestones(&[
            ("M-001", "M-002"),
            ("M-002", "M-001"),
            ("M-002", "M-003"),
            ("M-002", "M-004"),
        ]);

        let plan = break_cycles(&graph, Some(EntityType::Milestone));

        assert_eq!(plan.cycles.len(), 1);
        assert_eq!(plan.cycles[0].removed.0.as_str(), "M-002");
        assert_eq!(plan.cycles[0].removed.1.as_str(), "M-001");
    }

    #[test]
    fn depends_on_edges_are_reoriented() {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone).with(Relation::DependsOn, ["M-002"]),
            Entity::new("M-002", EntityType::Milestone).with(Relation::DependsOn, ["M-001"]),
        ]);

        let plan = break_cycles(&graph, Some(EntityType::Milestone));

        assert_eq!(plan.cycles.len(), 1);
        let (before, after) = &plan.cycles[0].removed;
        assert_eq!(before.as_str(), "M-001");
        let patch = plan.patches.iter().find(|p| p.entity == *after).unwrap();
        assert!(matches!(
            patch.updates.get("depends_on"),
            Some(FieldUpdate::Set(_))
        ));
    }

    #[test]
    fn overlapping_cycles_all_broken() {
        let graph = milestones(&[
            ("M-001", "M-002"),
            ("M-002", "M-001"),
            ("M-002", "M-003"),
            ("M-003", "M-002"),
        ]);

        let plan = break_cycles(&graph, Some(EntityType::Milestone));

        assert_eq!(plan.cycles.len(), 2);
        let (_, mut remaining) = ordering_graph(&graph, None);
        for cycle in &plan.cycles {
            remaining.remove_edge(cycle.removed.0.as_str(), cycle.removed.1.as_str());
        }
        assert!(!petgraph::algo::is_cyclic_directed(&remaining));
    }

    #[test]
    fn filtered_type_is_left_alone() {
        let graph = Graph::from_entities([
            Entity::new("T-001", EntityType::Task).with(Relation::DependsOn, ["T-002"]),
            Entity::new("T-002", EntityType::Task).with(Relation::DependsOn, ["T-003"]),
            Entity::new("T-003", EntityType::Task).with(Relation::DependsOn, ["T-001"]),
        ]);

        assert!(break_cycles(&graph, Some(EntityType::Milestone)).cycles.is_empty());
        assert_eq!(break_cycles(&graph, None).cycles.len(), 1);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone).with(Relation::DependsOn, ["M-001"]),
        ]);

        let plan = break_cycles(&graph, Some(EntityType::Milestone));
        assert_eq!(plan.cycles.len(), 1);
        assert_eq!(plan.cycles[0].path, vec![EntityId::new("M-001")]);
    }
}
