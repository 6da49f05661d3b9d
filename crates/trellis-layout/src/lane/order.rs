//! Lanes and milestone order within a lane

use crate::output::LayoutWarning;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use trellis_graph::{Entity, EntityId, EntityType, Graph, Relation};

/// Milestones of one workstream, left to right
#[derive(Debug)]
pub(crate) struct LanePlan<'g> {
    pub(crate) workstream: &'g str,
    pub(crate) milestones: Vec<&'g Entity>,
}

/// Group milestones into lanes (encountered order) and order each lane
pub(crate) fn plan_lanes<'g>(graph: &'g Graph, warnings: &mut Vec<LayoutWarning>) -> Vec<LanePlan<'g>> {
    let mut lanes: IndexMap<&str, Vec<&Entity>> = IndexMap::new();
    for milestone in graph.of_type(EntityType::Milestone) {
        lanes
            .entry(milestone.workstream.as_str())
            .or_default()
            .push(milestone);
    }

    lanes
        .into_iter()
        .map(|(workstream, members)| {
            let (ordered, leftover) = topo_order(graph, &members);
            if !leftover.is_empty() {
                tracing::warn!(workstream, count = leftover.len(), "milestone dependency cycle, using encountered order");
                warnings.push(LayoutWarning::MilestoneCycle {
                    workstream: workstream.to_string(),
                    milestones: leftover.iter().map(|m| m.id.clone()).collect(),
                });
            }
            LanePlan {
                workstream,
                milestones: ordered.into_iter().chain(leftover).collect(),
            }
        })
        .collect()
}

/// Kahn's algorithm over in-lane `depends_on`, smallest id first on ties
///
/// Returns the ordered milestones and, separately, those stuck in a cycle
/// (in encountered order).
fn topo_order<'g>(graph: &'g Graph, members: &[&'g Entity]) -> (Vec<&'g Entity>, Vec<&'g Entity>) {
    let in_lane: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
    let mut indegree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for member in members {
        let deps: Vec<&EntityId> = graph
            .targets(member.id.as_str(), Relation::DependsOn)
            .filter(|d| in_lane.contains(d.as_str()))
            .collect();
        indegree.insert(member.id.as_str(), deps.len());
        for dep in deps {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(member.id.as_str());
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order: Vec<&str> = Vec::with_capacity(members.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for dependent in dependents.get(next).into_iter().flatten() {
            if let Some(degree) = indegree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    let placed: HashSet<&str> = order.iter().copied().collect();
    let ordered = order
        .into_iter()
        .filter_map(|id| members.iter().copied().find(|m| m.id.as_str() == id))
        .collect();
    let leftover = members
        .iter()
        .copied()
        .filter(|m| !placed.contains(m.id.as_str()))
        .collect();
    (ordered, leftover)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entities: &[&Entity]) -> Vec<String> {
        entities.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn lanes_in_encountered_order() {
        let graph = Graph::from_entities([
            Entity::new("M-003", EntityType::Milestone).with_workstream("ops"),
            Entity::new("M-001", EntityType::Milestone).with_workstream("eng"),
            Entity::new("M-002", EntityType::Milestone).with_workstream("ops"),
        ]);
        let mut warnings = Vec::new();
        let lanes = plan_lanes(&graph, &mut warnings);

        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].workstream, "ops");
        assert_eq!(ids(&lanes[0].milestones), vec!["M-002", "M-003"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn dependencies_come_first() {
        let graph = Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone).with(Relation::DependsOn, ["M-003"]),
            Entity::new("M-002", EntityType::Milestone),
            Entity::new("M-003", EntityType::Milestone),
        ]);
        let lanes = plan_lanes(&graph, &mut Vec::new());
        assert_eq!(ids(&lanes[0].milestones), vec!["M-002", "M-003", "M-001"]);
    }

    #[test]
    fn cycle_residue_keeps_encountered_order() {
        let graph = Graph::from_entities([
            Entity::new("M-009", EntityType::Milestone),
            Entity::new("M-002", EntityType::Milestone).with(Relation::DependsOn, ["M-001"]),
            Entity::new("M-001", EntityType::Milestone).with(Relation::DependsOn, ["M-002"]),
        ]);
        let mut warnings = Vec::new();
        let lanes = plan_lanes(&graph, &mut warnings);

        assert_eq!(ids(&lanes[0].milestones), vec!["M-009", "M-002", "M-001"]);
        assert!(matches!(warnings[0], LayoutWarning::MilestoneCycle { .. }));
    }
}
