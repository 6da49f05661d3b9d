//! Milestone subtrees and shared (multi-owner) items

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use trellis_graph::{Entity, EntityId, EntityType, Graph, Relation};

/// Fields whose targets decide which milestones own an item
const OWNER_FIELDS: [Relation; 2] = [Relation::ImplementedBy, Relation::Affects];

/// Items whose implementers or affected entities span several milestones
///
/// Maps each shared item to its owning milestones, sorted by id.
pub(crate) fn shared_items(graph: &Graph) -> BTreeMap<&EntityId, Vec<&EntityId>> {
    let mut shared = BTreeMap::new();

    for entity in graph.entities() {
        if entity.entity_type == EntityType::Milestone {
            continue;
        }
        let owners: BTreeSet<&EntityId> = OWNER_FIELDS
            .iter()
            .flat_map(|&field| graph.targets(entity.id.as_str(), field))
            .filter_map(|target| graph.milestone_of(target.as_str()))
            .collect();
        if owners.len() > 1 {
            tracing::debug!(item = %entity.id, owners = owners.len(), "deferring shared item");
            shared.insert(&entity.id, owners.into_iter().collect());
        }
    }

    shared
}

/// Entities nested under `milestone` via `parent`, breadth first
///
/// Other milestones are not entered; shared items are skipped but their
/// children still belong to the subtree.
pub(crate) fn subtree<'g>(
    graph: &'g Graph,
    milestone: &'g Entity,
    shared: &BTreeMap<&EntityId, Vec<&EntityId>>,
) -> Vec<&'g Entity> {
    let mut members = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([milestone.id.as_str()]);
    let mut queue = VecDeque::from([milestone.id.as_str()]);

    while let Some(current) = queue.pop_front() {
        for child in graph.children_of(current) {
            let Some(entity) = graph.get(child.as_str()) else {
                continue;
            };
            if entity.entity_type == EntityType::Milestone || !seen.insert(child.as_str()) {
                continue;
            }
            if !shared.contains_key(child) {
                members.push(entity);
            }
            queue.push_back(child.as_str());
        }
    }

    members
}
