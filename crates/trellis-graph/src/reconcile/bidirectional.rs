//! Bidirectional restoration
//!
//! Every declared pair is checked from both sides: a forward edge without its
//! inverse gets the inverse added, and an inverse edge without any forward
//! edge (legacy alias included) gets the forward edge added. Single-valued
//! fields that already name another existing entity are reported, never
//! overwritten.

use crate::entity::EntityId;
use crate::graph::Graph;
use crate::patch::{Conflict, PatchSet, Plan};
use crate::relation::{Cardinality, Relation, RelationPair, RELATION_PAIRS};

/// Plan the edits that make every declared pair mutually consistent
#[must_use]
pub fn restore_bidirectional(graph: &Graph) -> Plan {
    let mut set = PatchSet::new(graph);

    // Edges added for one pair can feed an earlier pair through the legacy
    // alias, so sweep until a round adds nothing.
    loop {
        let before = set.change_count();
        for pair in RELATION_PAIRS {
            for entity in graph.entities() {
                for forward in pair.forward_fields() {
                    for target in existing(&set, &entity.id, forward) {
                        ensure(&mut set, &target, pair.inverse, &entity.id);
                    }
                }
                for target in existing(&set, &entity.id, pair.inverse) {
                    if !has_forward(&set, &pair, &target, &entity.id) {
                        ensure(&mut set, &target, pair.forward, &entity.id);
                    }
                }
            }
        }
        if set.change_count() == before {
            break;
        }
    }

    let plan = set.finish();
    tracing::info!(
        added = plan.edges_added(),
        conflicts = plan.conflicts.len(),
        writes = plan.patches.len(),
        "planned bidirectional restoration"
    );
    plan
}

fn existing(set: &PatchSet<'_>, owner: &EntityId, relation: Relation) -> Vec<EntityId> {
    let mut items = set.items(owner.as_str(), relation);
    items.retain(|t| set.graph().contains(t.as_str()));
    items
}

fn has_forward(set: &PatchSet<'_>, pair: &RelationPair, owner: &EntityId, target: &EntityId) -> bool {
    pair.forward_fields()
        .any(|field| set.contains(owner.as_str(), field, target.as_str()))
}

/// Make `owner.relation` list `target`
fn ensure(set: &mut PatchSet<'_>, owner: &EntityId, relation: Relation, target: &EntityId) {
    if set.contains(owner.as_str(), relation, target.as_str()) {
        return;
    }

    if relation.cardinality() == Cardinality::One {
        if let Some(existing) = set.first(owner.as_str(), relation) {
            if set.graph().contains(existing.as_str()) {
                set.conflict(Conflict {
                    entity: owner.clone(),
                    relation,
                    existing,
                    wanted: target.clone(),
                });
                return;
            }
            set.remove(owner, relation, &existing);
        }
    }

    set.add(owner, relation, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityType};
    use crate::patch::ChangeKind;
    use trellis_record::{FieldUpdate, FieldValue};

    #[test]
    fn adds_missing_inverse() {
        let graph = Graph::from_entities([
            Entity::new("S-001", EntityType::Story),
            Entity::new("S-002", EntityType::Story).with(Relation::DependsOn, ["S-001"]),
        ]);

        let plan = restore_bidirectional(&graph);

        assert_eq!(plan.patches.len(), 1);
        assert_eq!(plan.patches[0].entity.as_str(), "S-001");
        assert_eq!(
            plan.patches[0].updates.get("blocks"),
            Some(&FieldUpdate::Set(FieldValue::list(["S-002"])))
        );
    }

    #[test]
    fn adds_missing_forward_from_inverse() {
        let graph = Graph::from_entities([
            Entity::new("S-001", EntityType::Story).with(Relation::Blocks, ["S-002"]),
            Entity::new("S-002", EntityType::Story),
        ]);

        let plan = restore_bidirectional(&graph);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].entity.as_str(), "S-002");
        assert_eq!(plan.changes[0].relation, Relation::DependsOn);
        assert_eq!(plan.changes[0].kind, ChangeKind::Added);
    }

    #[test]
    fn skips_dangling_targets() {
        let graph = Graph::from_entities([
            Entity::new("S-001", EntityType::Story).with(Relation::DependsOn, ["S-404"]),
        ]);
        assert!(restore_bidirectional(&graph).is_empty());
    }

    #[test]
    fn legacy_enables_satisfies_decided_by() {
        let graph = Graph::from_entities([
            Entity::new("DEC-001", EntityType::Decision).with(Relation::Enables, ["F-010"]),
            Entity::new("F-010", EntityType::Feature)
                .with(Relation::DecidedBy, ["DEC-001"])
                .with(Relation::EnabledBy, ["DEC-001"]),
        ]);

        let plan = restore_bidirectional(&graph);
        assert!(plan.is_empty(), "unexpected changes: {:?}", plan.changes);
    }

    #[test]
    fn single_valued_conflict_is_reported() {
        let graph = Graph::from_entities([
            Entity::new("DOC-001", EntityType::Document).with(Relation::Supersedes, ["DOC-003"]),
            Entity::new("DOC-002", EntityType::Document).with(Relation::Supersedes, ["DOC-003"]),
            Entity::new("DOC-003", EntityType::Document),
        ]);

        let plan = restore_bidirectional(&graph);

        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].existing.as_str(), "DOC-001");
        assert_eq!(plan.conflicts[0].wanted.as_str(), "DOC-002");
        assert_eq!(
            plan.patches[0].updates.get("superseded_by"),
            Some(&FieldUpdate::Set(FieldValue::scalar("DOC-001")))
        );
    }

    #[test]
    fn dangling_single_value_is_replaced() {
        let graph = Graph::from_entities([
            Entity::new("DOC-001", EntityType::Document).with(Relation::NextVersion, ["DOC-002"]),
            Entity::new("DOC-002", EntityType::Document)
                .with(Relation::PreviousVersion, ["DOC-000"]),
        ]);

        let plan = restore_bidirectional(&graph);
        assert!(plan.conflicts.is_empty());
        assert_eq!(
            plan.patches[0].updates.get("previous_version"),
            Some(&FieldUpdate::Set(FieldValue::scalar("DOC-001")))
        );
    }
}
