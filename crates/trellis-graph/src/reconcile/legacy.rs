//! Legacy field migration
//!
//! `enables` predates `affects`, and `enabled_by` predates `decided_by`.
//! Migration folds the old fields into the new ones and deletes them.

use crate::graph::Graph;
use crate::patch::{PatchSet, Plan};
use crate::relation::Relation;

const MIGRATIONS: [(Relation, Relation); 2] = [
    (Relation::Enables, Relation::Affects),
    (Relation::EnabledBy, Relation::DecidedBy),
];

/// Plan the move of legacy fields into their current names
#[must_use]
pub fn migrate_legacy(graph: &Graph) -> Plan {
    let mut set = PatchSet::new(graph);

    for entity in graph.entities() {
        for (legacy, current) in MIGRATIONS {
            if !entity.relations.contains_key(&legacy) {
                continue;
            }
            for target in entity.related(legacy) {
                set.add(&entity.id, current, target);
            }
            set.clear_field(&entity.id, legacy);
        }
    }

    let plan = set.finish();
    tracing::info!(
        moved = plan.edges_added(),
        writes = plan.patches.len(),
        "planned legacy migration"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityType};
    use pretty_assertions::assert_eq;
    use trellis_record::{FieldUpdate, FieldValue};

    #[test]
    fn moves_enables_into_affects() {
        let graph = Graph::from_entities([
            Entity::new("DEC-001", EntityType::Decision)
                .with(Relation::Affects, ["F-010"])
                .with(Relation::Enables, ["F-010", "F-011"]),
            Entity::new("F-010", EntityType::Feature).with(Relation::EnabledBy, ["DEC-001"]),
            Entity::new("F-011", EntityType::Feature),
        ]);

        let plan = migrate_legacy(&graph);

        assert_eq!(plan.patches.len(), 2);
        let decision = &plan.patches[0];
        assert_eq!(
            decision.updates.get("affects"),
            Some(&FieldUpdate::Set(FieldValue::list(["F-010", "F-011"])))
        );
        assert_eq!(decision.updates.get("enables"), Some(&FieldUpdate::Remove));

        let feature = &plan.patches[1];
        assert_eq!(
            feature.updates.get("decided_by"),
            Some(&FieldUpdate::Set(FieldValue::list(["DEC-001"])))
        );
        assert_eq!(feature.updates.get("enabled_by"), Some(&FieldUpdate::Remove));
    }

    #[test]
    fn nothing_to_migrate() {
        let graph = Graph::from_entities([
            Entity::new("DEC-001", EntityType::Decision).with(Relation::Affects, ["F-010"]),
        ]);
        assert!(migrate_legacy(&graph).is_empty());
    }
}
