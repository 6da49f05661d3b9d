//! Relationship reconciliation passes
//!
//! Each pass is a pure planner over a [`Graph`]: it returns a [`Plan`] and
//! never writes. Passes are idempotent, so re-running one on the graph rebuilt
//! from its own output plans nothing.
//!
//! - [`restore_bidirectional`]: add missing sides of declared pairs
//! - [`reduce_transitive`]: drop edges implied by a longer path
//! - [`break_cycles`]: remove one ordering edge per cycle
//! - [`migrate_legacy`]: fold `enables`/`enabled_by` into current fields

mod bidirectional;
mod cycles;
mod legacy;
mod transitive;

pub use bidirectional::restore_bidirectional;
pub use cycles::break_cycles;
pub use legacy::migrate_legacy;
pub use transitive::reduce_transitive;

use crate::entity::EntityType;
use crate::graph::Graph;
use crate::patch::Plan;
use crate::relation::Relation;
use serde::{Deserialize, Serialize};

/// Tunables for the reconcile passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Fields pruned by transitive reduction
    pub transitive_fields: Vec<Relation>,
    /// Restrict cycle breaking to one entity type (`None` for all)
    pub cycle_entity_type: Option<EntityType>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            transitive_fields: vec![
                Relation::DependsOn,
                Relation::Children,
                Relation::ImplementedBy,
                Relation::Enables,
            ],
            cycle_entity_type: Some(EntityType::Milestone),
        }
    }
}

/// Runs reconcile passes with one set of options
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Create reconciler
    #[inline]
    #[must_use]
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Active options
    #[must_use]
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Restore missing inverse and forward edges
    #[must_use]
    pub fn restore_bidirectional(&self, graph: &Graph) -> Plan {
        restore_bidirectional(graph)
    }

    /// Prune transitively implied edges in the configured fields
    #[must_use]
    pub fn reduce_transitive(&self, graph: &Graph) -> Plan {
        reduce_transitive(graph, &self.options.transitive_fields)
    }

    /// Break ordering cycles among the configured entity type
    #[must_use]
    pub fn break_cycles(&self, graph: &Graph) -> Plan {
        break_cycles(graph, self.options.cycle_entity_type)
    }

    /// Move legacy fields to their current names
    #[must_use]
    pub fn migrate_legacy(&self, graph: &Graph) -> Plan {
        migrate_legacy(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_when_empty() {
        let options = parse("{}");
        assert_eq!(options, ReconcileOptions::default());
    }

    #[test]
    fn options_parse_overrides() {
        let options = parse("transitive_fields: [depends_on]\ncycle_entity_type: null\n");
        assert_eq!(options.transitive_fields, vec![Relation::DependsOn]);
        assert_eq!(options.cycle_entity_type, None);
    }

    fn parse(text: &str) -> ReconcileOptions {
        serde_yaml::from_str(text).unwrap()
    }
}
