//! Graph construction from raw records

use crate::entity::{Entity, EntityId, EntityType, DEFAULT_WORKSTREAM};
use crate::graph::{Graph, GraphWarning};
use crate::relation::{Cardinality, Relation};
use trellis_record::RawRecord;

/// Builds a [`Graph`] from decoded records
///
/// Pure function of its input: no I/O, no state carried between builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the graph
    #[must_use]
    pub fn build(&self, records: &[RawRecord]) -> Graph {
        let mut graph = Graph::default();

        for record in records {
            let Some(id) = entity_id(record) else {
                tracing::warn!(record = %record.key, "record has no entity id, skipping");
                continue;
            };

            let entity_type = match record.scalar("type") {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    graph.warn(GraphWarning::UnknownType {
                        id: id.clone(),
                        value: raw.to_string(),
                    });
                    EntityType::from_id_prefix(&id)
                }),
                None => EntityType::from_id_prefix(&id),
            };

            let workstream = record
                .scalar("workstream")
                .filter(|w| !w.is_empty())
                .unwrap_or(DEFAULT_WORKSTREAM)
                .to_string();

            let mut entity = Entity::new(id, entity_type).with_workstream(workstream);
            entity.key = record.key.clone();
            entity.title = record.title.clone();

            for relation in Relation::ALL {
                let items = record.items(relation.field_name());
                if items.is_empty() {
                    continue;
                }
                let take = match relation.cardinality() {
                    Cardinality::One => 1,
                    Cardinality::Many => items.len(),
                };
                entity = entity.with(relation, items.into_iter().take(take));
            }

            graph.insert(entity);
        }

        graph.index();
        tracing::debug!(
            entities = graph.len(),
            warnings = graph.warnings().len(),
            "built relationship graph"
        );
        graph
    }
}

fn entity_id(record: &RawRecord) -> Option<EntityId> {
    let id = record
        .scalar("id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| record.key.file_stem());
    (!id.is_empty()).then(|| EntityId::new(id))
}
