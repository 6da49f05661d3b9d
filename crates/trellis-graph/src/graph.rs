//! In-memory relationship graph
//!
//! A pure arena of `EntityId -> Entity` plus the two derived indices the
//! reconciler and layout need:
//!
//! - **dependents**: reverse of `depends_on`
//! - **children**: reverse of `parent`
//!
//! Dangling targets stay inside each entity's relationship sets but are
//! never followed by graph algorithms.

use crate::entity::{Entity, EntityId, EntityType};
use crate::relation::Relation;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Reference to an entity absent from the record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingRef {
    /// Entity holding the reference
    pub from: EntityId,
    /// Field the reference sits in
    pub relation: Relation,
    /// Missing target
    pub target: EntityId,
}

/// Non-fatal issue found while building the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphWarning {
    /// Two records claim the same id; the first one wins
    DuplicateId {
        /// Contested id
        id: EntityId,
        /// Record that was ignored
        ignored: String,
    },
    /// Relationship names a missing entity
    Dangling(DanglingRef),
    /// `type` field could not be decoded; prefix fallback used
    UnknownType {
        /// Affected entity
        id: EntityId,
        /// Raw field value
        value: String,
    },
}

impl fmt::Display for GraphWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id, ignored } => {
                write!(f, "duplicate id {id}, ignored record {ignored}")
            }
            Self::Dangling(r) => write!(f, "{} {} -> missing {}", r.from, r.relation, r.target),
            Self::UnknownType { id, value } => write!(f, "{id} has unknown type '{value}'"),
        }
    }
}

/// Entity arena with adjacency indices
#[derive(Debug, Clone, Default)]
pub struct Graph {
    entities: IndexMap<EntityId, Entity>,
    dependents: BTreeMap<EntityId, BTreeSet<EntityId>>,
    children: BTreeMap<EntityId, BTreeSet<EntityId>>,
    warnings: Vec<GraphWarning>,
}

impl Graph {
    /// Build from entities; later duplicates are dropped with a warning
    #[must_use]
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut graph = Self::default();
        for entity in entities {
            graph.insert(entity);
        }
        graph.index();
        graph
    }

    pub(crate) fn insert(&mut self, entity: Entity) {
        if self.entities.contains_key(&entity.id) {
            tracing::warn!(id = %entity.id, record = %entity.key, "duplicate entity id, keeping first");
            self.warnings.push(GraphWarning::DuplicateId {
                id: entity.id.clone(),
                ignored: entity.key.to_string(),
            });
            return;
        }
        self.entities.insert(entity.id.clone(), entity);
    }

    pub(crate) fn warn(&mut self, warning: GraphWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn index(&mut self) {
        self.dependents.clear();
        self.children.clear();
        let mut dangling = Vec::new();

        for entity in self.entities.values() {
            for (relation, targets) in &entity.relations {
                for target in targets {
                    if !self.entities.contains_key(target) {
                        dangling.push(DanglingRef {
                            from: entity.id.clone(),
                            relation: *relation,
                            target: target.clone(),
                        });
                        continue;
                    }
                    match relation {
                        Relation::DependsOn => {
                            self.dependents
                                .entry(target.clone())
                                .or_default()
                                .insert(entity.id.clone());
                        }
                        Relation::Parent => {
                            self.children
                                .entry(target.clone())
                                .or_default()
                                .insert(entity.id.clone());
                        }
                        _ => {}
                    }
                }
            }
        }

        self.warnings
            .retain(|w| !matches!(w, GraphWarning::Dangling(_)));
        for reference in dangling {
            tracing::debug!(from = %reference.from, relation = %reference.relation, target = %reference.target, "dangling reference");
            self.warnings.push(GraphWarning::Dangling(reference));
        }
    }

    /// Entity by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Check whether an entity exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Entities in input order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities of one type, in input order
    pub fn of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(move |e| e.entity_type == entity_type)
    }

    /// Number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when the graph holds no entities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Existing targets of a relationship, in field order
    pub fn targets<'a>(
        &'a self,
        id: &str,
        relation: Relation,
    ) -> impl Iterator<Item = &'a EntityId> + 'a {
        self.get(id)
            .into_iter()
            .flat_map(move |e| e.related(relation))
            .filter(move |t| self.contains(t.as_str()))
    }

    /// Entities whose `depends_on` names `id`
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&EntityId> {
        self.dependents
            .get(id)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Entities whose `parent` is `id`
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&EntityId> {
        self.children
            .get(id)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// References to missing entities
    pub fn dangling(&self) -> impl Iterator<Item = &DanglingRef> {
        self.warnings.iter().filter_map(|w| match w {
            GraphWarning::Dangling(r) => Some(r),
            _ => None,
        })
    }

    /// All build warnings
    #[must_use]
    pub fn warnings(&self) -> &[GraphWarning] {
        &self.warnings
    }

    /// Nearest milestone up the `parent` chain (the entity itself if it is one)
    #[must_use]
    pub fn milestone_of(&self, id: &str) -> Option<&EntityId> {
        let mut seen = HashSet::new();
        let mut current = self.get(id)?;
        loop {
            if current.entity_type == EntityType::Milestone {
                return Some(&current.id);
            }
            if !seen.insert(current.id.as_str()) {
                return None;
            }
            let parent = current.parent()?;
            current = self.get(parent.as_str())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        Graph::from_entities([
            Entity::new("M-001", EntityType::Milestone),
            Entity::new("S-001", EntityType::Story).with(Relation::Parent, ["M-001"]),
            Entity::new("S-002", EntityType::Story)
                .with(Relation::Parent, ["M-001"])
                .with(Relation::DependsOn, ["S-001", "S-404"]),
            Entity::new("T-001", EntityType::Task).with(Relation::Parent, ["S-002"]),
        ])
    }

    #[test]
    fn derived_indices() {
        let graph = sample();
        assert_eq!(graph.dependents("S-001"), vec![&EntityId::new("S-002")]);
        assert_eq!(
            graph.children_of("M-001"),
            vec![&EntityId::new("S-001"), &EntityId::new("S-002")]
        );
        assert!(graph.children_of("T-001").is_empty());
    }

    #[test]
    fn dangling_retained_but_reported() {
        let graph = sample();
        let s2 = graph.get("S-002").unwrap();
        assert!(s2.has(Relation::DependsOn, "S-404"));

        let dangling: Vec<_> = graph.dangling().collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target.as_str(), "S-404");
        assert_eq!(graph.targets("S-002", Relation::DependsOn).count(), 1);
    }

    #[test]
    fn milestone_lookup() {
        let graph = sample();
        assert_eq!(graph.milestone_of("T-001").map(EntityId::as_str), Some("M-001"));
        assert_eq!(graph.milestone_of("M-001").map(EntityId::as_str), Some("M-001"));
    }

    #[test]
    fn milestone_lookup_survives_parent_cycle() {
        let graph = Graph::from_entities([
            Entity::new("S-001", EntityType::Story).with(Relation::Parent, ["S-002"]),
            Entity::new("S-002", EntityType::Story).with(Relation::Parent, ["S-001"]),
        ]);
        assert_eq!(graph.milestone_of("S-001"), None);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let graph = Graph::from_entities([
            Entity::new("S-001", EntityType::Story).with_workstream("eng"),
            Entity::new("S-001", EntityType::Story).with_workstream("ops"),
        ]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("S-001").unwrap().workstream, "eng");
        assert!(matches!(graph.warnings()[0], GraphWarning::DuplicateId { .. }));
    }
}
