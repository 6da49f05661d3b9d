//! Entities held in the graph arena

use crate::error::GraphError;
use crate::relation::Relation;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use trellis_record::RecordKey;

/// Workstream assigned when a record names none
pub const DEFAULT_WORKSTREAM: &str = "unassigned";

/// Globally unique entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type-encoding prefix (`DEC` for `DEC-001`)
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Milestone (container root)
    Milestone,
    /// Story
    Story,
    /// Task
    Task,
    /// Decision record
    Decision,
    /// Document
    Document,
    /// Feature
    Feature,
    /// Anything else
    Other,
}

impl EntityType {
    /// Derive type from an id prefix
    #[must_use]
    pub fn from_id_prefix(id: &EntityId) -> Self {
        match id.prefix().to_ascii_uppercase().as_str() {
            "M" => Self::Milestone,
            "S" => Self::Story,
            "T" => Self::Task,
            "DEC" => Self::Decision,
            "DOC" => Self::Document,
            "F" => Self::Feature,
            _ => Self::Other,
        }
    }

    /// Layout priority, lower wins
    #[inline]
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Milestone => 0,
            Self::Story => 1,
            Self::Task => 2,
            Self::Decision => 3,
            Self::Document | Self::Feature => 4,
            Self::Other => 5,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Story => "story",
            Self::Task => "task",
            Self::Decision => "decision",
            Self::Document => "document",
            Self::Feature => "feature",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "milestone" => Ok(Self::Milestone),
            "story" => Ok(Self::Story),
            "task" => Ok(Self::Task),
            "decision" => Ok(Self::Decision),
            "document" | "doc" => Ok(Self::Document),
            "feature" => Ok(Self::Feature),
            _ => Err(GraphError::UnknownEntityType(s.to_string())),
        }
    }
}

/// One entity with its parsed relationship sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Identifier
    pub id: EntityId,
    /// Backing record
    pub key: RecordKey,
    /// Kind
    pub entity_type: EntityType,
    /// Lane grouping label
    pub workstream: String,
    /// Display title
    pub title: Option<String>,
    /// Relationship sets, dangling targets included
    pub relations: BTreeMap<Relation, IndexSet<EntityId>>,
}

impl Entity {
    /// Create entity with no relationships
    #[must_use]
    pub fn new(id: impl Into<EntityId>, entity_type: EntityType) -> Self {
        let id = id.into();
        let key = RecordKey::new(format!("{id}.md"));
        Self {
            id,
            key,
            entity_type,
            workstream: DEFAULT_WORKSTREAM.to_string(),
            title: None,
            relations: BTreeMap::new(),
        }
    }

    /// With workstream
    #[must_use]
    pub fn with_workstream(mut self, workstream: impl Into<String>) -> Self {
        self.workstream = workstream.into();
        self
    }

    /// With relationship targets appended
    #[must_use]
    pub fn with<I, S>(mut self, relation: Relation, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        self.relations
            .entry(relation)
            .or_default()
            .extend(targets.into_iter().map(Into::into));
        self
    }

    /// Targets of a relationship, in field order
    pub fn related(&self, relation: Relation) -> impl Iterator<Item = &EntityId> {
        self.relations.get(&relation).into_iter().flatten()
    }

    /// Check whether a relationship lists `target`
    #[must_use]
    pub fn has(&self, relation: Relation, target: &str) -> bool {
        self.relations
            .get(&relation)
            .is_some_and(|set| set.contains(target))
    }

    /// Containment owner
    #[must_use]
    pub fn parent(&self) -> Option<&EntityId> {
        self.related(Relation::Parent).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_prefix() {
        assert_eq!(EntityType::from_id_prefix(&"M-001".into()), EntityType::Milestone);
        assert_eq!(EntityType::from_id_prefix(&"DEC-004".into()), EntityType::Decision);
        assert_eq!(EntityType::from_id_prefix(&"doc-1".into()), EntityType::Document);
        assert_eq!(EntityType::from_id_prefix(&"X-9".into()), EntityType::Other);
    }

    #[test]
    fn priority_order() {
        assert!(EntityType::Milestone.priority() < EntityType::Story.priority());
        assert!(EntityType::Task.priority() < EntityType::Decision.priority());
        assert_eq!(EntityType::Document.priority(), EntityType::Feature.priority());
    }

    #[test]
    fn parse_type() {
        assert_eq!("Story".parse::<EntityType>(), Ok(EntityType::Story));
        assert!("epic".parse::<EntityType>().is_err());
    }

    #[test]
    fn entity_builder() {
        let entity = Entity::new("T-001", EntityType::Task)
            .with(Relation::Parent, ["S-001"])
            .with(Relation::DependsOn, ["T-002", "T-003", "T-002"]);

        assert_eq!(entity.parent().map(EntityId::as_str), Some("S-001"));
        assert_eq!(entity.related(Relation::DependsOn).count(), 2);
        assert!(entity.has(Relation::DependsOn, "T-003"));
        assert!(!entity.has(Relation::Blocks, "T-003"));
        assert_eq!(entity.workstream, DEFAULT_WORKSTREAM);
    }
}
