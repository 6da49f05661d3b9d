//! Relationship field catalogue
//!
//! Every relationship field an entity record may carry, its cardinality, and
//! the declared bidirectional pairs the reconciler keeps consistent.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A relationship field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Containment owner (single)
    Parent,
    /// Contained entities
    Children,
    /// Must come after these
    DependsOn,
    /// Must come before these
    Blocks,
    /// Implements these
    Implements,
    /// Implemented by these
    ImplementedBy,
    /// Documents these
    Documents,
    /// Documented by these
    DocumentedBy,
    /// Decision affects these
    Affects,
    /// Affected by these decisions
    DecidedBy,
    /// Legacy form of `affects`
    Enables,
    /// Legacy form of `decided_by`
    EnabledBy,
    /// Replaces these
    Supersedes,
    /// Replaced by (single)
    SupersededBy,
    /// Prior version (single)
    PreviousVersion,
    /// Next version (single)
    NextVersion,
}

/// How many targets a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Scalar field
    One,
    /// List field
    Many,
}

impl Relation {
    /// Every relation, in field order
    pub const ALL: [Relation; 16] = [
        Relation::Parent,
        Relation::Children,
        Relation::DependsOn,
        Relation::Blocks,
        Relation::Implements,
        Relation::ImplementedBy,
        Relation::Documents,
        Relation::DocumentedBy,
        Relation::Affects,
        Relation::DecidedBy,
        Relation::Enables,
        Relation::EnabledBy,
        Relation::Supersedes,
        Relation::SupersededBy,
        Relation::PreviousVersion,
        Relation::NextVersion,
    ];

    /// Front-matter field name
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Children => "children",
            Self::DependsOn => "depends_on",
            Self::Blocks => "blocks",
            Self::Implements => "implements",
            Self::ImplementedBy => "implemented_by",
            Self::Documents => "documents",
            Self::DocumentedBy => "documented_by",
            Self::Affects => "affects",
            Self::DecidedBy => "decided_by",
            Self::Enables => "enables",
            Self::EnabledBy => "enabled_by",
            Self::Supersedes => "supersedes",
            Self::SupersededBy => "superseded_by",
            Self::PreviousVersion => "previous_version",
            Self::NextVersion => "next_version",
        }
    }

    /// Look up by front-matter field name
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.field_name() == name)
    }

    /// Cardinality of the field
    #[must_use]
    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::Parent | Self::SupersededBy | Self::PreviousVersion | Self::NextVersion => {
                Cardinality::One
            }
            _ => Cardinality::Many,
        }
    }

    /// Field on the target that mirrors this one
    #[must_use]
    pub const fn reverse(self) -> Relation {
        match self {
            Self::Parent => Self::Children,
            Self::Children => Self::Parent,
            Self::DependsOn => Self::Blocks,
            Self::Blocks => Self::DependsOn,
            Self::Implements => Self::ImplementedBy,
            Self::ImplementedBy => Self::Implements,
            Self::Documents => Self::DocumentedBy,
            Self::DocumentedBy => Self::Documents,
            Self::Affects => Self::DecidedBy,
            Self::DecidedBy => Self::Affects,
            Self::Enables => Self::EnabledBy,
            Self::EnabledBy => Self::Enables,
            Self::Supersedes => Self::SupersededBy,
            Self::SupersededBy => Self::Supersedes,
            Self::PreviousVersion => Self::NextVersion,
            Self::NextVersion => Self::PreviousVersion,
        }
    }

    /// Edge means "positioned before/after"
    #[inline]
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::DependsOn | Self::Blocks)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for Relation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_field_name(s.trim()).ok_or_else(|| GraphError::UnknownRelation(s.to_string()))
    }
}

/// A forward field and its declared inverse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationPair {
    /// Field that states the relationship
    pub forward: Relation,
    /// Field on the target that must mirror it
    pub inverse: Relation,
    /// Older field that also counts as the forward side
    pub legacy_forward: Option<Relation>,
}

impl RelationPair {
    const fn new(forward: Relation, inverse: Relation) -> Self {
        Self {
            forward,
            inverse,
            legacy_forward: None,
        }
    }

    const fn with_legacy(forward: Relation, inverse: Relation, legacy: Relation) -> Self {
        Self {
            forward,
            inverse,
            legacy_forward: Some(legacy),
        }
    }

    /// Forward field plus its legacy alias
    pub fn forward_fields(&self) -> impl Iterator<Item = Relation> {
        std::iter::once(self.forward).chain(self.legacy_forward)
    }
}

/// Bidirectional pairs kept consistent by the reconciler
pub const RELATION_PAIRS: [RelationPair; 7] = [
    RelationPair::new(Relation::DependsOn, Relation::Blocks),
    RelationPair::new(Relation::Implements, Relation::ImplementedBy),
    RelationPair::new(Relation::Documents, Relation::DocumentedBy),
    RelationPair::with_legacy(Relation::Affects, Relation::DecidedBy, Relation::Enables),
    RelationPair::new(Relation::Enables, Relation::EnabledBy),
    RelationPair::new(Relation::Supersedes, Relation::SupersededBy),
    RelationPair::new(Relation::PreviousVersion, Relation::NextVersion),
];
