//! Planned relationship edits
//!
//! Passes never mutate the [`Graph`]. They record edits in a [`PatchSet`],
//! which keeps working copies of every touched field and finally folds them
//! into a [`Plan`]: one [`RecordPatch`] (a single write) per touched entity,
//! plus a log of individual edge changes for reporting.

use crate::entity::EntityId;
use crate::graph::Graph;
use crate::relation::{Cardinality, Relation};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use trellis_record::{FieldUpdate, FieldUpdates, FieldValue, RawRecord, RecordKey};

/// Direction of an edge change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Edge inserted
    Added,
    /// Edge deleted
    Removed,
}

/// One edge inserted into or deleted from a relationship field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeChange {
    /// Entity whose field changed
    pub entity: EntityId,
    /// Field that changed
    pub relation: Relation,
    /// Item added or removed
    pub target: EntityId,
    /// Added or removed
    pub kind: ChangeKind,
}

impl fmt::Display for EdgeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.kind {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
        };
        write!(f, "{sign} {}.{} {}", self.entity, self.relation, self.target)
    }
}

/// Single-valued field that already names a different entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Entity owning the field
    pub entity: EntityId,
    /// Single-valued field
    pub relation: Relation,
    /// Value kept
    pub existing: EntityId,
    /// Value the inverse side asked for
    pub wanted: EntityId,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} is {} (wanted {})",
            self.entity, self.relation, self.existing, self.wanted
        )
    }
}

/// A cycle found in the ordering graph and the edge removed to break it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenCycle {
    /// Cycle rotated to start at its smallest id
    pub path: Vec<EntityId>,
    /// Removed ordering edge `(before, after)`
    pub removed: (EntityId, EntityId),
}

impl fmt::Display for BrokenCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<_> = self.path.iter().map(EntityId::as_str).collect();
        write!(
            f,
            "{} → {} (removed {} → {})",
            path.join(" → "),
            path.first().copied().unwrap_or_default(),
            self.removed.0,
            self.removed.1
        )
    }
}

/// All edits for one record, applied in a single write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPatch {
    /// Entity being edited
    pub entity: EntityId,
    /// Backing record
    pub key: RecordKey,
    /// Field edits
    pub updates: FieldUpdates,
}

/// Result of a reconcile pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// One write per touched entity
    pub patches: Vec<RecordPatch>,
    /// Individual edge edits
    pub changes: Vec<EdgeChange>,
    /// Single-valued fields left untouched
    pub conflicts: Vec<Conflict>,
    /// Cycles broken
    pub cycles: Vec<BrokenCycle>,
}

impl Plan {
    /// True when the pass found nothing to write
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Number of edges inserted
    #[must_use]
    pub fn edges_added(&self) -> usize {
        self.count(ChangeKind::Added)
    }

    /// Number of edges deleted
    #[must_use]
    pub fn edges_removed(&self) -> usize {
        self.count(ChangeKind::Removed)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Apply every patch to matching records in place
    pub fn apply_to(&self, records: &mut [RawRecord]) {
        for patch in &self.patches {
            if let Some(record) = records.iter_mut().find(|r| r.key == patch.key) {
                record.apply(&patch.updates);
            }
        }
    }
}

/// Working copies of relationship fields touched by a pass
#[derive(Debug)]
pub struct PatchSet<'g> {
    graph: &'g Graph,
    working: IndexMap<EntityId, BTreeMap<Relation, IndexSet<EntityId>>>,
    cleared: BTreeSet<(EntityId, Relation)>,
    changes: Vec<EdgeChange>,
    conflicts: Vec<Conflict>,
    cycles: Vec<BrokenCycle>,
}

impl<'g> PatchSet<'g> {
    /// Start an empty patch set over `graph`
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            working: IndexMap::new(),
            cleared: BTreeSet::new(),
            changes: Vec::new(),
            conflicts: Vec::new(),
            cycles: Vec::new(),
        }
    }

    /// Graph the edits are planned against
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Current items of a field, edits included
    #[must_use]
    pub fn items(&self, id: &str, relation: Relation) -> Vec<EntityId> {
        if let Some(set) = self.working.get(id).and_then(|f| f.get(&relation)) {
            return set.iter().cloned().collect();
        }
        self.graph
            .get(id)
            .map(|e| e.related(relation).cloned().collect())
            .unwrap_or_default()
    }

    /// Check whether a field currently lists `target`
    #[must_use]
    pub fn contains(&self, id: &str, relation: Relation, target: &str) -> bool {
        match self.working.get(id).and_then(|f| f.get(&relation)) {
            Some(set) => set.contains(target),
            None => self.graph.get(id).is_some_and(|e| e.has(relation, target)),
        }
    }

    /// First current item of a field
    #[must_use]
    pub fn first(&self, id: &str, relation: Relation) -> Option<EntityId> {
        self.items(id, relation).into_iter().next()
    }

    fn field_mut(&mut self, id: &EntityId, relation: Relation) -> Option<&mut IndexSet<EntityId>> {
        let graph = self.graph;
        let entity = graph.get(id.as_str())?;
        let fields = self.working.entry(id.clone()).or_default();
        Some(
            fields
                .entry(relation)
                .or_insert_with(|| entity.related(relation).cloned().collect()),
        )
    }

    /// Add `target` to a field; returns whether anything changed
    pub fn add(&mut self, id: &EntityId, relation: Relation, target: &EntityId) -> bool {
        let Some(field) = self.field_mut(id, relation) else {
            return false;
        };
        if !field.insert(target.clone()) {
            return false;
        }
        self.cleared.remove(&(id.clone(), relation));
        self.log(id, relation, target, ChangeKind::Added);
        true
    }

    /// Remove `target` from a field; returns whether anything changed
    pub fn remove(&mut self, id: &EntityId, relation: Relation, target: &EntityId) -> bool {
        let Some(field) = self.field_mut(id, relation) else {
            return false;
        };
        if !field.shift_remove(target) {
            return false;
        }
        self.log(id, relation, target, ChangeKind::Removed);
        true
    }

    /// Empty a field and delete it from the record
    pub fn clear_field(&mut self, id: &EntityId, relation: Relation) {
        let present = self
            .graph
            .get(id.as_str())
            .is_some_and(|e| e.relations.contains_key(&relation));
        if !present {
            return;
        }
        for target in self.items(id.as_str(), relation) {
            self.remove(id, relation, &target);
        }
        if self.field_mut(id, relation).is_some() {
            self.cleared.insert((id.clone(), relation));
        }
    }

    /// Record a single-valued field left untouched
    pub fn conflict(&mut self, conflict: Conflict) {
        if self.conflicts.contains(&conflict) {
            return;
        }
        tracing::warn!(%conflict, "single-valued field already set, not overwriting");
        self.conflicts.push(conflict);
    }

    /// Number of edge changes planned so far
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Record a broken cycle
    pub fn cycle(&mut self, cycle: BrokenCycle) {
        tracing::info!(%cycle, "broke cycle");
        self.cycles.push(cycle);
    }

    fn log(&mut self, id: &EntityId, relation: Relation, target: &EntityId, kind: ChangeKind) {
        let change = EdgeChange {
            entity: id.clone(),
            relation,
            target: target.clone(),
            kind,
        };
        tracing::debug!(%change, "planned edge change");
        self.changes.push(change);
    }

    /// Fold edits into one write per entity
    #[must_use]
    pub fn finish(self) -> Plan {
        let mut patches = Vec::new();

        for (id, fields) in &self.working {
            let Some(entity) = self.graph.get(id.as_str()) else {
                continue;
            };
            let mut updates = FieldUpdates::new();

            for (relation, items) in fields {
                let name = relation.field_name().to_string();
                if self.cleared.contains(&(id.clone(), *relation)) {
                    updates.insert(name, FieldUpdate::Remove);
                    continue;
                }
                let original: IndexSet<EntityId> = entity.related(*relation).cloned().collect();
                if original == *items {
                    continue;
                }
                let update = match relation.cardinality() {
                    Cardinality::Many => {
                        FieldUpdate::Set(FieldValue::list(items.iter().map(EntityId::as_str)))
                    }
                    Cardinality::One => match items.first() {
                        Some(first) => FieldUpdate::Set(FieldValue::scalar(first.as_str())),
                        None => FieldUpdate::Remove,
                    },
                };
                updates.insert(name, update);
            }

            if !updates.is_empty() {
                patches.push(RecordPatch {
                    entity: id.clone(),
                    key: entity.key.clone(),
                    updates,
                });
            }
        }

        Plan {
            patches,
            changes: self.changes,
            conflicts: self.conflicts,
            cycles: self.cycles,
        }
    }
}
