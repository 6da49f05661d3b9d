//! Batch summaries
//!
//! Every batch operation reports what it did. The summary serializes for
//! `--json` output and renders a one-line notification through `Display`.

use crate::batch::BatchKind;
use serde::Serialize;
use std::fmt;
use trellis_graph::{BrokenCycle, Conflict, Graph, Plan};
use trellis_layout::LayoutOutput;
use trellis_record::RecordKey;

/// A record write that failed; the batch went on without rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    /// Record that was not written
    pub key: RecordKey,
    /// Accessor error text
    pub error: String,
}

/// Outcome of one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Operation performed
    pub operation: BatchKind,
    /// Records decoded on the last read
    pub records_read: usize,
    /// Records skipped because they could not be read
    pub records_skipped: usize,
    /// Records written
    pub records_written: usize,
    /// Relationship edges added
    pub edges_added: usize,
    /// Relationship edges removed
    pub edges_removed: usize,
    /// Single-valued fields left alone because they name another entity
    pub conflicts: Vec<Conflict>,
    /// Cycles broken, each with the edge removed
    pub cycles: Vec<BrokenCycle>,
    /// Entities given a position
    pub entities_placed: usize,
    /// Graph and layout warnings
    pub warnings: Vec<String>,
    /// Writes that failed
    pub write_failures: Vec<WriteFailure>,
}

impl BatchSummary {
    /// Create empty summary
    #[must_use]
    pub fn new(operation: BatchKind) -> Self {
        Self {
            operation,
            records_read: 0,
            records_skipped: 0,
            records_written: 0,
            edges_added: 0,
            edges_removed: 0,
            conflicts: Vec::new(),
            cycles: Vec::new(),
            entities_placed: 0,
            warnings: Vec::new(),
            write_failures: Vec::new(),
        }
    }

    /// Fold in the counts of a reconcile plan
    pub fn record_plan(&mut self, plan: &Plan) {
        self.edges_added += plan.edges_added();
        self.edges_removed += plan.edges_removed();
        self.conflicts.extend(plan.conflicts.iter().cloned());
        self.cycles.extend(plan.cycles.iter().cloned());
    }

    /// Note build warnings of a freshly built graph
    pub fn record_graph(&mut self, graph: &Graph) {
        for warning in graph.warnings() {
            let text = warning.to_string();
            if !self.warnings.contains(&text) {
                self.warnings.push(text);
            }
        }
    }

    /// Fold in a computed layout
    pub fn record_layout(&mut self, layout: &LayoutOutput) {
        self.entities_placed = layout.placed();
        self.warnings
            .extend(layout.warnings.iter().map(ToString::to_string));
    }

    /// Whether every write succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.write_failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.operation)?;
        match self.operation {
            BatchKind::BreakCycles => write!(
                f,
                "{} cycle(s) broken, {} edge(s) removed",
                self.cycles.len(),
                self.edges_removed
            )?,
            BatchKind::Layout => write!(
                f,
                "{} of {} entities placed",
                self.entities_placed, self.records_read
            )?,
            BatchKind::Sync => write!(
                f,
                "{} edge(s) added, {} removed, {} cycle(s) broken, {} entities placed",
                self.edges_added,
                self.edges_removed,
                self.cycles.len(),
                self.entities_placed
            )?,
            BatchKind::Restore | BatchKind::Reduce | BatchKind::Migrate => write!(
                f,
                "{} edge(s) added, {} removed in {} record(s)",
                self.edges_added, self.edges_removed, self.records_written
            )?,
        }
        if !self.conflicts.is_empty() {
            write!(f, ", {} conflict(s)", self.conflicts.len())?;
        }
        if !self.warnings.is_empty() {
            write!(f, ", {} warning(s)", self.warnings.len())?;
        }
        if self.records_skipped > 0 {
            write!(f, ", {} record(s) skipped", self.records_skipped)?;
        }
        if !self.write_failures.is_empty() {
            write!(f, ", {} write(s) failed", self.write_failures.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_graph::EntityId;

    #[test]
    fn display_cycles() {
        let mut summary = BatchSummary::new(BatchKind::BreakCycles);
        summary.cycles.push(BrokenCycle {
            path: vec![EntityId::new("M-001"), EntityId::new("M-002")],
            removed: (EntityId::new("M-001"), EntityId::new("M-002")),
        });
        summary.edges_removed = 2;

        assert_eq!(
            summary.to_string(),
            "break_cycles: 1 cycle(s) broken, 2 edge(s) removed"
        );
    }

    #[test]
    fn display_notes_failures() {
        let mut summary = BatchSummary::new(BatchKind::Restore);
        summary.edges_added = 3;
        summary.records_written = 2;
        summary.records_skipped = 1;
        summary.write_failures.push(WriteFailure {
            key: RecordKey::new("S-001.md"),
            error: "io".into(),
        });

        assert_eq!(
            summary.to_string(),
            "restore: 3 edge(s) added, 0 removed in 2 record(s), 1 record(s) skipped, 1 write(s) failed"
        );
        assert!(!summary.is_clean());
    }

    #[test]
    fn serializes_operation_name() {
        let summary = BatchSummary::new(BatchKind::Layout);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["operation"], "layout");
        assert_eq!(json["entities_placed"], 0);
    }
}
