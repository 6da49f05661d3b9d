//! Batch runner
//!
//! Runs one operation per call, each inside a gated batch:
//!
//! ```text
//! begin → list + read all records → build graph → plan → write patches → release
//!                                                └──→ layout → materialize
//! ```
//!
//! Records are re-read at the start of every pass; nothing is cached between
//! batches. Unreadable records are skipped, failed writes are reported and
//! never rolled back.

use crate::batch::{BatchGate, BatchKind, BatchToken};
use crate::config::TrellisConfig;
use crate::error::TrellisError;
use crate::materializer::{Diagram, DiagramMaterializer};
use crate::summary::{BatchSummary, WriteFailure};
use std::sync::Arc;
use trellis_graph::{Graph, GraphBuilder, Plan, Reconciler};
use trellis_layout::{LaneLayout, LayoutStrategy};
use trellis_record::{RawRecord, RecordAccessor};

type Pass = fn(&Reconciler, &Graph) -> Plan;

/// Passes run by [`BatchRunner::sync`], in order
const SYNC_PASSES: [(&str, Pass); 4] = [
    ("migrate", Reconciler::migrate_legacy),
    ("restore", Reconciler::restore_bidirectional),
    ("reduce", Reconciler::reduce_transitive),
    ("break_cycles", Reconciler::break_cycles),
];

/// Runs reconcile and layout batches against a record store
pub struct BatchRunner {
    accessor: Arc<dyn RecordAccessor>,
    materializer: Arc<dyn DiagramMaterializer>,
    gate: Arc<BatchGate>,
    reconciler: Reconciler,
    strategy: Box<dyn LayoutStrategy>,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("gate", &self.gate)
            .field("reconciler", &self.reconciler)
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Create runner with the lane layout
    #[must_use]
    pub fn new(
        accessor: Arc<dyn RecordAccessor>,
        materializer: Arc<dyn DiagramMaterializer>,
        config: &TrellisConfig,
    ) -> Self {
        Self {
            accessor,
            materializer,
            gate: Arc::new(BatchGate::new()),
            reconciler: Reconciler::new(config.reconcile.clone()),
            strategy: Box::new(LaneLayout::with_config(config.layout.clone())),
        }
    }

    /// With a different layout strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl LayoutStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Share a gate with other runners or a change watcher
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<BatchGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Gate serializing this runner's batches
    #[must_use]
    pub fn gate(&self) -> &Arc<BatchGate> {
        &self.gate
    }

    /// Add missing sides of bidirectional pairs
    pub async fn restore_bidirectional(&self) -> Result<BatchSummary, TrellisError> {
        self.single_pass(BatchKind::Restore, Reconciler::restore_bidirectional)
            .await
    }

    /// Prune transitively implied edges
    pub async fn reduce_transitive(&self) -> Result<BatchSummary, TrellisError> {
        self.single_pass(BatchKind::Reduce, Reconciler::reduce_transitive)
            .await
    }

    /// Break ordering cycles
    pub async fn break_cycles(&self) -> Result<BatchSummary, TrellisError> {
        self.single_pass(BatchKind::BreakCycles, Reconciler::break_cycles)
            .await
    }

    /// Fold legacy `enables`/`enabled_by` into current fields
    pub async fn migrate_legacy(&self) -> Result<BatchSummary, TrellisError> {
        self.single_pass(BatchKind::Migrate, Reconciler::migrate_legacy)
            .await
    }

    /// Compute the layout and hand it to the materializer
    pub async fn compute_layout(&self) -> Result<BatchSummary, TrellisError> {
        let token = self.gate.begin(BatchKind::Layout).await;
        let mut summary = BatchSummary::new(token.kind());
        let result = self.layout_pass(&token, &mut summary).await;
        finish(result, summary)
    }

    /// Every reconcile pass, then the layout, in one batch
    pub async fn sync(&self) -> Result<BatchSummary, TrellisError> {
        let token = self.gate.begin(BatchKind::Sync).await;
        let mut summary = BatchSummary::new(token.kind());
        let result = async {
            for (name, pass) in SYNC_PASSES {
                tracing::debug!(pass = name, "sync pass");
                self.reconcile_pass(&token, &mut summary, pass).await?;
            }
            self.layout_pass(&token, &mut summary).await
        }
        .await;
        finish(result, summary)
    }

    async fn single_pass(&self, kind: BatchKind, pass: Pass) -> Result<BatchSummary, TrellisError> {
        let token = self.gate.begin(kind).await;
        let mut summary = BatchSummary::new(token.kind());
        let result = self.reconcile_pass(&token, &mut summary, pass).await;
        finish(result, summary)
    }

    async fn reconcile_pass(
        &self,
        token: &BatchToken<'_>,
        summary: &mut BatchSummary,
        pass: Pass,
    ) -> Result<(), TrellisError> {
        let graph = self.load(token, summary).await?;
        let plan = pass(&self.reconciler, &graph);
        summary.record_plan(&plan);
        for cycle in &plan.cycles {
            tracing::info!(%cycle, "cycle broken");
        }
        self.write_plan(token, &plan, summary).await;
        Ok(())
    }

    async fn layout_pass(
        &self,
        token: &BatchToken<'_>,
        summary: &mut BatchSummary,
    ) -> Result<(), TrellisError> {
        let graph = self.load(token, summary).await?;
        let layout = self.strategy.compute(&graph);
        summary.record_layout(&layout);

        let watch_key = self.materializer.watch_key();
        if let Some(key) = &watch_key {
            token.journal_write(key);
        }
        let diagram = Diagram::new(&graph, &layout);
        if let Err(e) = self.materializer.apply(&diagram).await {
            if let Some(key) = &watch_key {
                token.retract_write(key);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Read every record and build a fresh graph
    async fn load(
        &self,
        token: &BatchToken<'_>,
        summary: &mut BatchSummary,
    ) -> Result<Graph, TrellisError> {
        let keys = self.accessor.list().await?;
        let mut records: Vec<RawRecord> = Vec::with_capacity(keys.len());
        let mut skipped = 0;

        for key in &keys {
            match self.accessor.read(key).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(kind = %token.kind(), record = %key, error = %e, "skipping record");
                    skipped += 1;
                }
            }
        }

        summary.records_read = records.len();
        summary.records_skipped = skipped;
        let graph = GraphBuilder::new().build(&records);
        for dangling in graph.dangling() {
            tracing::warn!(
                from = %dangling.from,
                relation = %dangling.relation,
                target = %dangling.target,
                "dangling reference"
            );
        }
        summary.record_graph(&graph);
        Ok(graph)
    }

    /// One write per patch; failures are logged and collected
    async fn write_plan(&self, token: &BatchToken<'_>, plan: &Plan, summary: &mut BatchSummary) {
        for patch in &plan.patches {
            token.journal_write(patch.key.as_str());
            match self.accessor.write(&patch.key, &patch.updates).await {
                Ok(()) => {
                    summary.records_written += 1;
                    tracing::debug!(record = %patch.key, fields = patch.updates.len(), "record written");
                }
                Err(e) => {
                    token.retract_write(patch.key.as_str());
                    tracing::warn!(record = %patch.key, error = %e, "write failed");
                    summary.write_failures.push(WriteFailure {
                        key: patch.key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

fn finish(
    result: Result<(), TrellisError>,
    summary: BatchSummary,
) -> Result<BatchSummary, TrellisError> {
    match result {
        Ok(()) => {
            tracing::info!(operation = %summary.operation, "{summary}");
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(operation = %summary.operation, error = %e, "batch failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use trellis_record::MemoryAccessor;

    #[derive(Default)]
    struct Capture(Mutex<Vec<Diagram>>);

    #[async_trait]
    impl DiagramMaterializer for Capture {
        fn watch_key(&self) -> Option<String> {
            Some("board.canvas".into())
        }

        async fn apply(&self, diagram: &Diagram) -> Result<(), TrellisError> {
            self.0.lock().push(diagram.clone());
            Ok(())
        }
    }

    fn runner(store: MemoryAccessor) -> (BatchRunner, Arc<MemoryAccessor>, Arc<Capture>) {
        let store = Arc::new(store);
        let capture = Arc::new(Capture::default());
        let runner = BatchRunner::new(store.clone(), capture.clone(), &TrellisConfig::default());
        (runner, store, capture)
    }

    #[tokio::test]
    async fn restore_writes_once_per_record() {
        let store = MemoryAccessor::new()
            .with_document("T-001.md", "---\nid: T-001\ndepends_on: [T-002, T-003]\n---\n")
            .with_document("T-002.md", "---\nid: T-002\n---\n")
            .with_document("T-003.md", "---\nid: T-003\n---\n");
        let (runner, store, _) = runner(store);

        let summary = runner.restore_bidirectional().await.unwrap();
        assert_eq!(summary.edges_added, 2);
        assert_eq!(summary.records_written, 2);
        assert_eq!(summary.records_read, 3);
        assert!(store.document(&"T-002.md".into()).unwrap().contains("T-001"));

        assert!(runner.gate().is_echo("T-002.md"));
        assert!(!runner.gate().is_echo("T-001.md"));
    }

    #[tokio::test]
    async fn unparsable_record_is_skipped() {
        let store = MemoryAccessor::new()
            .with_document("M-001.md", "---\nid: M-001\n---\n")
            .with_document("broken.md", "no front matter here");
        let (runner, _, capture) = runner(store);

        let summary = runner.compute_layout().await.unwrap();
        assert_eq!(summary.records_skipped, 1);
        assert_eq!(summary.entities_placed, 1);
        assert_eq!(capture.0.lock().len(), 1);
        assert!(runner.gate().is_echo("board.canvas"));
    }
}
