//! Batch gate
//!
//! At most one batch runs at a time. A batch starts by taking a
//! [`BatchToken`] from the [`BatchGate`]:
//! - [`BatchGate::begin`] waits in line (first come, first served)
//! - [`BatchGate::try_begin`] rejects with [`TrellisError::Busy`]
//!
//! Every write a batch makes is journaled through its token. A change
//! watcher asks [`BatchGate::is_echo`] before reacting to a notification; each
//! journaled write swallows exactly one notification for its key, so the
//! batch's own writes never re-trigger the pipeline.

use crate::error::TrellisError;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

/// Operation a batch performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Restore bidirectional pairs
    Restore,
    /// Transitive reduction
    Reduce,
    /// Break ordering cycles
    BreakCycles,
    /// Migrate legacy fields
    Migrate,
    /// Compute and materialize the layout
    Layout,
    /// All reconcile passes, then layout
    Sync,
}

impl BatchKind {
    /// Stable name for logs and summaries
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Reduce => "reduce",
            Self::BreakCycles => "break_cycles",
            Self::Migrate => "migrate",
            Self::Layout => "layout",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes batches and journals their writes
#[derive(Debug, Default)]
pub struct BatchGate {
    lock: AsyncMutex<()>,
    active: Mutex<Option<BatchKind>>,
    echoes: DashMap<String, usize>,
}

impl BatchGate {
    /// Create gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a batch, waiting for any running one to finish
    pub async fn begin(&self, kind: BatchKind) -> BatchToken<'_> {
        if let Some(running) = self.active() {
            tracing::debug!(%kind, %running, "batch queued");
        }
        let guard = self.lock.lock().await;
        self.token(kind, guard)
    }

    /// Start a batch only if none is running
    pub fn try_begin(&self, kind: BatchKind) -> Result<BatchToken<'_>, TrellisError> {
        match self.lock.try_lock() {
            Ok(guard) => Ok(self.token(kind, guard)),
            Err(_) => {
                let running = self.active().unwrap_or(kind);
                tracing::debug!(%kind, %running, "batch rejected");
                Err(TrellisError::Busy(running))
            }
        }
    }

    fn token<'a>(&'a self, kind: BatchKind, guard: MutexGuard<'a, ()>) -> BatchToken<'a> {
        *self.active.lock() = Some(kind);
        BatchToken {
            gate: self,
            kind,
            writes: Mutex::new(0),
            _guard: guard,
        }
    }

    /// Batch currently holding the gate
    #[must_use]
    pub fn active(&self) -> Option<BatchKind> {
        *self.active.lock()
    }

    /// Whether a batch is running
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active().is_some()
    }

    /// Consume one journaled write for `key`
    ///
    /// Returns `true` when the notification was caused by a batch write and
    /// should be ignored.
    pub fn is_echo(&self, key: &str) -> bool {
        let mut consumed = false;
        self.echoes.remove_if_mut(key, |_, pending| {
            *pending -= 1;
            consumed = true;
            *pending == 0
        });
        consumed
    }

    /// Writes journaled but not yet echoed
    #[must_use]
    pub fn pending_echoes(&self) -> usize {
        self.echoes.iter().map(|entry| *entry.value()).sum()
    }

    fn journal(&self, key: &str) {
        *self.echoes.entry(key.to_string()).or_insert(0) += 1;
    }

    fn retract(&self, key: &str) {
        self.echoes.remove_if_mut(key, |_, pending| {
            *pending -= 1;
            *pending == 0
        });
    }
}

/// Proof that a batch holds the gate
///
/// Released on drop, which admits the next queued batch.
#[derive(Debug)]
pub struct BatchToken<'a> {
    gate: &'a BatchGate,
    kind: BatchKind,
    writes: Mutex<usize>,
    _guard: MutexGuard<'a, ()>,
}

impl BatchToken<'_> {
    /// Operation of this batch
    #[inline]
    #[must_use]
    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Journal a write about to be made to `key`
    pub fn journal_write(&self, key: &str) {
        self.gate.journal(key);
        *self.writes.lock() += 1;
    }

    /// Withdraw a journaled write that did not happen
    pub fn retract_write(&self, key: &str) {
        self.gate.retract(key);
        let mut writes = self.writes.lock();
        *writes = writes.saturating_sub(1);
    }

    /// Writes made under this token
    #[must_use]
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl Drop for BatchToken<'_> {
    fn drop(&mut self) {
        *self.gate.active.lock() = None;
        tracing::debug!(kind = %self.kind, writes = self.writes(), "batch released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn try_begin_rejects_while_running() {
        let gate = BatchGate::new();
        let token = gate.begin(BatchKind::Restore).await;

        let err = gate.try_begin(BatchKind::Layout).unwrap_err();
        assert!(matches!(err, TrellisError::Busy(BatchKind::Restore)));
        assert_eq!(gate.active(), Some(BatchKind::Restore));

        drop(token);
        assert!(!gate.is_busy());
        assert!(gate.try_begin(BatchKind::Layout).is_ok());
    }

    #[tokio::test]
    async fn begin_queues_in_order() {
        let gate = Arc::new(BatchGate::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = gate.begin(BatchKind::Sync).await;

        let mut handles = Vec::new();
        for kind in [BatchKind::Restore, BatchKind::Reduce, BatchKind::Layout] {
            let (gate, order) = (Arc::clone(&gate), Arc::clone(&order));
            handles.push(tokio::spawn(async move {
                let token = gate.begin(kind).await;
                order.lock().push(token.kind());
            }));
            // let each waiter enqueue before the next one
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(order.lock().is_empty());
        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(
            *order.lock(),
            vec![BatchKind::Restore, BatchKind::Reduce, BatchKind::Layout]
        );
    }

    #[tokio::test]
    async fn each_write_swallows_one_notification() {
        let gate = BatchGate::new();
        {
            let token = gate.begin(BatchKind::Restore).await;
            token.journal_write("stories/S-001.md");
            token.journal_write("stories/S-001.md");
            token.journal_write("tasks/T-001.md");
            token.retract_write("tasks/T-001.md");
            assert_eq!(token.writes(), 2);
        }

        assert_eq!(gate.pending_echoes(), 2);
        assert!(gate.is_echo("stories/S-001.md"));
        assert!(gate.is_echo("stories/S-001.md"));
        assert!(!gate.is_echo("stories/S-001.md"));
        assert!(!gate.is_echo("tasks/T-001.md"));
        assert_eq!(gate.pending_echoes(), 0);
    }
}
