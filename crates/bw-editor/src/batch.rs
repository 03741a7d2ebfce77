//! Transactions and the batch queue.
//!
//! Two independent paths into a mutable target `T`:
//!
//! - **Batch queue**: `add_operation` enqueues fire-and-forget operations,
//!   kept sorted by descending priority. The queue is flushed when it fills
//!   up, when the host calls `poll` after the flush deadline, or on an
//!   explicit `flush`. Errors are logged and the flush moves on.
//! - **Transaction**: one open at a time. `commit_transaction` runs forward
//!   actions in insertion order; the first failure stops it and every
//!   queued rollback runs in reverse order.
//!
//! The engine never owns the target. Callers pass it into every call that
//! executes operations.

use crate::error::EditorError;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A forward or rollback action.
pub type Action<T> = Box<dyn FnOnce(&mut T) -> Result<(), EditorError>>;

static NEXT_OP: AtomicU64 = AtomicU64::new(0);

// ─── Errors ──────────────────────────────────────────────────────────────

/// Misuse of the transaction API: a programmer error at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchError {
    #[error("illegal state: {message}")]
    IllegalState { message: String },
}

impl BatchError {
    fn illegal(message: impl Into<String>) -> Self {
        BatchError::IllegalState {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BatchError::IllegalState { .. } => "ILLEGAL_STATE",
        }
    }

    pub fn context(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ─── Operations ──────────────────────────────────────────────────────────

/// Which store an operation touches. Used for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Block,
    Canvas,
    Project,
}

pub struct Operation<T> {
    pub id: String,
    pub domain: Domain,
    /// Higher runs first within a batch flush. Ignored by transactions.
    pub priority: i32,
    pub created_at: Instant,
    forward: Action<T>,
    rollback: Option<Action<T>>,
}

impl<T> Operation<T> {
    pub fn new(
        domain: Domain,
        forward: impl FnOnce(&mut T) -> Result<(), EditorError> + 'static,
    ) -> Self {
        let n = NEXT_OP.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("op_{n}"),
            domain,
            priority: 0,
            created_at: Instant::now(),
            forward: Box::new(forward),
            rollback: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_rollback(
        mut self,
        rollback: impl FnOnce(&mut T) -> Result<(), EditorError> + 'static,
    ) -> Self {
        self.rollback = Some(Box::new(rollback));
        self
    }

    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("domain", &self.domain)
            .field("priority", &self.priority)
            .field("has_rollback", &self.rollback.is_some())
            .finish()
    }
}

// ─── Transactions ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Transaction<T> {
    id: String,
    operations: Vec<Operation<T>>,
    started_at: Instant,
}

impl<T> Transaction<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operations(&self) -> &[Operation<T>] {
        &self.operations
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Result of `commit_transaction`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed,
    /// A forward action failed; every rollback has run.
    RolledBack { failed_at: String, error: EditorError },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }
}

// ─── Config & stats ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Queue length that triggers an immediate flush.
    pub max_batch_size: usize,
    /// Deferral before a non-full queue is flushed.
    #[serde(rename = "flush_delay_ms", with = "millis")]
    pub flush_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            flush_delay: Duration::from_millis(16),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Operations handed to `add_operation`.
    pub total_operations: u64,
    /// Operations executed by flushes.
    pub batched_operations: u64,
    pub total_execution_time: Duration,
    /// Downstream recomputations saved: Σ (ops in flush − 1).
    pub render_reduction: u64,
    pub flush_count: u64,
}

impl BatchStats {
    pub fn average_batch_size(&self) -> f64 {
        if self.flush_count == 0 {
            0.0
        } else {
            self.batched_operations as f64 / self.flush_count as f64
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

pub struct BatchEngine<T> {
    config: BatchConfig,
    queue: Vec<Operation<T>>,
    deadline: Option<Instant>,
    transaction: Option<Transaction<T>>,
    next_txn: u64,
    stats: BatchStats,
}

impl<T> Default for BatchEngine<T> {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

impl<T> fmt::Debug for BatchEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchEngine")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("deadline", &self.deadline)
            .field("transaction", &self.transaction.as_ref().map(|t| &t.id))
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T> BatchEngine<T> {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            queue: Vec::new(),
            deadline: None,
            transaction: None,
            next_txn: 0,
            stats: BatchStats::default(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    // ─── Batch queue ─────────────────────────────────────────────────────

    /// Enqueue a fire-and-forget operation.
    ///
    /// Flushes right away once the queue holds `max_batch_size` operations;
    /// otherwise arms the flush deadline if it is not already armed.
    pub fn add_operation(&mut self, op: Operation<T>, target: &mut T) {
        log::trace!("queue {} ({:?}, priority {})", op.id, op.domain, op.priority);
        self.queue.push(op);
        // Stable: equal priorities keep insertion order.
        self.queue.sort_by_key(|op| Reverse(op.priority));
        self.stats.total_operations += 1;

        if self.queue.len() >= self.config.max_batch_size {
            self.flush(target);
        } else if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.config.flush_delay);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Ids of queued operations in execution order.
    pub fn pending_ids(&self) -> Vec<&str> {
        self.queue.iter().map(|op| op.id.as_str()).collect()
    }

    pub fn is_flush_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Host event-loop hook. Flushes if the deadline has passed and
    /// reports whether it did.
    pub fn poll(&mut self, target: &mut T, now: Instant) -> bool {
        if self.is_flush_due(now) {
            self.flush(target);
            true
        } else {
            false
        }
    }

    /// Execute every pending operation now, highest priority first.
    pub fn flush(&mut self, target: &mut T) {
        self.deadline = None;
        let ops = std::mem::take(&mut self.queue);
        if ops.is_empty() {
            return;
        }

        let started = Instant::now();
        let count = ops.len() as u64;
        for op in ops {
            if let Err(err) = (op.forward)(target) {
                log::error!("batched operation {} ({:?}) failed: {err}", op.id, op.domain);
            }
        }

        let elapsed = started.elapsed();
        self.stats.batched_operations += count;
        self.stats.flush_count += 1;
        self.stats.render_reduction += count.saturating_sub(1);
        self.stats.total_execution_time += elapsed;
        log::debug!("flushed {count} operations in {elapsed:?}");
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BatchStats::default();
    }

    // ─── Transactions ────────────────────────────────────────────────────

    /// Open the transaction. Only one may be open at a time.
    pub fn begin_transaction(&mut self, id: Option<&str>) -> Result<&Transaction<T>, BatchError> {
        if let Some(open) = &self.transaction {
            return Err(BatchError::illegal(format!(
                "transaction {} is already open",
                open.id
            )));
        }
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                self.next_txn += 1;
                format!("txn_{}", self.next_txn)
            }
        };
        log::debug!("begin transaction {id}");
        Ok(self.transaction.insert(Transaction {
            id,
            operations: Vec::new(),
            started_at: Instant::now(),
        }))
    }

    pub fn add_to_transaction(&mut self, op: Operation<T>) -> Result<(), BatchError> {
        let txn = self
            .transaction
            .as_mut()
            .ok_or_else(|| BatchError::illegal("no open transaction to add to"))?;
        txn.operations.push(op);
        Ok(())
    }

    pub fn active_transaction(&self) -> Option<&Transaction<T>> {
        self.transaction.as_ref()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Run the open transaction's forward actions in order.
    ///
    /// On the first failure the remaining forwards are skipped, every
    /// rollback runs in reverse and the failure is reported in the outcome.
    /// `Err` only means there was no open transaction.
    pub fn commit_transaction(&mut self, target: &mut T) -> Result<CommitOutcome, BatchError> {
        let txn = self
            .transaction
            .take()
            .ok_or_else(|| BatchError::illegal("no open transaction to commit"))?;

        let mut forwards = Vec::with_capacity(txn.operations.len());
        let mut rollbacks = Vec::with_capacity(txn.operations.len());
        for op in txn.operations {
            forwards.push((op.id.clone(), op.forward));
            rollbacks.push((op.id, op.rollback));
        }

        for (op_id, forward) in forwards {
            if let Err(error) = forward(target) {
                log::warn!(
                    "transaction {} failed at {op_id}: {error}; rolling back",
                    txn.id
                );
                run_rollbacks(&txn.id, rollbacks, target);
                return Ok(CommitOutcome::RolledBack {
                    failed_at: op_id,
                    error,
                });
            }
        }

        log::debug!(
            "committed transaction {} in {:?}",
            txn.id,
            txn.started_at.elapsed()
        );
        Ok(CommitOutcome::Committed)
    }

    /// Discard the open transaction, running its rollbacks in reverse.
    /// Rollback failures are logged; the slot is cleared regardless.
    pub fn rollback_transaction(&mut self, target: &mut T) -> Result<(), BatchError> {
        let txn = self
            .transaction
            .take()
            .ok_or_else(|| BatchError::illegal("no open transaction to roll back"))?;
        let rollbacks = txn
            .operations
            .into_iter()
            .map(|op| (op.id, op.rollback))
            .collect();
        run_rollbacks(&txn.id, rollbacks, target);
        Ok(())
    }
}

fn run_rollbacks<T>(txn_id: &str, rollbacks: Vec<(String, Option<Action<T>>)>, target: &mut T) {
    for (op_id, rollback) in rollbacks.into_iter().rev() {
        if let Some(rollback) = rollback
            && let Err(err) = rollback(target)
        {
            log::error!("rollback of {op_id} in transaction {txn_id} failed: {err}");
        }
    }
    log::debug!("rolled back transaction {txn_id}");
}
