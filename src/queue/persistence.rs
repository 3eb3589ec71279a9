//! Ordered, durable, at-least-once delivery of persistence operations.
//!
//! Producers `enqueue`; a drain pass walks the queue head first, hands each
//! operation to a [`RemoteSave`] and only removes an item after the remote
//! side confirmed it. The first failure ends the pass with the failed item
//! still at the head, so later operations are never delivered ahead of it.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{Operation, QueueItem};
use crate::error::Result;
use crate::remote::{RemoteSave, SaveOutcome};
use crate::storage::{DEAD_LETTER_COLLECTION, JsonlQueueStore, MemoryQueueStore, PENDING_COLLECTION, QueueStore};

/// Queue behavior settings
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    /// Failed attempts after which an item moves to the dead-letter store.
    /// `None` keeps retrying forever.
    pub max_attempts: Option<u32>,
}

impl QueueConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Items delivered and removed during this pass
    pub processed: usize,
    /// Id of the item that stopped the pass
    pub halted_on: Option<String>,
    /// Failure text from the halting item
    pub error: Option<String>,
    /// Id of the item moved to the dead-letter store during this pass
    pub dead_lettered: Option<String>,
}

impl DrainReport {
    /// True when the pass ran until the queue was empty.
    pub fn is_clean(&self) -> bool {
        self.halted_on.is_none()
    }
}

/// Result of asking the queue to drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    /// Another pass was already in flight; nothing was done
    AlreadyRunning,
}

impl DrainOutcome {
    pub fn processed(&self) -> usize {
        match self {
            DrainOutcome::Completed(report) => report.processed,
            DrainOutcome::AlreadyRunning => 0,
        }
    }
}

/// Clears the in-flight flag on every exit from a drain pass.
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Durable FIFO of pending persistence operations.
///
/// Mutations take a short lock that is never held across an `await`, so
/// producers and the drain pass can share one queue behind an `Arc`.
pub struct PersistenceQueue {
    pending: Mutex<VecDeque<QueueItem>>,
    dead_letters: Mutex<Vec<QueueItem>>,
    store: Box<dyn QueueStore>,
    dead_letter_store: Box<dyn QueueStore>,
    /// Set when a write to `store` failed; the next write rewrites everything.
    needs_resync: AtomicBool,
    draining: AtomicBool,
    config: QueueConfig,
}

impl std::fmt::Debug for PersistenceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceQueue")
            .field("len", &self.len())
            .field("draining", &self.is_draining())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistenceQueue {
    /// Open a queue over the given stores, loading whatever they already hold.
    pub fn open(
        store: impl QueueStore + 'static,
        dead_letter_store: impl QueueStore + 'static,
        config: QueueConfig,
    ) -> Result<Self> {
        let pending: VecDeque<QueueItem> = store.load()?.into();
        let dead_letters = dead_letter_store.load()?;

        if !pending.is_empty() || !dead_letters.is_empty() {
            tracing::info!(
                pending = pending.len(),
                dead_letters = dead_letters.len(),
                "Restored persistence queue"
            );
        }

        Ok(Self {
            pending: Mutex::new(pending),
            dead_letters: Mutex::new(dead_letters),
            store: Box::new(store),
            dead_letter_store: Box::new(dead_letter_store),
            needs_resync: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            config,
        })
    }

    /// Open a queue backed by JSONL files in `dir`.
    pub fn open_dir(dir: impl AsRef<Path>, config: QueueConfig) -> Result<Self> {
        let dir = dir.as_ref();
        Self::open(
            JsonlQueueStore::in_dir(dir, PENDING_COLLECTION)?,
            JsonlQueueStore::in_dir(dir, DEAD_LETTER_COLLECTION)?,
            config,
        )
    }

    /// A queue that does not survive the process.
    pub fn in_memory(config: QueueConfig) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            dead_letters: Mutex::new(Vec::new()),
            store: Box::new(MemoryQueueStore::new()),
            dead_letter_store: Box::new(MemoryQueueStore::new()),
            needs_resync: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Append an operation at the tail. Never fails and never delivers.
    ///
    /// If the durable write fails the item is still queued in memory and the
    /// full queue is rewritten on the next successful write.
    pub fn enqueue(&self, operation: Operation) -> QueueItem {
        let item = QueueItem::new(operation);
        self.enqueue_item(item.clone());
        item
    }

    /// Append an existing item at the tail, keeping its id and attempt count.
    pub fn enqueue_item(&self, item: QueueItem) {
        let mut pending = self.lock_pending();
        pending.push_back(item);
        let tail = pending.back().cloned();

        if self.needs_resync.load(Ordering::Acquire) {
            self.persist(&pending);
        } else if let Some(tail) = tail {
            if let Err(e) = self.store.append(&tail) {
                tracing::error!(item_id = %tail.id, error = %e, "Failed to persist enqueued item");
                self.needs_resync.store(true, Ordering::Release);
            }
        }

        tracing::debug!(len = pending.len(), "Operation enqueued");
    }

    pub fn is_empty(&self) -> bool {
        self.lock_pending().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock_pending().len()
    }

    /// The head item, without removing it.
    pub fn peek(&self) -> Option<QueueItem> {
        self.lock_pending().front().cloned()
    }

    /// Remove and return the head item.
    pub fn dequeue(&self) -> Option<QueueItem> {
        let mut pending = self.lock_pending();
        let head = pending.pop_front();
        if head.is_some() {
            self.persist(&pending);
        }
        head
    }

    /// Snapshot of every pending item, head first.
    pub fn get_queue(&self) -> Vec<QueueItem> {
        self.lock_pending().iter().cloned().collect()
    }

    /// Items evicted after exhausting `max_attempts`, oldest first.
    pub fn dead_letters(&self) -> Vec<QueueItem> {
        self.lock_dead_letters().clone()
    }

    /// Move every dead-lettered item back to the tail with a fresh attempt count.
    /// Returns how many were moved.
    ///
    /// The pending store is written before the dead-letter store is cleared, so
    /// a failure in between leaves the items in both places rather than neither.
    pub fn requeue_dead_letters(&self) -> Result<usize> {
        let revived: Vec<QueueItem> = {
            let dead = self.lock_dead_letters();
            dead.iter()
                .cloned()
                .map(|mut item| {
                    item.attempts = 0;
                    item
                })
                .collect()
        };
        if revived.is_empty() {
            return Ok(0);
        }

        {
            let mut pending = self.lock_pending();
            let mut items: Vec<QueueItem> = pending.iter().cloned().collect();
            items.extend(revived.iter().cloned());
            self.store.replace_all(&items)?;
            pending.extend(revived.iter().cloned());
            self.needs_resync.store(false, Ordering::Release);
        }

        {
            let mut dead = self.lock_dead_letters();
            dead.retain(|item| !revived.iter().any(|r| r.id == item.id));
            self.dead_letter_store.replace_all(&dead)?;
        }

        let count = revived.len();
        tracing::info!(count, "Requeued dead-lettered items");
        Ok(count)
    }

    /// Rewrite the durable store if an earlier write was lost.
    pub fn flush(&self) -> Result<()> {
        if self.needs_resync.load(Ordering::Acquire) {
            let pending = self.lock_pending();
            let items: Vec<QueueItem> = pending.iter().cloned().collect();
            self.store.replace_all(&items)?;
            self.needs_resync.store(false, Ordering::Release);
        }
        Ok(())
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Run one drain pass.
    ///
    /// Delivers head items one at a time, in order, until the queue is empty or
    /// a delivery fails. A failed item stays at the head for the next pass.
    /// Returns [`DrainOutcome::AlreadyRunning`] if a pass is already in flight.
    pub async fn drain(&self, sink: &dyn RemoteSave) -> DrainOutcome {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            tracing::debug!("Drain already in flight, skipping");
            return DrainOutcome::AlreadyRunning;
        };

        let mut report = DrainReport::default();

        while let Some(item) = self.peek() {
            let failure = match deliver(sink, &item.operation).await {
                Ok(outcome) if outcome.success => None,
                Ok(outcome) => Some(outcome.error.unwrap_or_else(|| "remote save reported failure".to_string())),
                Err(e) => Some(e.to_string()),
            };

            match failure {
                None => {
                    self.complete(&item.id);
                    report.processed += 1;
                    tracing::debug!(item_id = %item.id, kind = item.kind(), "Delivered queued operation");
                }
                Some(error) => {
                    tracing::warn!(
                        item_id = %item.id,
                        kind = item.kind(),
                        attempts = item.attempts + 1,
                        error = %error,
                        "Delivery failed, halting drain"
                    );
                    if self.record_failure(&item.id) {
                        report.dead_lettered = Some(item.id.clone());
                    }
                    report.halted_on = Some(item.id);
                    report.error = Some(error);
                    break;
                }
            }
        }

        if report.processed > 0 {
            tracing::info!(processed = report.processed, remaining = self.len(), "Drain pass finished");
        }

        DrainOutcome::Completed(report)
    }

    /// Remove the head if it is still `id`.
    fn complete(&self, id: &str) {
        let mut pending = self.lock_pending();
        if pending.front().map(|head| head.id.as_str()) == Some(id) {
            pending.pop_front();
            self.persist(&pending);
        }
    }

    /// Count a failed attempt on the head item. Returns true if it was moved
    /// to the dead-letter store.
    ///
    /// An exhausted item leaves the pending queue only once the dead-letter
    /// store has accepted it.
    fn record_failure(&self, id: &str) -> bool {
        let mut pending = self.lock_pending();
        let Some(head) = pending.front_mut().filter(|head| head.id == id) else {
            return false;
        };
        head.attempts += 1;

        let exhausted = self.config.max_attempts.is_some_and(|max| head.attempts >= max);
        let mut evicted = false;
        if exhausted {
            let candidate = head.clone();
            match self.dead_letter_store.append(&candidate) {
                Ok(()) => {
                    tracing::warn!(
                        item_id = %candidate.id,
                        attempts = candidate.attempts,
                        "Moved item to dead-letter store"
                    );
                    pending.pop_front();
                    self.lock_dead_letters().push(candidate);
                    evicted = true;
                }
                Err(e) => tracing::error!(
                    item_id = %candidate.id,
                    error = %e,
                    "Failed to persist dead letter, keeping item at the head"
                ),
            }
        }

        self.persist(&pending);
        evicted
    }

    /// Rewrite the durable store from `pending`. Failures are logged and retried
    /// on the next write.
    fn persist(&self, pending: &VecDeque<QueueItem>) {
        let items: Vec<QueueItem> = pending.iter().cloned().collect();
        match self.store.replace_all(&items) {
            Ok(()) => self.needs_resync.store(false, Ordering::Release),
            Err(e) => {
                tracing::error!(len = items.len(), error = %e, "Failed to persist queue");
                self.needs_resync.store(true, Ordering::Release);
            }
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<QueueItem>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_dead_letters(&self) -> MutexGuard<'_, Vec<QueueItem>> {
        self.dead_letters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn deliver(sink: &dyn RemoteSave, operation: &Operation) -> Result<SaveOutcome> {
    match operation {
        Operation::SaveRatings { user_id, ratings } => sink.save(user_id, ratings).await,
    }
}
