//! Connectivity-triggered drain loop.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::queue::{DrainOutcome, PersistenceQueue};
use crate::remote::RemoteSave;

/// User-facing notices from the drainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueNotice {
    /// A pass delivered at least one item
    Drained { processed: usize, remaining: usize },
}

/// Runs drain passes when the host comes online.
pub struct QueueDrainer {
    queue: Arc<PersistenceQueue>,
    sink: Arc<dyn RemoteSave>,
    notices: broadcast::Sender<QueueNotice>,
}

impl QueueDrainer {
    pub fn new(queue: Arc<PersistenceQueue>, sink: Arc<dyn RemoteSave>) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self { queue, sink, notices }
    }

    /// Receive a notice after every pass that delivered something.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueNotice> {
        self.notices.subscribe()
    }

    /// Run one drain pass now.
    pub async fn drain_now(&self) -> DrainOutcome {
        let outcome = self.queue.drain(self.sink.as_ref()).await;
        if let DrainOutcome::Completed(report) = &outcome {
            if report.processed > 0 {
                // No subscribers is fine
                let _ = self.notices.send(QueueNotice::Drained {
                    processed: report.processed,
                    remaining: self.queue.len(),
                });
            }
        }
        outcome
    }

    /// Drain once if already online, then after every switch to online.
    /// Returns when the signal's sender is gone.
    pub async fn run(&self, mut online: watch::Receiver<bool>) {
        let online_at_start = *online.borrow_and_update();
        if online_at_start {
            tracing::debug!("Online at startup, draining");
            self.drain_now().await;
        }

        // Notifications only fire on real changes, so seeing `true` here
        // means an offline period just ended.
        while online.changed().await.is_ok() {
            let is_online = *online.borrow_and_update();
            if is_online {
                tracing::debug!(pending = self.queue.len(), "Back online, draining");
                self.drain_now().await;
            }
        }

        tracing::debug!("Connectivity signal closed, drainer exiting");
    }
}
