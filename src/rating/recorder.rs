//! Scheduler event subscriber that persists rating changes.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::RatingModel;
use crate::domain::{Item, Operation, Pair, Preference, QueueItem, RatingTable};
use crate::queue::PersistenceQueue;
use crate::scheduler::SchedulerEvent;

/// Keeps a user's rating table in step with scheduler decisions and enqueues
/// a save of the full table after every change.
pub struct RatingRecorder<M: RatingModel> {
    user_id: String,
    model: M,
    table: RatingTable,
    /// Table before each recorded decision, newest last
    snapshots: Vec<RatingTable>,
    queue: Arc<PersistenceQueue>,
}

impl<M: RatingModel> RatingRecorder<M> {
    /// Start every item at the model's initial rating.
    pub fn new(user_id: impl Into<String>, items: &[Item], model: M, queue: Arc<PersistenceQueue>) -> Self {
        let mut table = RatingTable::new();
        for item in items {
            table.insert(item.id.clone(), model.initial());
        }
        Self::with_table(user_id, table, model, queue)
    }

    /// Continue from existing ratings.
    pub fn with_table(user_id: impl Into<String>, table: RatingTable, model: M, queue: Arc<PersistenceQueue>) -> Self {
        Self {
            user_id: user_id.into(),
            model,
            table,
            snapshots: Vec::new(),
            queue,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ratings(&self) -> &RatingTable {
        &self.table
    }

    /// Handle one scheduler event. Returns the queued save, if any.
    pub fn apply(&mut self, event: &SchedulerEvent) -> Option<QueueItem> {
        match event {
            SchedulerEvent::PreferenceRecorded { pair, preference } => {
                self.snapshots.push(self.table.clone());
                self.rate(pair, *preference);
                Some(self.save())
            }
            SchedulerEvent::PreferenceUndone { pair, .. } => {
                let Some(previous) = self.snapshots.pop() else {
                    tracing::warn!(pair = %pair, "Undo without a recorded snapshot, ignoring");
                    return None;
                };
                self.table = previous;
                Some(self.save())
            }
            SchedulerEvent::MatchDeferred { .. } | SchedulerEvent::Exhausted => None,
        }
    }

    /// Consume events until the scheduler is dropped, then return the final table.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SchedulerEvent>) -> RatingTable {
        while let Some(event) = events.recv().await {
            tracing::trace!(event = event.name(), "Recorder received event");
            self.apply(&event);
        }
        self.table
    }

    fn rate(&mut self, pair: &Pair, preference: Preference) {
        let left = self.table.get(&pair.left.id).copied().unwrap_or_else(|| self.model.initial());
        let right = self.table.get(&pair.right.id).copied().unwrap_or_else(|| self.model.initial());

        let (left, right) = self.model.update(&left, &right, preference);
        self.table.insert(pair.left.id.clone(), left);
        self.table.insert(pair.right.id.clone(), right);
    }

    fn save(&self) -> QueueItem {
        self.queue
            .enqueue(Operation::save_ratings(self.user_id.clone(), self.table.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;
    use crate::queue::QueueConfig;
    use crate::rating::Elo;
    use crate::scheduler::MatchScheduler;

    fn setup(labels: &[&str]) -> (MatchScheduler, RatingRecorder<Elo>, Arc<PersistenceQueue>) {
        let items: Vec<Item> = labels.iter().map(|l| Item::named(*l)).collect();
        let queue = Arc::new(PersistenceQueue::in_memory(QueueConfig::default()));
        let recorder = RatingRecorder::new("user-1", &items, Elo::default(), queue.clone());
        let scheduler = MatchScheduler::new(items).unwrap();
        (scheduler, recorder, queue)
    }

    fn rating(recorder: &RatingRecorder<Elo>, id: &str) -> f64 {
        recorder.ratings().get(&ItemId::from(id)).unwrap().value
    }

    #[test]
    fn test_recorded_preference_updates_and_enqueues() {
        let (mut scheduler, mut recorder, queue) = setup(&["A", "B"]);
        let mut rx = scheduler.subscribe();

        let pair = scheduler.next_match().unwrap();
        scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Left).unwrap();

        let saved = recorder.apply(&rx.try_recv().unwrap()).unwrap();
        assert!(rating(&recorder, "A") > rating(&recorder, "B"));
        assert_eq!(queue.len(), 1);
        match saved.operation {
            Operation::SaveRatings { user_id, ratings } => {
                assert_eq!(user_id, "user-1");
                assert_eq!(&ratings, recorder.ratings());
            }
        }
    }

    #[test]
    fn test_undo_restores_previous_table() {
        let (mut scheduler, mut recorder, queue) = setup(&["A", "B", "C"]);
        let mut rx = scheduler.subscribe();
        let before = recorder.ratings().clone();

        let pair = scheduler.next_match().unwrap();
        scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Right).unwrap();
        scheduler.undo_last_preference();

        while let Ok(event) = rx.try_recv() {
            recorder.apply(&event);
        }

        assert_eq!(recorder.ratings(), &before);
        // One save for the vote, one for the restored table
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_deferral_enqueues_nothing() {
        let (mut scheduler, mut recorder, queue) = setup(&["A", "B"]);
        let mut rx = scheduler.subscribe();
        scheduler.defer_current();
        assert!(recorder.apply(&rx.try_recv().unwrap()).is_none());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_run_returns_final_table() {
        let (mut scheduler, recorder, queue) = setup(&["A", "B", "C"]);
        let rx = scheduler.subscribe();
        let handle = tokio::spawn(recorder.run(rx));

        while let Some(pair) = scheduler.next_match() {
            scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Left).unwrap();
        }
        drop(scheduler);

        let table = handle.await.unwrap();
        let ranked: Vec<&str> = table.ranked().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ranked, vec!["A", "B", "C"]);
        assert_eq!(queue.len(), 3);
    }
}
