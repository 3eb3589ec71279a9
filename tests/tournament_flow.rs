//! End-to-end tournament flow tests
//!
//! Votes flow from the scheduler through the rating recorder into a JSONL
//! backed queue, survive restarts, and are delivered to a mock remote.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tourney::connectivity::{ConnectivitySignal, QueueDrainer, QueueNotice};
use tourney::domain::{Item, ItemId, Operation, Preference, RatingTable};
use tourney::error::Result;
use tourney::queue::{DrainOutcome, PersistenceQueue, QueueConfig};
use tourney::rating::{Elo, RatingRecorder};
use tourney::remote::{MockRemoteSave, MockResponse};
use tourney::scheduler::{MatchScheduler, SchedulerEvent};

fn items(labels: &[&str]) -> Vec<Item> {
    labels.iter().map(|l| Item::named(*l)).collect()
}

fn pump(rx: &mut mpsc::UnboundedReceiver<SchedulerEvent>, recorder: &mut RatingRecorder<Elo>) {
    while let Ok(event) = rx.try_recv() {
        recorder.apply(&event);
    }
}

/// Vote `Left` on every pair and return the final table.
fn vote_all(labels: &[&str], queue: Arc<PersistenceQueue>) -> RatingTable {
    let items = items(labels);
    let mut recorder = RatingRecorder::new("user-1", &items, Elo::default(), queue);
    let mut scheduler = MatchScheduler::new(items).unwrap();
    let mut rx = scheduler.subscribe();

    while let Some(pair) = scheduler.next_match() {
        scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Left).unwrap();
    }
    pump(&mut rx, &mut recorder);
    recorder.ratings().clone()
}

fn saved_table(operation: &Operation) -> &RatingTable {
    match operation {
        Operation::SaveRatings { ratings, .. } => ratings,
    }
}

#[tokio::test]
async fn test_offline_votes_survive_restart_and_drain_in_order() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let final_table = {
        let queue = Arc::new(PersistenceQueue::open_dir(temp_dir.path(), QueueConfig::default())?);
        let table = vote_all(&["A", "B", "C"], queue.clone());
        assert_eq!(queue.len(), 3);
        table
    };

    // First reconnect fails on the head item
    let ids: Vec<String> = {
        let queue = PersistenceQueue::open_dir(temp_dir.path(), QueueConfig::default())?;
        let ids = queue.get_queue().into_iter().map(|item| item.id).collect::<Vec<_>>();
        assert_eq!(ids.len(), 3);

        let sink = MockRemoteSave::new().with_response(MockResponse::failure("503 Service Unavailable"));
        match queue.drain(&sink).await {
            DrainOutcome::Completed(report) => {
                assert_eq!(report.processed, 0);
                assert_eq!(report.halted_on.as_deref(), Some(ids[0].as_str()));
            }
            DrainOutcome::AlreadyRunning => panic!("No other drain should be running"),
        }
        assert_eq!(sink.call_count(), 1);
        ids
    };

    // The failure count is on disk and nothing was reordered
    let queue = PersistenceQueue::open_dir(temp_dir.path(), QueueConfig::default())?;
    let pending = queue.get_queue();
    assert_eq!(pending.iter().map(|i| i.id.clone()).collect::<Vec<_>>(), ids);
    assert_eq!(pending[0].attempts, 1);
    assert_eq!(pending[1].attempts, 0);

    let sink = MockRemoteSave::new();
    let outcome = queue.drain(&sink).await;
    assert_eq!(outcome.processed(), 3);
    assert!(queue.is_empty());

    let calls = sink.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(user, _)| user == "user-1"));
    assert_eq!(&calls[2].1, &final_table);
    assert_eq!(calls[0].1.get(&ItemId::from("A")).unwrap().wins, 1);

    // Delivered items are gone from disk too
    let reopened = PersistenceQueue::open_dir(temp_dir.path(), QueueConfig::default())?;
    assert!(reopened.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reconnect_triggers_drain() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let queue = Arc::new(PersistenceQueue::open_dir(temp_dir.path(), QueueConfig::default())?);
    let sink = Arc::new(MockRemoteSave::new());

    let signal = ConnectivitySignal::new(false);
    let drainer = Arc::new(QueueDrainer::new(queue.clone(), sink.clone()));
    let mut notices = drainer.subscribe();
    let handle = {
        let drainer = drainer.clone();
        let online = signal.subscribe();
        tokio::spawn(async move { drainer.run(online).await })
    };

    vote_all(&["Ada", "Grace", "Linus"], queue.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sink.call_count(), 0);
    assert_eq!(queue.len(), 3);

    assert!(signal.set_online(true));
    let notice = tokio::time::timeout(Duration::from_secs(5), notices.recv())
        .await
        .expect("drain notice")
        .unwrap();
    assert_eq!(
        notice,
        QueueNotice::Drained {
            processed: 3,
            remaining: 0
        }
    );
    assert_eq!(sink.call_count(), 3);

    drop(signal);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("drainer exits")
        .unwrap();
    Ok(())
}

#[tokio::test]
async fn test_defer_and_undo_session_delivers_every_change() -> Result<()> {
    let queue = Arc::new(PersistenceQueue::in_memory(QueueConfig::default()));
    let items = items(&["A", "B", "C", "D"]);
    let mut recorder = RatingRecorder::new("user-2", &items, Elo::default(), queue.clone());
    let mut scheduler = MatchScheduler::new(items)?;
    let mut rx = scheduler.subscribe();

    // Skip A vs B, then decide everything else
    let first = scheduler.next_match().unwrap();
    assert_eq!(scheduler.defer_current(), Some(first.clone()));
    while let Some(pair) = scheduler.next_match() {
        scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Right)?;
    }
    pump(&mut rx, &mut recorder);
    assert_eq!(queue.len(), 5);

    // Change the last decision
    let undone = scheduler.undo_last_preference().unwrap();
    let again = scheduler.next_match().unwrap();
    assert_eq!(again, undone);
    scheduler.add_preference(&again.left.id, &again.right.id, Preference::Both)?;

    // Come back to the skipped pair
    let skipped = scheduler.next_deferred().unwrap();
    assert_eq!(skipped, first);
    scheduler.add_preference(&skipped.left.id, &skipped.right.id, Preference::Left)?;
    assert!(scheduler.is_complete());
    assert!(scheduler.next_match().is_none());

    pump(&mut rx, &mut recorder);
    // 5 votes, 1 undo, 1 revote, 1 deferred vote
    assert_eq!(queue.len(), 8);

    let sink = MockRemoteSave::new();
    assert_eq!(queue.drain(&sink).await.processed(), 8);

    let pending_tables: Vec<RatingTable> = sink.calls().into_iter().map(|(_, table)| table).collect();
    assert_eq!(pending_tables.last(), Some(recorder.ratings()));

    // The undo save restored the table from before the last vote
    assert_eq!(pending_tables[5], pending_tables[3]);
    Ok(())
}

#[test]
fn test_saved_operation_carries_full_table() {
    let queue = Arc::new(PersistenceQueue::in_memory(QueueConfig::default()));
    let table = vote_all(&["X", "Y"], queue.clone());
    let item = queue.peek().unwrap();
    assert_eq!(saved_table(&item.operation), &table);
    assert_eq!(item.kind(), "save-ratings");
}
