//! In-memory queue storage for tests and ephemeral use.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::traits::QueueStore;
use crate::domain::QueueItem;
use crate::error::{Result, TourneyError};

/// Queue storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    items: Mutex<Vec<QueueItem>>,
    fail_writes: AtomicBool,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `items` already stored.
    pub fn with_items(items: Vec<QueueItem>) -> Self {
        Self {
            items: Mutex::new(items),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following write fail, simulating an unavailable medium.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current stored contents.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TourneyError::Storage("memory store rejects writes".to_string()));
        }
        Ok(())
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> Result<Vec<QueueItem>> {
        let items = self.items.lock().map_err(|e| TourneyError::Storage(e.to_string()))?;
        Ok(items.clone())
    }

    fn append(&self, item: &QueueItem) -> Result<()> {
        self.check_writable()?;
        let mut items = self.items.lock().map_err(|e| TourneyError::Storage(e.to_string()))?;
        items.push(item.clone());
        Ok(())
    }

    fn replace_all(&self, items: &[QueueItem]) -> Result<()> {
        self.check_writable()?;
        let mut stored = self.items.lock().map_err(|e| TourneyError::Storage(e.to_string()))?;
        *stored = items.to_vec();
        Ok(())
    }
}

/// Shared handles work as stores too, so tests can keep inspecting a store
/// after handing it to a queue.
impl<S: QueueStore + ?Sized> QueueStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<QueueItem>> {
        (**self).load()
    }

    fn append(&self, item: &QueueItem) -> Result<()> {
        (**self).append(item)
    }

    fn replace_all(&self, items: &[QueueItem]) -> Result<()> {
        (**self).replace_all(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Operation, RatingTable};

    #[test]
    fn test_append_and_load() {
        let store = MemoryQueueStore::new();
        let item = QueueItem::new(Operation::save_ratings("u", RatingTable::new()));
        store.append(&item).unwrap();
        assert_eq!(store.load().unwrap(), vec![item]);
    }

    #[test]
    fn test_failing_writes() {
        let store = MemoryQueueStore::new();
        store.set_fail_writes(true);
        let item = QueueItem::new(Operation::save_ratings("u", RatingTable::new()));
        assert!(matches!(store.append(&item), Err(TourneyError::Storage(_))));
        assert!(store.snapshot().is_empty());

        store.set_fail_writes(false);
        store.replace_all(&[item.clone()]).unwrap();
        assert_eq!(store.snapshot(), vec![item]);
    }
}
