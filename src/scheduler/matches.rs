//! Round-robin match scheduling over a fixed pair sequence.
//!
//! Every unordered pair of the input items is enumerated once at construction,
//! ordered by `(i, j)` with `i < j` over input order. A cursor walks the
//! sequence; decisions are stored under directional keys and kept on a history
//! stack so the latest one can be undone.

use std::collections::{BTreeSet, HashMap, HashSet};

use tokio::sync::mpsc;

use super::events::SchedulerEvent;
use crate::domain::{Item, ItemId, Pair, Preference, PreferenceKey};
use crate::error::{Result, TourneyError};

/// Whether any pair is left in front of the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Cursor is inside the pair sequence
    Scheduling,
    /// Cursor is at the end of the pair sequence
    Exhausted,
}

/// Counts for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub resolved: usize,
    pub deferred: usize,
    pub total: usize,
}

impl Progress {
    pub fn remaining(&self) -> usize {
        self.total - self.resolved
    }
}

/// Serves every pairwise comparison of a set of items exactly once.
///
/// Single-writer: callers must not mutate one scheduler from two places at once.
#[derive(Debug)]
pub struct MatchScheduler {
    items: Vec<Item>,
    pairs: Vec<Pair>,
    positions: HashMap<PreferenceKey, usize>,
    cursor: usize,
    preferences: HashMap<PreferenceKey, Preference>,
    /// Per-index mirror of `preferences`
    resolved: Vec<bool>,
    history: Vec<PreferenceKey>,
    deferred: BTreeSet<usize>,
    events: Option<mpsc::UnboundedSender<SchedulerEvent>>,
    exhausted_sent: bool,
}

impl MatchScheduler {
    /// Build the full pair sequence for `items`. Fewer than two items yields an
    /// empty sequence that starts exhausted.
    pub fn new(items: Vec<Item>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(TourneyError::DuplicateItem(item.id.to_string()));
            }
        }

        let n = items.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n.saturating_sub(1) {
            for j in (i + 1)..n {
                pairs.push(Pair::new(items[i].clone(), items[j].clone()));
            }
        }

        let resolved = vec![false; pairs.len()];
        let positions = pairs.iter().enumerate().map(|(idx, pair)| (pair.key(), idx)).collect();

        tracing::debug!(items = n, pairs = pairs.len(), "Match scheduler created");

        Ok(Self {
            items,
            pairs,
            positions,
            cursor: 0,
            preferences: HashMap::new(),
            resolved,
            history: Vec::new(),
            deferred: BTreeSet::new(),
            events: None,
            exhausted_sent: false,
        })
    }

    /// Attach a subscriber. Replaces any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SchedulerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Return the first unresolved pair at or after the cursor.
    ///
    /// Resolved and deferred pairs are skipped and the cursor advances past
    /// them; the cursor stays on the returned pair, so repeated calls return
    /// the same pair until a decision is recorded. `None` once exhausted.
    pub fn next_match(&mut self) -> Option<Pair> {
        match self.seek() {
            Some(idx) => Some(self.pairs[idx].clone()),
            None => {
                if !self.exhausted_sent {
                    self.exhausted_sent = true;
                    self.emit(SchedulerEvent::Exhausted);
                }
                None
            }
        }
    }

    /// Record a decision for `(left, right)` in that orientation.
    ///
    /// The key must be the pair currently served by [`next_match`](Self::next_match)
    /// or a deferred pair. The cursor is not moved; the next `next_match` skips it.
    pub fn add_preference(&mut self, left: &ItemId, right: &ItemId, value: Preference) -> Result<()> {
        let key = PreferenceKey::new(left.clone(), right.clone());

        let Some(&idx) = self.positions.get(&key) else {
            let reversed = PreferenceKey::new(right.clone(), left.clone());
            if self.positions.contains_key(&reversed) {
                return Err(self.unexpected(key));
            }
            let missing = if self.items.iter().any(|item| &item.id == left) { right } else { left };
            return Err(TourneyError::UnknownItem(missing.to_string()));
        };

        let is_current = self.current_index() == Some(idx);
        if !is_current && !self.deferred.contains(&idx) {
            return Err(self.unexpected(key));
        }

        self.deferred.remove(&idx);
        self.resolved[idx] = true;
        self.preferences.insert(key.clone(), value);
        self.history.push(key);

        tracing::debug!(pair = %self.pairs[idx], preference = ?value, "Preference recorded");
        self.emit(SchedulerEvent::PreferenceRecorded {
            pair: self.pairs[idx].clone(),
            preference: value,
        });
        Ok(())
    }

    /// Skip the current pair without a decision. Returns the deferred pair.
    pub fn defer_current(&mut self) -> Option<Pair> {
        let idx = self.seek()?;
        self.deferred.insert(idx);
        self.cursor = idx + 1;

        let pair = self.pairs[idx].clone();
        tracing::debug!(pair = %pair, "Match deferred");
        self.emit(SchedulerEvent::MatchDeferred { pair: pair.clone() });
        Some(pair)
    }

    /// Pairs skipped via [`defer_current`](Self::defer_current) and not yet resolved, in sequence order.
    pub fn deferred_matches(&self) -> Vec<Pair> {
        self.deferred.iter().map(|&idx| self.pairs[idx].clone()).collect()
    }

    /// The earliest deferred pair, if any.
    pub fn next_deferred(&self) -> Option<Pair> {
        self.deferred.first().map(|&idx| self.pairs[idx].clone())
    }

    /// Remove the most recent decision and rewind the cursor to its pair.
    /// No-op returning `None` on empty history.
    pub fn undo_last_preference(&mut self) -> Option<Pair> {
        let key = self.history.pop()?;
        let preference = self.preferences.remove(&key)?;
        let idx = self.positions[&key];
        self.resolved[idx] = false;

        self.cursor = self.cursor.min(idx);
        self.exhausted_sent = false;

        let pair = self.pairs[idx].clone();
        tracing::debug!(pair = %pair, "Preference undone");
        self.emit(SchedulerEvent::PreferenceUndone {
            pair: pair.clone(),
            preference,
        });
        Some(pair)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The full pair sequence, fixed at construction.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn preferences(&self) -> &HashMap<PreferenceKey, Preference> {
        &self.preferences
    }

    pub fn preference(&self, key: &PreferenceKey) -> Option<Preference> {
        self.preferences.get(key).copied()
    }

    /// Recorded keys, oldest first.
    pub fn history(&self) -> &[PreferenceKey] {
        &self.history
    }

    pub fn state(&self) -> SchedulerState {
        if self.cursor >= self.pairs.len() {
            SchedulerState::Exhausted
        } else {
            SchedulerState::Scheduling
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            resolved: self.preferences.len(),
            deferred: self.deferred.len(),
            total: self.pairs.len(),
        }
    }

    /// True once every pair has a recorded decision.
    pub fn is_complete(&self) -> bool {
        self.preferences.len() == self.pairs.len()
    }

    /// Advance the cursor past resolved and deferred pairs.
    fn seek(&mut self) -> Option<usize> {
        while self.cursor < self.pairs.len() {
            if self.is_settled(self.cursor) {
                self.cursor += 1;
            } else {
                return Some(self.cursor);
            }
        }
        None
    }

    /// Same as `seek` without moving the cursor.
    fn current_index(&self) -> Option<usize> {
        (self.cursor..self.pairs.len()).find(|&idx| !self.is_settled(idx))
    }

    fn is_settled(&self, idx: usize) -> bool {
        self.resolved[idx] || self.deferred.contains(&idx)
    }

    fn unexpected(&self, got: PreferenceKey) -> TourneyError {
        let expected = self
            .current_index()
            .map(|idx| self.pairs[idx].key().to_string())
            .unwrap_or_else(|| "no pending match".to_string());
        TourneyError::UnexpectedPair { expected, got }
    }

    fn emit(&mut self, event: SchedulerEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                self.events = None;
            }
        }
    }
}
