//! Notifications emitted by the match scheduler.

use crate::domain::{Pair, Preference};

/// Something changed in the scheduler that a subscriber may need to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// A decision was recorded for `pair`
    PreferenceRecorded { pair: Pair, preference: Preference },
    /// The most recent decision was removed and `pair` will be served again
    PreferenceUndone { pair: Pair, preference: Preference },
    /// `pair` was skipped without a decision
    MatchDeferred { pair: Pair },
    /// The cursor reached the end of the pair sequence
    Exhausted,
}

impl SchedulerEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::PreferenceRecorded { .. } => "preference.recorded",
            SchedulerEvent::PreferenceUndone { .. } => "preference.undone",
            SchedulerEvent::MatchDeferred { .. } => "match.deferred",
            SchedulerEvent::Exhausted => "scheduler.exhausted",
        }
    }
}
