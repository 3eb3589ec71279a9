//! Tourney - pairwise name tournaments that keep votes through connectivity loss
//!
//! Two components do the work:
//! - `scheduler::MatchScheduler` serves every pairwise comparison of a set of
//!   names exactly once, in a fixed order, with undo and deferral.
//! - `queue::PersistenceQueue` stores save operations durably and delivers them
//!   in order, halting on the first failure and retrying on reconnect.
//!
//! `rating::RatingRecorder` connects the two by subscribing to scheduler events.

pub mod connectivity;
pub mod domain;
pub mod error;
pub mod id;
pub mod queue;
pub mod rating;
pub mod remote;
pub mod scheduler;
pub mod storage;

pub use error::{Result, TourneyError};
