//! Scheduler module for pairwise match serving.
//!
//! This module provides:
//! - **MatchScheduler**: enumerates every unordered pair of the input items once,
//!   in a fixed order, and serves them one at a time.
//! - **SchedulerEvent**: notifications a persistence adapter subscribes to, so
//!   scheduling never has to know how decisions are saved.
//!
//! # Example
//!
//! ```
//! use tourney::domain::{Item, Preference};
//! use tourney::scheduler::MatchScheduler;
//!
//! let items = vec![Item::named("Tom"), Item::named("Luna"), Item::named("Milo")];
//! let mut scheduler = MatchScheduler::new(items).unwrap();
//!
//! while let Some(pair) = scheduler.next_match() {
//!     scheduler.add_preference(&pair.left.id, &pair.right.id, Preference::Left).unwrap();
//! }
//! assert!(scheduler.is_complete());
//! ```

mod events;
mod matches;

pub use events::SchedulerEvent;
pub use matches::{MatchScheduler, Progress, SchedulerState};
