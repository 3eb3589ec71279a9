//! Rating adapter
//!
//! The scheduler only records decisions. This module turns them into rating
//! updates and save operations:
//! - `RatingModel`: the pluggable update rule
//! - `Elo`: the default rule used by the CLI
//! - `RatingRecorder`: scheduler event subscriber that enqueues saves

mod elo;
mod recorder;

use crate::domain::{Preference, Rating};

pub use elo::Elo;
pub use recorder::RatingRecorder;

/// Computes new ratings for the two sides of a decided pair.
pub trait RatingModel: Send {
    /// Rating given to an item that has not played yet.
    fn initial(&self) -> Rating;

    /// Return the updated `(left, right)` ratings.
    fn update(&self, left: &Rating, right: &Rating, preference: Preference) -> (Rating, Rating);
}
