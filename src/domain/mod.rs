//! Domain types for Tourney
//!
//! This module contains all core domain types:
//! - Item: a candidate name with a stable identifier
//! - Pair / PreferenceKey / Preference: one comparison and its recorded decision
//! - Rating / RatingTable: per-item ratings carried in save operations
//! - QueueItem / Operation: deferred persistence operations

pub mod item;
pub mod pair;
pub mod queue_item;
pub mod rating;

pub use item::{Item, ItemId};
pub use pair::{Pair, Preference, PreferenceKey};
pub use queue_item::{Operation, QueueItem, operation_kinds};
pub use rating::{Rating, RatingTable};
