//! Rating values carried in save operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::ItemId;

/// Rating of a single item plus its win/loss tally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub wins: u32,
    pub losses: u32,
}

impl Rating {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            wins: 0,
            losses: 0,
        }
    }
}

/// Ratings for every item in a tournament, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingTable(BTreeMap<ItemId, Rating>);

impl RatingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every id with the same starting rating.
    pub fn seeded<'a>(ids: impl IntoIterator<Item = &'a ItemId>, initial: f64) -> Self {
        Self(ids.into_iter().map(|id| (id.clone(), Rating::new(initial))).collect())
    }

    pub fn get(&self, id: &ItemId) -> Option<&Rating> {
        self.0.get(id)
    }

    pub fn insert(&mut self, id: ItemId, rating: Rating) -> Option<Rating> {
        self.0.insert(id, rating)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Rating)> {
        self.0.iter()
    }

    /// Items sorted by rating, highest first. Ties keep id order.
    pub fn ranked(&self) -> Vec<(&ItemId, &Rating)> {
        let mut ranked: Vec<_> = self.0.iter().collect();
        ranked.sort_by(|a, b| b.1.value.partial_cmp(&a.1.value).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}
