//! Pairs, directional preference keys, and decision values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId};

/// One comparison. `left` is always the earlier-indexed item of the input ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub left: Item,
    pub right: Item,
}

impl Pair {
    pub fn new(left: Item, right: Item) -> Self {
        Self { left, right }
    }

    /// Directional key for this pair as served.
    pub fn key(&self) -> PreferenceKey {
        PreferenceKey::new(self.left.id.clone(), self.right.id.clone())
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.left, self.right)
    }
}

/// Composite key over two item ids. `(a, b)` and `(b, a)` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub left: ItemId,
    pub right: ItemId,
}

impl PreferenceKey {
    pub fn new(left: ItemId, right: ItemId) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// Which side of a pair was favored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Left,
    Right,
    /// Both liked equally
    Both,
    /// Neither liked
    Neither,
}

impl Preference {
    /// Score of the left item in `[0, 1]`; draws count as one half.
    pub fn left_score(&self) -> f64 {
        match self {
            Preference::Left => 1.0,
            Preference::Right => 0.0,
            Preference::Both | Preference::Neither => 0.5,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Preference::Both | Preference::Neither)
    }
}
