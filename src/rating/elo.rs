//! Elo rating rule.

use super::RatingModel;
use crate::domain::{Preference, Rating};

/// Default starting rating
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Default K-factor (maximum change per comparison)
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Classic Elo with a fixed K-factor. Both/neither count as a draw.
#[derive(Debug, Clone, Copy)]
pub struct Elo {
    pub initial: f64,
    pub k_factor: f64,
}

impl Elo {
    pub fn new(initial: f64, k_factor: f64) -> Self {
        Self { initial, k_factor }
    }

    /// Expected score of `a` against `b`.
    pub fn expected(a: f64, b: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((b - a) / 400.0))
    }
}

impl Default for Elo {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_RATING, DEFAULT_K_FACTOR)
    }
}

impl RatingModel for Elo {
    fn initial(&self) -> Rating {
        Rating::new(self.initial)
    }

    fn update(&self, left: &Rating, right: &Rating, preference: Preference) -> (Rating, Rating) {
        let score = preference.left_score();
        let expected = Self::expected(left.value, right.value);
        let delta = self.k_factor * (score - expected);

        let mut new_left = Rating {
            value: left.value + delta,
            ..*left
        };
        let mut new_right = Rating {
            value: right.value - delta,
            ..*right
        };

        match preference {
            Preference::Left => {
                new_left.wins += 1;
                new_right.losses += 1;
            }
            Preference::Right => {
                new_left.losses += 1;
                new_right.wins += 1;
            }
            Preference::Both | Preference::Neither => {}
        }

        (new_left, new_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_equal_ratings() {
        assert!((Elo::expected(1500.0, 1500.0) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_winner_gains_half_k_between_equals() {
        let elo = Elo::default();
        let (left, right) = elo.update(&elo.initial(), &elo.initial(), Preference::Left);
        assert!((left.value - 1516.0).abs() < 1e-9);
        assert!((right.value - 1484.0).abs() < 1e-9);
        assert_eq!((left.wins, left.losses), (1, 0));
        assert_eq!((right.wins, right.losses), (0, 1));
    }

    #[test]
    fn test_draw_between_equals_changes_nothing() {
        let elo = Elo::default();
        let (left, right) = elo.update(&elo.initial(), &elo.initial(), Preference::Both);
        assert_eq!(left, elo.initial());
        assert_eq!(right, elo.initial());
    }

    #[test]
    fn test_draw_pulls_ratings_together() {
        let elo = Elo::default();
        let (left, right) = elo.update(&Rating::new(1600.0), &Rating::new(1400.0), Preference::Neither);
        assert!(left.value < 1600.0);
        assert!(right.value > 1400.0);
    }

    #[test]
    fn test_total_rating_conserved() {
        let elo = Elo::new(1000.0, 24.0);
        let (left, right) = elo.update(&Rating::new(1100.0), &Rating::new(950.0), Preference::Right);
        assert!((left.value + right.value - 2050.0).abs() < 1e-9);
    }
}
