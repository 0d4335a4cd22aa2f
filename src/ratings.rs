use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const INITIAL_RATING: f64 = 1500.0;
pub const DEFAULT_K: f64 = 30.0;

/// Elo book for every team seen so far. Updates must be applied in strict
/// chronological order: each update reads the ratings as they stood before
/// that match, so replaying the same matches in a different order produces a
/// different trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloRatings {
    k: f64,
    ratings: HashMap<String, f64>,
}

impl Default for EloRatings {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl EloRatings {
    pub fn new(k: f64) -> Self {
        Self {
            k,
            ratings: HashMap::new(),
        }
    }

    pub fn rating(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(INITIAL_RATING)
    }

    pub fn team_count(&self) -> usize {
        self.ratings.len()
    }

    /// Applies one finished match and returns the pre-match ratings, which
    /// are what that match's feature row should carry.
    pub fn update(
        &mut self,
        home_team: &str,
        away_team: &str,
        home_goals: i32,
        away_goals: i32,
    ) -> (f64, f64) {
        let rate_home = self.rating(home_team);
        let rate_away = self.rating(away_team);

        let (actual_home, actual_away) = if home_goals > away_goals {
            (1.0, 0.0)
        } else if home_goals < away_goals {
            (0.0, 1.0)
        } else {
            (0.5, 0.5)
        };

        let expected_home = expected_score(rate_home, rate_away);
        let expected_away = expected_score(rate_away, rate_home);

        self.ratings.insert(
            home_team.to_string(),
            rate_home + self.k * (actual_home - expected_home),
        );
        self.ratings.insert(
            away_team.to_string(),
            rate_away + self.k * (actual_away - expected_away),
        );

        (rate_home, rate_away)
    }
}

pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) / 400.0))
}
