use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::form::{FORM_WINDOW, FormTracker};
use crate::provider::MatchRecord;
use crate::ratings::EloRatings;

/// Column order of every feature vector, shared by training and inference.
pub const FEATURE_NAMES: [&str; 8] = [
    "home_team_code",
    "away_team_code",
    "home_elo",
    "away_elo",
    "home_rolling_goals",
    "away_rolling_goals",
    "home_rolling_xg",
    "away_rolling_xg",
];

/// Stable mapping from canonical team name to a numeric code. Codes are
/// assigned in sorted-name order, so refitting on the same team set yields
/// the same encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamEncoder {
    codes: HashMap<String, usize>,
}

impl TeamEncoder {
    pub fn fit(matches: &[MatchRecord]) -> Self {
        let names: BTreeSet<&str> = matches
            .iter()
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
            .collect();
        Self {
            codes: names
                .into_iter()
                .enumerate()
                .map(|(code, name)| (name.to_string(), code))
                .collect(),
        }
    }

    pub fn code(&self, team: &str) -> Option<usize> {
        self.codes.get(team).copied()
    }

    pub fn team_count(&self) -> usize {
        self.codes.len()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub features: [f64; 8],
    pub home_goals: f64,
    pub away_goals: f64,
}

/// Single chronological pass producing one feature row per completed match,
/// plus the Elo book as it stands after the final match. Each row sees
/// ratings and form exactly as they were before its own kickoff.
pub fn build_feature_table(
    matches: &[MatchRecord],
    encoder: &TeamEncoder,
) -> (Vec<FeatureRow>, EloRatings) {
    let mut ordered: Vec<&MatchRecord> = matches.iter().filter(|m| m.is_completed()).collect();
    ordered.sort_by_key(|m| m.date);

    let mut elo = EloRatings::default();
    let mut form = FormTracker::new(FORM_WINDOW);
    let mut rows = Vec::with_capacity(ordered.len());

    for m in ordered {
        let (Some(home_code), Some(away_code)) =
            (encoder.code(&m.home_team), encoder.code(&m.away_team))
        else {
            continue;
        };
        let (Some(home_goals), Some(away_goals)) = (m.home_goals, m.away_goals) else {
            continue;
        };

        let home_form = form.averages(&m.home_team);
        let away_form = form.averages(&m.away_team);
        let (home_elo, away_elo) = elo.update(&m.home_team, &m.away_team, home_goals, away_goals);

        rows.push(FeatureRow {
            features: [
                home_code as f64,
                away_code as f64,
                home_elo,
                away_elo,
                home_form.goals,
                away_form.goals,
                home_form.xg,
                away_form.xg,
            ],
            home_goals: home_goals as f64,
            away_goals: away_goals as f64,
        });

        form.record(&m.home_team, home_goals as f64, m.home_xg.unwrap_or(0.0));
        form.record(&m.away_team, away_goals as f64, m.away_xg.unwrap_or(0.0));
    }

    (rows, elo)
}
