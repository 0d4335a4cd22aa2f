use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::ident::match_id;
use crate::predictor::PredictedOutcome;
use crate::provider::MatchRecord;

/// One stored prediction, keyed by match identity so the evening run can
/// find it again from a fresh scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPrediction {
    pub id: String,
    pub date: String,
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub prediction: PredictedOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualOutcome {
    pub home_goals: i32,
    pub away_goals: i32,
    pub score: String,
    pub winner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CORRECT")]
    Correct,
    #[serde(rename = "INCORRECT")]
    Incorrect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    #[serde(rename = "match")]
    pub prediction: StoredPrediction,
    pub actual: Option<ActualOutcome>,
    pub status: MatchStatus,
}

pub fn data_dir() -> PathBuf {
    std::env::var("FIXTURECAST_DATA_DIR")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn prediction_path(date_str: &str) -> PathBuf {
    data_dir().join("predictions").join(format!("{date_str}.json"))
}

pub fn result_path(date_str: &str) -> PathBuf {
    data_dir().join("results").join(format!("{date_str}.json"))
}

pub fn save_predictions(predictions: &[StoredPrediction], path: &Path) -> Result<()> {
    write_json(predictions, path)
}

/// None when no prediction file exists for the date; an unreadable file is
/// a real error the run should surface.
pub fn load_predictions(path: &Path) -> Result<Option<Vec<StoredPrediction>>> {
    read_json(path)
}

pub fn save_comparisons(comparisons: &[ComparisonRecord], path: &Path) -> Result<()> {
    write_json(comparisons, path)
}

pub fn load_comparisons(path: &Path) -> Result<Option<Vec<ComparisonRecord>>> {
    read_json(path)
}

/// Joins stored predictions against a freshly fetched completed set. A
/// prediction with no result yet stays PENDING; anything found is graded by
/// comparing winner strings.
pub fn correlate(
    predictions: Vec<StoredPrediction>,
    completed: &[MatchRecord],
) -> Vec<ComparisonRecord> {
    let mut results: HashMap<String, &MatchRecord> = HashMap::new();
    for m in completed {
        if m.is_completed() {
            results.insert(match_id(m.date, &m.home_team, &m.away_team), m);
        }
    }

    predictions
        .into_iter()
        .map(|prediction| {
            let Some(m) = results.get(&prediction.id) else {
                return ComparisonRecord {
                    prediction,
                    actual: None,
                    status: MatchStatus::Pending,
                };
            };
            // Guarded by is_completed above.
            let home_goals = m.home_goals.unwrap_or_default();
            let away_goals = m.away_goals.unwrap_or_default();

            let winner = if home_goals > away_goals {
                prediction.home_team.clone()
            } else if away_goals > home_goals {
                prediction.away_team.clone()
            } else {
                "Draw".to_string()
            };

            let status = if prediction.prediction.winner == winner {
                MatchStatus::Correct
            } else {
                MatchStatus::Incorrect
            };

            ComparisonRecord {
                actual: Some(ActualOutcome {
                    home_goals,
                    away_goals,
                    score: format!("{home_goals}-{away_goals}"),
                    winner,
                }),
                status,
                prediction,
            }
        })
        .collect()
}

/// Whole-file replace through a sibling tmp file, so a failed run never
/// leaves a half-written document behind.
fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create store dir {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize store document")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn stored(id: &str, home: &str, away: &str, winner: &str) -> StoredPrediction {
        StoredPrediction {
            id: id.to_string(),
            date: "2025-01-08".to_string(),
            time: "15:00".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            prediction: PredictedOutcome {
                winner: winner.to_string(),
                score: "2-1".to_string(),
                home_goals: 2.1,
                away_goals: 0.9,
                home_elo: Some(1512),
                away_elo: Some(1488),
                prob_home: 0.55,
                prob_draw: 0.25,
                prob_away: 0.20,
            },
        }
    }

    fn played(home: &str, away: &str, home_goals: i32, away_goals: i32) -> MatchRecord {
        MatchRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            kickoff: None,
            round: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
            home_xg: None,
            away_xg: None,
        }
    }

    #[test]
    fn correlate_grades_found_matches() {
        let completed = vec![played("Arsenal", "Chelsea", 3, 1), played("Wolves", "Leeds", 1, 1)];
        let predictions = vec![
            stored("2025-01-08_arsenal_chelsea", "Arsenal", "Chelsea", "Arsenal"),
            stored("2025-01-08_wolves_leeds", "Wolves", "Leeds", "Wolves"),
            stored("2025-01-08_newcastle_luton", "Newcastle", "Luton", "Draw"),
        ];

        let graded = correlate(predictions, &completed);
        assert_eq!(graded[0].status, MatchStatus::Correct);
        assert_eq!(graded[0].actual.as_ref().unwrap().winner, "Arsenal");
        assert_eq!(graded[0].actual.as_ref().unwrap().score, "3-1");

        assert_eq!(graded[1].status, MatchStatus::Incorrect);
        assert_eq!(graded[1].actual.as_ref().unwrap().winner, "Draw");

        assert_eq!(graded[2].status, MatchStatus::Pending);
        assert!(graded[2].actual.is_none());
    }

    #[test]
    fn draw_requires_exact_equality() {
        let completed = vec![played("Arsenal", "Chelsea", 0, 0)];
        let graded = correlate(
            vec![stored("2025-01-08_arsenal_chelsea", "Arsenal", "Chelsea", "Draw")],
            &completed,
        );
        assert_eq!(graded[0].status, MatchStatus::Correct);
    }

    #[test]
    fn documents_survive_a_round_trip() {
        let dir = std::env::temp_dir().join(format!("fixturecast-store-{}", std::process::id()));
        let path = dir.join("predictions").join("2025-01-08.json");

        let predictions = vec![stored("2025-01-08_arsenal_chelsea", "Arsenal", "Chelsea", "Arsenal")];
        save_predictions(&predictions, &path).unwrap();

        let loaded = load_predictions(&path).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, predictions[0].id);
        assert_eq!(loaded[0].prediction.winner, "Arsenal");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn absent_file_loads_as_none() {
        assert!(load_predictions(Path::new("/nonexistent/2025-01-08.json"))
            .unwrap()
            .is_none());
    }
}
