use anyhow::{Context, Result, anyhow};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifacts::{self, ArtifactPaths};
use crate::dataset;
use crate::features::TeamEncoder;
use crate::form::{self, FORM_WINDOW};
use crate::ident::normalize_team_name;
use crate::model::GoalModel;
use crate::outcome::{self, MAX_GOALS};
use crate::provider::MatchRecord;
use crate::ratings::EloRatings;

/// Generic probabilities reported by the random fallback.
const FALLBACK_PROBS: (f64, f64, f64) = (0.33, 0.34, 0.33);

/// Why the trained path declined a fixture. Every variant degrades to the
/// random fallback; nothing here reaches the caller as an error.
#[derive(Debug, Error)]
pub enum PredictFailure {
    #[error("team {0:?} unknown to the encoder")]
    UnseenTeam(String),
    #[error("outcome grid carried no probability mass")]
    DegenerateOutcome,
}

/// Everything the trained path needs, loaded once and passed by reference.
/// Building it up front keeps artifact state out of globals and lets tests
/// assemble synthetic contexts directly.
pub struct PredictionContext {
    pub model_home: GoalModel,
    pub model_away: GoalModel,
    pub encoder: TeamEncoder,
    pub ratings: EloRatings,
    pub history: Vec<MatchRecord>,
}

impl PredictionContext {
    /// Loads all five artifacts; any one missing fails the whole load, and
    /// the caller predicts without a context from then on.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let model_home = artifacts::load_goal_model(&paths.model_home)?;
        let model_away = artifacts::load_goal_model(&paths.model_away)?;
        let encoder = artifacts::load_encoder(&paths.encoder)?;
        let ratings = artifacts::load_elo(&paths.elo)?;

        if !paths.db.exists() {
            return Err(anyhow!("missing artifact {}", paths.db.display()));
        }
        let conn = dataset::open_db(&paths.db)?;
        let history = dataset::load_completed(&conn).context("load match history")?;

        Ok(Self {
            model_home,
            model_away,
            encoder,
            ratings,
            history,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedOutcome {
    pub winner: String,
    pub score: String,
    pub home_goals: f64,
    pub away_goals: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_elo: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_elo: Option<i64>,
    pub prob_home: f64,
    pub prob_draw: f64,
    pub prob_away: f64,
}

/// Predicts one fixture. With no context, or when any stage of the trained
/// pipeline declines, this degrades to the random fallback; it never fails.
pub fn predict(
    ctx: Option<&PredictionContext>,
    home_team: &str,
    away_team: &str,
) -> PredictedOutcome {
    let Some(ctx) = ctx else {
        return random_outcome(home_team, away_team);
    };
    match predict_with_model(ctx, home_team, away_team) {
        Ok(prediction) => prediction,
        Err(_) => random_outcome(home_team, away_team),
    }
}

fn predict_with_model(
    ctx: &PredictionContext,
    home_team: &str,
    away_team: &str,
) -> Result<PredictedOutcome, PredictFailure> {
    let home = normalize_team_name(home_team);
    let away = normalize_team_name(away_team);

    let home_code = ctx
        .encoder
        .code(&home)
        .ok_or_else(|| PredictFailure::UnseenTeam(home.clone()))?;
    let away_code = ctx
        .encoder
        .code(&away)
        .ok_or_else(|| PredictFailure::UnseenTeam(away.clone()))?;

    let home_rating = ctx.ratings.rating(&home);
    let away_rating = ctx.ratings.rating(&away);

    let home_form = form::latest_form(&home, &ctx.history, FORM_WINDOW);
    let away_form = form::latest_form(&away, &ctx.history, FORM_WINDOW);

    let features = [
        home_code as f64,
        away_code as f64,
        home_rating,
        away_rating,
        home_form.goals,
        away_form.goals,
        home_form.xg,
        away_form.xg,
    ];

    let home_xg = ctx.model_home.predict(&features).max(0.0);
    let away_xg = ctx.model_away.predict(&features).max(0.0);

    let probs = outcome::outcome_probabilities(home_xg, away_xg, MAX_GOALS);
    if probs.total() <= 0.0 {
        return Err(PredictFailure::DegenerateOutcome);
    }
    let winner = outcome::pick_winner(&probs, &home, &away);

    Ok(PredictedOutcome {
        winner,
        // Rounded for display; the raw expectations stay in home/away_goals.
        score: format!("{}-{}", home_xg.round() as i64, away_xg.round() as i64),
        home_goals: home_xg,
        away_goals: away_xg,
        home_elo: Some(home_rating.round() as i64),
        away_elo: Some(away_rating.round() as i64),
        prob_home: probs.home,
        prob_draw: probs.draw,
        prob_away: probs.away,
    })
}

/// Uniform scoreline draw over 0..=3 goals per side. Used whenever trained
/// artifacts are absent or the trained pipeline declines a fixture.
pub fn random_outcome(home_team: &str, away_team: &str) -> PredictedOutcome {
    let mut rng = rand::thread_rng();
    let home_goals: i64 = rng.gen_range(0..=3);
    let away_goals: i64 = rng.gen_range(0..=3);

    let winner = if home_goals > away_goals {
        home_team.to_string()
    } else if away_goals > home_goals {
        away_team.to_string()
    } else {
        "Draw".to_string()
    };

    let (prob_home, prob_draw, prob_away) = FALLBACK_PROBS;
    PredictedOutcome {
        winner,
        score: format!("{home_goals}-{away_goals}"),
        home_goals: home_goals as f64,
        away_goals: away_goals as f64,
        home_elo: None,
        away_elo: None,
        prob_home,
        prob_draw,
        prob_away,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::features::{FEATURE_NAMES, TeamEncoder, build_feature_table};
    use crate::model::GoalModel;

    fn result(day: u32, home: &str, away: &str, score: (i32, i32), xg: (f64, f64)) -> MatchRecord {
        MatchRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            kickoff: None,
            round: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: Some(score.0),
            away_goals: Some(score.1),
            home_xg: Some(xg.0),
            away_xg: Some(xg.1),
        }
    }

    fn constant_model(value: f64) -> GoalModel {
        GoalModel {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            coefficients: vec![0.0; 8],
            intercept: value,
        }
    }

    fn synthetic_context() -> PredictionContext {
        let history = vec![
            result(1, "Arsenal", "Chelsea", (2, 1), (1.8, 0.9)),
            result(8, "Chelsea", "Wolves", (1, 1), (1.2, 1.0)),
            result(15, "Wolves", "Arsenal", (0, 3), (0.5, 2.2)),
        ];
        let encoder = TeamEncoder::fit(&history);
        let (_, ratings) = build_feature_table(&history, &encoder);
        PredictionContext {
            model_home: constant_model(2.0),
            model_away: constant_model(0.5),
            encoder,
            ratings,
            history,
        }
    }

    #[test]
    fn fallback_record_is_well_formed() {
        for _ in 0..50 {
            let p = random_outcome("Arsenal", "Chelsea");
            assert!((p.prob_home + p.prob_draw + p.prob_away - 1.0).abs() < 1e-9);
            assert!(p.winner == "Arsenal" || p.winner == "Chelsea" || p.winner == "Draw");
            let (h, a) = p.score.split_once('-').expect("H-A score string");
            let h: i64 = h.parse().unwrap();
            let a: i64 = a.parse().unwrap();
            assert!((0..=3).contains(&h) && (0..=3).contains(&a));
            assert!(p.home_elo.is_none());
        }
    }

    #[test]
    fn no_context_means_fallback() {
        let p = predict(None, "Arsenal", "Chelsea");
        assert_eq!(p.prob_draw, 0.34);
        assert!(p.home_elo.is_none());
    }

    #[test]
    fn trained_path_reports_ratings_and_poisson_probs() {
        let ctx = synthetic_context();
        let p = predict(Some(&ctx), "Arsenal", "Chelsea");
        assert!(p.home_elo.is_some(), "trained path used");
        assert!((p.prob_home + p.prob_draw + p.prob_away - 1.0).abs() < 1e-9);
        assert!((p.home_goals - 2.0).abs() < 1e-9);
        assert_eq!(p.score, "2-1", "0.5 away xg rounds to 1");
        assert!(p.prob_home > p.prob_away, "two-goal edge favours home");
    }

    #[test]
    fn alias_input_reaches_the_trained_path() {
        let ctx = synthetic_context();
        // History knows "Wolves"; callers may still pass the long name.
        let p = predict(Some(&ctx), "Wolverhampton Wanderers", "Arsenal");
        assert!(p.home_elo.is_some());
        assert_eq!(
            p.home_elo,
            Some(ctx.ratings.rating("Wolves").round() as i64)
        );
    }

    #[test]
    fn unseen_team_degrades_to_fallback() {
        let ctx = synthetic_context();
        let p = predict(Some(&ctx), "Barnsley", "Arsenal");
        assert!(p.home_elo.is_none(), "fallback record carries no ratings");
        assert_eq!(p.prob_draw, 0.34);
    }

    #[test]
    fn negative_model_output_is_clamped() {
        let mut ctx = synthetic_context();
        ctx.model_home = constant_model(-3.0);
        ctx.model_away = constant_model(-1.0);
        let p = predict(Some(&ctx), "Arsenal", "Chelsea");
        assert!(p.home_elo.is_some());
        assert_eq!(p.home_goals, 0.0);
        assert_eq!(p.away_goals, 0.0);
        assert_eq!(p.winner, "Draw", "0.0 xg both ways is a certain draw");
    }
}
