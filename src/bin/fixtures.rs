use anyhow::Result;
use chrono::Utc;

use fixturecast::artifacts::ArtifactPaths;
use fixturecast::predictor::{self, PredictionContext};
use fixturecast::provider;

/// Lists the next round of fixtures with a prediction for each one.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let today = Utc::now().date_naive();
    let fixtures = provider::fetch_league_fixtures(provider::league_id_from_env(), today)?;
    if fixtures.upcoming.is_empty() {
        println!("No upcoming matches found.");
        return Ok(());
    }

    let round = provider::filter_current_round(&fixtures.upcoming);
    let label = round
        .first()
        .and_then(|m| m.round)
        .map(|r| r.to_string())
        .unwrap_or_else(|| "?".to_string());
    println!("Found {} upcoming matches for round {label}:", round.len());

    let ctx = match PredictionContext::load(&ArtifactPaths::from_env()) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            println!("Trained artifacts unavailable ({err:#}); using random fallback.");
            None
        }
    };

    for (idx, m) in round.iter().enumerate() {
        let p = predictor::predict(ctx.as_ref(), &m.home_team, &m.away_team);
        println!(
            "{}. {} vs {} [{} {}] -> {} {} (H {:.1}% D {:.1}% A {:.1}%)",
            idx + 1,
            m.home_team,
            m.away_team,
            m.date.format("%Y-%m-%d"),
            m.kickoff.as_deref().unwrap_or("--:--"),
            p.winner,
            p.score,
            p.prob_home * 100.0,
            p.prob_draw * 100.0,
            p.prob_away * 100.0,
        );
    }

    Ok(())
}
