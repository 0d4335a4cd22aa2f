use anyhow::{Result, anyhow};
use chrono::Utc;

use fixturecast::artifacts::ArtifactPaths;
use fixturecast::ident::match_id;
use fixturecast::predictor::{self, PredictionContext};
use fixturecast::provider::{self, FixtureSets};
use fixturecast::store::{self, ComparisonRecord, MatchStatus, StoredPrediction};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mode = std::env::args().nth(1).unwrap_or_default();
    match mode.as_str() {
        "morning" => run_morning(),
        "evening" => run_evening(),
        _ => Err(anyhow!("usage: fixturecast <morning|evening>")),
    }
}

/// Generates and stores predictions for every fixture kicking off today.
/// Missing data degrades to an empty-but-valid output file; missing trained
/// artifacts degrade each prediction to the random fallback.
fn run_morning() -> Result<()> {
    println!("Starting morning job (predictions)");
    let today = Utc::now().date_naive();
    let date_str = today.format("%Y-%m-%d").to_string();
    println!("Target date: {date_str}");

    let fixtures = fetch_or_empty(today);
    let output_path = store::prediction_path(&date_str);

    let todays: Vec<_> = fixtures
        .upcoming
        .iter()
        .filter(|m| m.date == today)
        .collect();
    if todays.is_empty() {
        println!("No matches scheduled for {date_str}.");
        store::save_predictions(&[], &output_path)?;
        return Ok(());
    }
    println!("Found {} matches for today.", todays.len());

    let ctx = load_context_or_report();

    let mut predictions = Vec::with_capacity(todays.len());
    for m in todays {
        let prediction = predictor::predict(ctx.as_ref(), &m.home_team, &m.away_team);
        predictions.push(StoredPrediction {
            id: match_id(m.date, &m.home_team, &m.away_team),
            date: date_str.clone(),
            time: m.kickoff.clone().unwrap_or_else(|| "Unknown".to_string()),
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            prediction,
        });
    }

    store::save_predictions(&predictions, &output_path)?;
    println!(
        "Saved {} predictions to {}",
        predictions.len(),
        output_path.display()
    );
    Ok(())
}

/// Compares today's stored predictions against freshly fetched results.
fn run_evening() -> Result<()> {
    println!("Starting evening job (results)");
    let today = Utc::now().date_naive();
    let date_str = today.format("%Y-%m-%d").to_string();
    println!("Target date: {date_str}");

    let prediction_path = store::prediction_path(&date_str);
    let Some(predictions) = store::load_predictions(&prediction_path)? else {
        println!("No predictions found for {date_str}. Nothing to compare.");
        return Ok(());
    };
    if predictions.is_empty() {
        println!("Prediction file for {date_str} is empty. Nothing to compare.");
        return Ok(());
    }

    let fixtures = fetch_or_empty(today);
    if fixtures.completed.is_empty() {
        println!("No completed matches available yet; everything stays pending.");
    }

    let comparisons = store::correlate(predictions, &fixtures.completed);
    let correct = count_status(&comparisons, MatchStatus::Correct);
    let incorrect = count_status(&comparisons, MatchStatus::Incorrect);
    let pending = count_status(&comparisons, MatchStatus::Pending);
    for c in &comparisons {
        if c.status == MatchStatus::Pending {
            println!("Result not found for {}", c.prediction.id);
        }
    }

    let output_path = store::result_path(&date_str);
    store::save_comparisons(&comparisons, &output_path)?;
    println!(
        "Saved {} comparisons to {} (correct={correct} incorrect={incorrect} pending={pending})",
        comparisons.len(),
        output_path.display()
    );
    Ok(())
}

fn fetch_or_empty(today: chrono::NaiveDate) -> FixtureSets {
    provider::fetch_league_fixtures(provider::league_id_from_env(), today).unwrap_or_else(|err| {
        eprintln!("fixture fetch failed: {err:#}");
        FixtureSets::default()
    })
}

fn load_context_or_report() -> Option<PredictionContext> {
    match PredictionContext::load(&ArtifactPaths::from_env()) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            println!("Trained artifacts unavailable ({err:#}); using random fallback.");
            None
        }
    }
}

fn count_status(comparisons: &[ComparisonRecord], status: MatchStatus) -> usize {
    comparisons.iter().filter(|c| c.status == status).count()
}
