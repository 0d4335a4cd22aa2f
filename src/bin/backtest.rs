use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use fixturecast::dataset;
use fixturecast::form::{FORM_WINDOW, FormTracker};
use fixturecast::metrics::{self, MatchOutcome, Metrics};
use fixturecast::outcome::{self, MAX_GOALS, OutcomeProbs};

// Floors the Poisson means so a team with no attacking signal yet does not
// collapse the grid into a certain 0-0.
const MIN_LAMBDA: f64 = 0.10;

/// Walk-forward scoring of the rolling-xG Poisson baseline over the stored
/// match history. Each match is predicted from strictly earlier matches
/// only, then folded into the trackers.
fn main() -> Result<()> {
    let db_path = parse_db_path_arg()
        .or_else(dataset::default_db_path)
        .context("unable to resolve sqlite path")?;
    let conn = dataset::open_db(&db_path)?;
    let history = dataset::load_completed(&conn).context("load match history")?;
    if history.is_empty() {
        return Err(anyhow!("no completed matches in {}", db_path.display()));
    }

    let mut form = FormTracker::new(FORM_WINDOW);
    let mut seen: HashSet<String> = HashSet::new();

    let mut predictions: Vec<OutcomeProbs> = Vec::new();
    let mut outcomes: Vec<MatchOutcome> = Vec::new();
    let mut skipped = 0usize;

    for m in &history {
        let (Some(home_goals), Some(away_goals)) = (m.home_goals, m.away_goals) else {
            continue;
        };

        if seen.contains(&m.home_team) && seen.contains(&m.away_team) {
            let home_form = form.averages(&m.home_team);
            let away_form = form.averages(&m.away_team);
            predictions.push(outcome::outcome_probabilities(
                home_form.xg.max(MIN_LAMBDA),
                away_form.xg.max(MIN_LAMBDA),
                MAX_GOALS,
            ));
            outcomes.push(metrics::classify(home_goals, away_goals));
        } else {
            skipped += 1;
        }

        form.record(&m.home_team, home_goals as f64, m.home_xg.unwrap_or(0.0));
        form.record(&m.away_team, away_goals as f64, m.away_xg.unwrap_or(0.0));
        seen.insert(m.home_team.clone());
        seen.insert(m.away_team.clone());
    }

    let uniform = vec![
        OutcomeProbs {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        };
        outcomes.len()
    ];

    println!("Backtest over {}", db_path.display());
    println!("Matches: {} scored, {skipped} warmup", outcomes.len());
    report("rolling-xg poisson", metrics::evaluate(&predictions, &outcomes));
    report("uniform baseline", metrics::evaluate(&uniform, &outcomes));

    Ok(())
}

fn report(label: &str, m: Metrics) {
    println!(
        "{label}: samples={} brier={:.4} log_loss={:.4} accuracy={:.3}",
        m.samples, m.brier, m.log_loss, m.accuracy
    );
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
