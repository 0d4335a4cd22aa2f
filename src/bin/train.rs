use anyhow::{Context, Result, anyhow};

use fixturecast::artifacts::{self, ArtifactPaths};
use fixturecast::dataset;
use fixturecast::features::{FEATURE_NAMES, TeamEncoder, build_feature_table};
use fixturecast::model::GoalModel;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let paths = ArtifactPaths::from_env();
    let conn = dataset::open_db(&paths.db)?;
    let history = dataset::load_completed(&conn).context("load match history")?;
    if history.is_empty() {
        return Err(anyhow!(
            "no completed matches in {}; run the ingest first",
            paths.db.display()
        ));
    }
    println!("Training on {} matches.", history.len());

    let encoder = TeamEncoder::fit(&history);
    let (rows, elo) = build_feature_table(&history, &encoder);
    if rows.is_empty() {
        return Err(anyhow!("feature pass produced no rows"));
    }

    let features: Vec<[f64; 8]> = rows.iter().map(|r| r.features).collect();
    let home_goals: Vec<f64> = rows.iter().map(|r| r.home_goals).collect();
    let away_goals: Vec<f64> = rows.iter().map(|r| r.away_goals).collect();

    let model_home = GoalModel::fit(&FEATURE_NAMES, &features, &home_goals)
        .context("fit home goals model")?;
    let model_away = GoalModel::fit(&FEATURE_NAMES, &features, &away_goals)
        .context("fit away goals model")?;

    artifacts::save_artifact(&model_home, &paths.model_home)?;
    artifacts::save_artifact(&model_away, &paths.model_away)?;
    artifacts::save_artifact(&encoder, &paths.encoder)?;
    artifacts::save_artifact(&elo, &paths.elo)?;

    println!("Feature rows: {}", rows.len());
    println!("Teams encoded: {}", encoder.team_count());
    println!("Rated teams: {}", elo.team_count());
    println!("Artifacts written next to {}", paths.model_home.display());

    Ok(())
}
