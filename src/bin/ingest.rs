use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use fixturecast::dataset;
use fixturecast::provider;

fn main() -> Result<()> {
    let db_path = parse_db_path_arg()
        .or_else(dataset::default_db_path)
        .context("unable to resolve sqlite path")?;

    let league_id = provider::league_id_from_env();
    let today = Utc::now().date_naive();
    let fixtures = provider::fetch_league_fixtures(league_id, today)?;

    let mut conn = dataset::open_db(&db_path)?;
    let upserted = dataset::upsert_matches(&mut conn, &fixtures.completed)?;

    println!("Fixture ingest complete");
    println!("DB: {}", db_path.display());
    println!("League: {league_id}");
    println!("Completed matches upserted: {upserted}");
    println!("Upcoming fixtures seen: {}", fixtures.upcoming.len());

    Ok(())
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
