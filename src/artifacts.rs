use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dataset;
use crate::features::TeamEncoder;
use crate::model::GoalModel;
use crate::ratings::EloRatings;

/// Locations of the five persisted artifacts the trained path depends on:
/// two goal models, the team encoder, the Elo book, and the match history
/// database. Each one is independently optional on disk; a missing file
/// surfaces as an error naming it, which the caller turns into fallback.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model_home: PathBuf,
    pub model_away: PathBuf,
    pub encoder: PathBuf,
    pub elo: PathBuf,
    pub db: PathBuf,
}

impl ArtifactPaths {
    pub fn from_env() -> Self {
        let dir = env_path("FIXTURECAST_MODEL_DIR").unwrap_or_else(|| PathBuf::from("models"));
        let db = env_path("FIXTURECAST_DB")
            .or_else(dataset::default_db_path)
            .unwrap_or_else(|| dir.join("match_history.sqlite"));
        Self::in_dir(&dir, db)
    }

    pub fn in_dir(dir: &Path, db: PathBuf) -> Self {
        Self {
            model_home: dir.join("model_home.json"),
            model_away: dir.join("model_away.json"),
            encoder: dir.join("team_encoder.json"),
            elo: dir.join("elo_state.json"),
            db,
        }
    }
}

pub fn load_goal_model(path: &Path) -> Result<GoalModel> {
    load_json(path)
}

pub fn load_encoder(path: &Path) -> Result<TeamEncoder> {
    load_json(path)
}

pub fn load_elo(path: &Path) -> Result<EloRatings> {
    load_json(path)
}

pub fn save_artifact<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create artifact dir {}", dir.display()))?;
    }
    let json = serde_json::to_string(value).context("serialize artifact")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write artifact {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap artifact {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("missing artifact {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid artifact {}", path.display()))
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
}
