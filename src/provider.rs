use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::ident::normalize_team_name;

const LEAGUE_FIXTURES_URL: &str = "https://www.fotmob.com/api/leagues";
pub const DEFAULT_LEAGUE_ID: u32 = 47;

/// One row of the fixtures table, validated at this boundary. Goals are
/// absent for matches that have not been played; expected goals are absent
/// whenever the feed does not carry them.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub kickoff: Option<String>,
    pub round: Option<i64>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
}

impl MatchRecord {
    pub fn is_completed(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    /// Goals and expected goals from `team`'s own perspective, or None when
    /// the team did not play in this match or the match has no result yet.
    /// Missing expected goals count as 0.0.
    pub fn side_stats(&self, team: &str) -> Option<(f64, f64)> {
        let (goals, xg) = if self.home_team == team {
            (self.home_goals?, self.home_xg)
        } else if self.away_team == team {
            (self.away_goals?, self.away_xg)
        } else {
            return None;
        };
        Some((goals as f64, xg.unwrap_or(0.0)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSets {
    pub completed: Vec<MatchRecord>,
    pub upcoming: Vec<MatchRecord>,
}

pub fn league_id_from_env() -> u32 {
    std::env::var("FIXTURECAST_LEAGUE_ID")
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|id| *id != 0)
        .unwrap_or(DEFAULT_LEAGUE_ID)
}

/// Fetches the full fixtures table for one league and splits it into the
/// completed set and the upcoming set relative to `today`.
pub fn fetch_league_fixtures(league_id: u32, today: NaiveDate) -> Result<FixtureSets> {
    let client = http_client()?;
    let url = format!("{LEAGUE_FIXTURES_URL}?id={league_id}&tab=fixtures&type=league&timeZone=UTC");
    let body = fetch_json_cached(client, &url).context("fetch league fixtures failed")?;
    let rows = parse_fixture_table(&body)?;
    Ok(split_fixtures(rows, today))
}

/// Parses the league fixtures payload into match records. An empty or null
/// body is an empty table, not an error; rows missing mandatory fields are
/// dropped here so nothing downstream has to re-validate.
pub fn parse_fixture_table(raw: &str) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid league fixtures json")?;

    let Some(items) = root
        .get("fixtures")
        .and_then(|v| v.get("allMatches"))
        .and_then(|v| v.as_array())
    else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if let Some(record) = parse_match_row(item) {
            out.push(record);
        }
    }
    Ok(out)
}

pub fn split_fixtures(rows: Vec<MatchRecord>, today: NaiveDate) -> FixtureSets {
    let mut sets = FixtureSets::default();
    for row in rows {
        if row.is_completed() {
            sets.completed.push(row);
        } else if row.date >= today {
            sets.upcoming.push(row);
        }
    }
    sets.completed.sort_by_key(|m| m.date);
    sets.upcoming.sort_by_key(|m| m.date);
    sets
}

/// Restricts an upcoming list to the earliest round still to be played. The
/// first fixture by date decides which round that is; fixtures without round
/// information are left untouched.
pub fn filter_current_round(upcoming: &[MatchRecord]) -> Vec<&MatchRecord> {
    let Some(first) = upcoming.iter().min_by_key(|m| m.date) else {
        return Vec::new();
    };
    let Some(current) = first.round else {
        return upcoming.iter().collect();
    };
    upcoming
        .iter()
        .filter(|m| m.round == Some(current))
        .collect()
}

fn parse_match_row(v: &Value) -> Option<MatchRecord> {
    let status = v.get("status")?;
    let utc_time = status.get("utcTime").and_then(|x| x.as_str())?;
    let date = NaiveDate::parse_from_str(utc_time.get(..10)?, "%Y-%m-%d").ok()?;
    let kickoff = utc_time.get(11..16).map(|s| s.to_string());

    let cancelled = status
        .get("cancelled")
        .and_then(|x| x.as_bool())
        .unwrap_or(false);
    let finished = status
        .get("finished")
        .and_then(|x| x.as_bool())
        .unwrap_or(false);
    if cancelled {
        return None;
    }

    let home = v.get("home")?;
    let away = v.get("away")?;
    let home_team = team_name(home)?;
    let away_team = team_name(away)?;

    // Scores only count once the match is over; a live score is not a result.
    let (home_goals, away_goals) = if finished {
        (
            home.get("score").and_then(as_i32),
            away.get("score").and_then(as_i32),
        )
    } else {
        (None, None)
    };

    Some(MatchRecord {
        date,
        kickoff,
        round: v.get("round").and_then(as_i64),
        home_team: normalize_team_name(&home_team),
        away_team: normalize_team_name(&away_team),
        home_goals,
        away_goals,
        home_xg: home.get("xg").and_then(|x| x.as_f64()),
        away_xg: away.get("xg").and_then(|x| x.as_f64()),
    })
}

fn team_name(side: &Value) -> Option<String> {
    let name = side
        .get("longName")
        .and_then(|x| x.as_str())
        .or_else(|| side.get("name").and_then(|x| x.as_str()))?
        .trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}

fn as_i32(v: &Value) -> Option<i32> {
    let n = as_i64(v)?;
    i32::try_from(n).ok()
}

fn as_i64(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES_JSON: &str = r#"{
        "fixtures": {
            "allMatches": [
                {
                    "round": 1,
                    "status": {"utcTime": "2025-08-01T19:00:00Z", "finished": true, "cancelled": false},
                    "home": {"name": "Arsenal", "score": 2, "xg": 1.8},
                    "away": {"name": "Chelsea", "score": 1, "xg": 0.9}
                },
                {
                    "round": 1,
                    "status": {"utcTime": "2025-08-02T14:00:00Z", "finished": true, "cancelled": true},
                    "home": {"name": "Leeds United", "score": 1},
                    "away": {"name": "Luton Town", "score": 0}
                },
                {
                    "round": 2,
                    "status": {"utcTime": "2025-08-09T14:00:00Z", "finished": false, "cancelled": false},
                    "home": {"name": "Newcastle Utd"},
                    "away": {"name": "Arsenal"}
                },
                {
                    "round": 3,
                    "status": {"utcTime": "2025-08-16T14:00:00Z", "finished": false, "cancelled": false},
                    "home": {"name": "Chelsea"},
                    "away": {"name": "Wolves"}
                }
            ]
        }
    }"#;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_normalizes_rows() {
        let rows = parse_fixture_table(FIXTURES_JSON).unwrap();
        assert_eq!(rows.len(), 3, "cancelled match must be dropped");

        let first = &rows[0];
        assert_eq!(first.home_team, "Arsenal");
        assert_eq!(first.home_goals, Some(2));
        assert_eq!(first.home_xg, Some(1.8));
        assert_eq!(first.kickoff.as_deref(), Some("19:00"));

        // Alias applied at the boundary.
        assert_eq!(rows[1].home_team, "Newcastle");
    }

    #[test]
    fn unfinished_match_has_no_result() {
        let rows = parse_fixture_table(FIXTURES_JSON).unwrap();
        assert!(!rows[1].is_completed());
        assert_eq!(rows[1].home_goals, None);
    }

    #[test]
    fn empty_payload_is_an_empty_table() {
        assert!(parse_fixture_table("").unwrap().is_empty());
        assert!(parse_fixture_table("null").unwrap().is_empty());
        assert!(parse_fixture_table("{}").unwrap().is_empty());
    }

    #[test]
    fn split_respects_completion_and_cutoff() {
        let rows = parse_fixture_table(FIXTURES_JSON).unwrap();
        let sets = split_fixtures(rows, day(2025, 8, 10));
        assert_eq!(sets.completed.len(), 1);
        // The 2025-08-09 fixture is already in the past on the 10th.
        assert_eq!(sets.upcoming.len(), 1);
        assert_eq!(sets.upcoming[0].home_team, "Chelsea");
    }

    #[test]
    fn current_round_filter_keeps_earliest_round_only() {
        let rows = parse_fixture_table(FIXTURES_JSON).unwrap();
        let sets = split_fixtures(rows, day(2025, 8, 3));
        let round = filter_current_round(&sets.upcoming);
        assert_eq!(round.len(), 1);
        assert_eq!(round[0].round, Some(2));
    }

    #[test]
    fn side_stats_take_the_team_perspective() {
        let rows = parse_fixture_table(FIXTURES_JSON).unwrap();
        let m = &rows[0];
        assert_eq!(m.side_stats("Arsenal"), Some((2.0, 1.8)));
        assert_eq!(m.side_stats("Chelsea"), Some((1.0, 0.9)));
        assert_eq!(m.side_stats("Wolves"), None);
    }
}
