use chrono::NaiveDate;

// Alias table reconciling long-form team names from the fixtures feed with
// the short canonical names used everywhere else in the pipeline. Names not
// listed here pass through unchanged.
const TEAM_ALIASES: &[(&str, &str)] = &[
    ("Manchester Utd", "Manchester United"),
    ("Newcastle Utd", "Newcastle"),
    ("Newcastle United", "Newcastle"),
    ("Nott'ham Forest", "Nottingham Forest"),
    ("Wolverhampton Wanderers", "Wolves"),
    ("West Ham United", "West Ham"),
    ("Brighton & Hove Albion", "Brighton"),
    ("Tottenham Hotspur", "Tottenham"),
    ("Luton Town", "Luton"),
    ("Leeds United", "Leeds"),
    ("Leicester City", "Leicester"),
    ("Norwich City", "Norwich"),
];

pub fn normalize_team_name(name: &str) -> String {
    for (alias, canonical) in TEAM_ALIASES {
        if *alias == name {
            return (*canonical).to_string();
        }
    }
    name.to_string()
}

/// Deterministic identifier joining a prediction to its eventual result.
/// Both sides of the join rebuild the id from their own snapshot, so it must
/// depend only on the date and the normalized team names.
pub fn match_id(date: NaiveDate, home_team: &str, away_team: &str) -> String {
    let raw = format!("{}_{home_team}_{away_team}", date.format("%Y-%m-%d"));
    raw.replace([' ', '/'], "").to_lowercase()
}
