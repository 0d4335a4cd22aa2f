use std::collections::HashMap;

use crate::provider::MatchRecord;

/// Rolling window over each team's most recent appearances.
pub const FORM_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormAverages {
    pub goals: f64,
    pub xg: f64,
}

/// Per-team scoring history for the chronological training pass. Averages
/// are read before a match is recorded, so every lookup sees only strictly
/// earlier matches.
#[derive(Debug, Clone)]
pub struct FormTracker {
    window: usize,
    histories: HashMap<String, Vec<(f64, f64)>>,
}

impl Default for FormTracker {
    fn default() -> Self {
        Self::new(FORM_WINDOW)
    }
}

impl FormTracker {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            histories: HashMap::new(),
        }
    }

    /// Average goals and expected goals over the team's last `window`
    /// recorded appearances. A team with no history averages to zero.
    pub fn averages(&self, team: &str) -> FormAverages {
        let Some(history) = self.histories.get(team) else {
            return FormAverages::default();
        };
        window_averages(history, self.window)
    }

    pub fn record(&mut self, team: &str, goals: f64, xg: f64) {
        self.histories
            .entry(team.to_string())
            .or_default()
            .push((goals, xg));
    }
}

/// On-demand variant used at inference time: pick the matches the team
/// appeared in, in date order, and average its last `window` of them. Fed
/// the same table, this agrees with a full `FormTracker` pass.
pub fn latest_form(team: &str, history: &[MatchRecord], window: usize) -> FormAverages {
    let mut appearances: Vec<(&MatchRecord, (f64, f64))> = history
        .iter()
        .filter_map(|m| m.side_stats(team).map(|stats| (m, stats)))
        .collect();
    appearances.sort_by_key(|(m, _)| m.date);

    let entries: Vec<(f64, f64)> = appearances.into_iter().map(|(_, stats)| stats).collect();
    window_averages(&entries, window)
}

fn window_averages(entries: &[(f64, f64)], window: usize) -> FormAverages {
    let recent = &entries[entries.len().saturating_sub(window)..];
    if recent.is_empty() {
        return FormAverages::default();
    }
    let n = recent.len() as f64;
    FormAverages {
        goals: recent.iter().map(|(goals, _)| goals).sum::<f64>() / n,
        xg: recent.iter().map(|(_, xg)| xg).sum::<f64>() / n,
    }
}
