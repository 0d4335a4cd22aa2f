/// Score grid is truncated at this many goals per side; the resulting
/// probability mass is renormalized afterwards.
pub const MAX_GOALS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    pub fn total(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

/// Win/draw/loss probabilities from two independent Poisson goal counts.
///
/// Every score pair (h, a) with both sides up to `max_goals` contributes its
/// joint mass to one of the three buckets. The buckets are renormalized to
/// sum to 1.0 to compensate for the truncation. A raw total of zero (both
/// means so large the grid underflows) is left as all zeros; callers must
/// treat that as degenerate.
pub fn outcome_probabilities(home_xg: f64, away_xg: f64, max_goals: usize) -> OutcomeProbs {
    let pmf_home = poisson_pmf(home_xg, max_goals);
    let pmf_away = poisson_pmf(away_xg, max_goals);

    let mut probs = OutcomeProbs {
        home: 0.0,
        draw: 0.0,
        away: 0.0,
    };
    for (h, p_h) in pmf_home.iter().enumerate() {
        for (a, p_a) in pmf_away.iter().enumerate() {
            let p = p_h * p_a;
            if h > a {
                probs.home += p;
            } else if h < a {
                probs.away += p;
            } else {
                probs.draw += p;
            }
        }
    }

    let total = probs.total();
    if total > 0.0 {
        probs.home /= total;
        probs.draw /= total;
        probs.away /= total;
    }
    probs
}

/// Picks the winner label from the three buckets. The draw takes any tie,
/// including a three-way one; otherwise the strictly larger side wins.
pub fn pick_winner(probs: &OutcomeProbs, home_team: &str, away_team: &str) -> String {
    if probs.draw >= probs.home && probs.draw >= probs.away {
        return "Draw".to_string();
    }
    if probs.home > probs.away {
        home_team.to_string()
    } else if probs.away > probs.home {
        away_team.to_string()
    } else {
        "Draw".to_string()
    }
}

/// P(k; lambda) for k in 0..=max_k via the multiplicative recurrence.
fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}
