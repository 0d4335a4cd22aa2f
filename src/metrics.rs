use crate::outcome::OutcomeProbs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Home,
    Draw,
    Away,
}

pub fn classify(home_goals: i32, away_goals: i32) -> MatchOutcome {
    if home_goals > away_goals {
        MatchOutcome::Home
    } else if home_goals < away_goals {
        MatchOutcome::Away
    } else {
        MatchOutcome::Draw
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

/// Scores a prediction series against realized outcomes. Mismatched or
/// empty inputs evaluate to an all-zero report rather than a panic.
pub fn evaluate(predictions: &[OutcomeProbs], outcomes: &[MatchOutcome]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        };
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let (y_home, y_draw, y_away) = match outcome {
            MatchOutcome::Home => (1.0, 0.0, 0.0),
            MatchOutcome::Draw => (0.0, 1.0, 0.0),
            MatchOutcome::Away => (0.0, 0.0, 1.0),
        };
        brier_sum += (p.home - y_home).powi(2)
            + (p.draw - y_draw).powi(2)
            + (p.away - y_away).powi(2);

        let realized = match outcome {
            MatchOutcome::Home => p.home,
            MatchOutcome::Draw => p.draw,
            MatchOutcome::Away => p.away,
        }
        .clamp(1e-12, 1.0);
        log_loss_sum += -realized.ln();

        if argmax(p) == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

fn argmax(p: &OutcomeProbs) -> MatchOutcome {
    if p.home >= p.draw && p.home >= p.away {
        MatchOutcome::Home
    } else if p.away >= p.draw {
        MatchOutcome::Away
    } else {
        MatchOutcome::Draw
    }
}
