use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

// Tiny ridge term keeps the normal equations solvable when feature columns
// are collinear (two teams that always met each other, say).
const RIDGE: f64 = 1e-6;

/// A fitted goal regressor. The predictor treats this as a black box: it
/// only ever loads one from disk and calls `predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl GoalModel {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    /// Least-squares fit via the normal equations. Every row must carry one
    /// value per feature name.
    pub fn fit(feature_names: &[&str], rows: &[[f64; 8]], targets: &[f64]) -> Result<Self> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(anyhow!(
                "cannot fit model on {} rows with {} targets",
                rows.len(),
                targets.len()
            ));
        }
        let p = feature_names.len() + 1; // intercept column first

        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, y) in rows.iter().zip(targets) {
            let mut design = Vec::with_capacity(p);
            design.push(1.0);
            design.extend_from_slice(row);
            for i in 0..p {
                xty[i] += design[i] * y;
                for j in 0..p {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }
        for (i, diag_row) in xtx.iter_mut().enumerate() {
            diag_row[i] += RIDGE;
        }

        let solution = solve(xtx, xty)?;
        Ok(Self {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            intercept: solution[0],
            coefficients: solution[1..].to_vec(),
        })
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(anyhow!("singular design matrix at column {col}"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

    #[test]
    fn recovers_a_linear_relationship() {
        // y = 3 + 2*a - d, the rest silent.
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let a = (i % 7) as f64;
            let d = (i % 5) as f64;
            let row = [a, (i % 3) as f64, 0.5, d, 1.0, 2.0, (i % 2) as f64, 0.0];
            rows.push(row);
            targets.push(3.0 + 2.0 * a - d);
        }

        let model = GoalModel::fit(&NAMES, &rows, &targets).unwrap();
        assert!((model.intercept - 3.0).abs() < 1e-3);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-3);
        assert!((model.coefficients[3] + 1.0).abs() < 1e-3);

        let probe = [4.0, 1.0, 0.5, 2.0, 1.0, 2.0, 0.0, 0.0];
        assert!((model.predict(&probe) - 9.0).abs() < 1e-3);
    }

    #[test]
    fn refuses_mismatched_inputs() {
        let rows = [[0.0; 8]];
        assert!(GoalModel::fit(&NAMES, &rows, &[]).is_err());
        assert!(GoalModel::fit(&NAMES, &[], &[1.0]).is_err());
    }

    #[test]
    fn survives_constant_columns() {
        // Columns b..h are constant; ridge keeps the system solvable.
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..10 {
            rows.push([i as f64, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
            targets.push(i as f64 * 0.5);
        }
        let model = GoalModel::fit(&NAMES, &rows, &targets).unwrap();
        assert!((model.coefficients[0] - 0.5).abs() < 1e-3);
    }
}
