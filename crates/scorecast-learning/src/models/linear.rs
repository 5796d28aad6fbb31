//! Ordinary least squares with an intercept.
//!
//! Solved through the normal equations on centred data. One-hot blocks are
//! collinear with the intercept, so the Gram matrix is only positive
//! semidefinite; the Cholesky factorization drops columns whose pivot
//! collapses and gives them zero weight, which yields one of the (equally
//! predictive) least-squares solutions.

use super::{ModelKind, Regressor, check_fit_input, check_predict_input, unknown_param};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Relative pivot size below which a column counts as dependent.
const PIVOT_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| LearningError::Computation("empty design matrix".to_string()))?;
        let y_mean = y.sum() / y.len() as f64;

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let gram = xc.t().dot(&xc);
        let rhs = xc.t().dot(&yc);
        let weights = solve_semidefinite(&gram, &rhs)?;

        self.intercept = y_mean - x_mean.dot(&weights);
        self.coefficients = Some(weights);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.coefficients.as_ref().ok_or(LearningError::NotFitted)?;
        check_predict_input(x, weights.len())?;
        Ok(x.dot(weights) + self.intercept)
    }

    fn set_param(&mut self, name: &str, _value: f64) -> Result<()> {
        Err(unknown_param(ModelKind::LinearRegression, name))
    }
}

/// Solve `a * w = b` for symmetric positive semidefinite `a`.
///
/// Columns whose Cholesky pivot falls below tolerance are excluded and get
/// a zero weight.
fn solve_semidefinite(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let max_diag = a.diag().iter().cloned().fold(0.0f64, f64::max);
    let tol = PIVOT_TOLERANCE * max_diag.max(1.0);

    let mut l = Array2::<f64>::zeros((n, n));
    let mut active = vec![false; n];

    for j in 0..n {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if d <= tol {
            continue;
        }
        active[j] = true;
        let pivot = d.sqrt();
        l[[j, j]] = pivot;
        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / pivot;
        }
    }

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        if !active[i] {
            continue;
        }
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * z[k];
        }
        z[i] = s / l[[i, i]];
    }

    // Back substitution: L^T w = z
    let mut w = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        if !active[i] {
            continue;
        }
        let mut s = z[i];
        for k in (i + 1)..n {
            s -= l[[k, i]] * w[k];
        }
        w[i] = s / l[[i, i]];
    }

    if w.iter().any(|v| !v.is_finite()) {
        return Err(LearningError::Computation(
            "normal equations produced non-finite weights".to_string(),
        ));
    }
    Ok(w)
}
