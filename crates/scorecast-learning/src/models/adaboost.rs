//! AdaBoost.R2 with linear loss over shallow regression trees.
//!
//! Each round fits a depth-3 tree on a bootstrap resample drawn with the
//! current sample weights, then reweights samples by their normalized
//! error. Prediction is the weighted median of the estimators.

use super::tree::DecisionTreeRegressor;
use super::{
    ModelKind, Regressor, check_fit_input, check_predict_input, param_as_count,
    param_as_positive, rng_from_seed, unknown_param,
};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const BASE_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    seed: Option<u64>,
    estimators: Vec<DecisionTreeRegressor>,
    estimator_weights: Vec<f64>,
    n_features: usize,
}

impl AdaBoostRegressor {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            seed,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_fitted_estimators(&self) -> usize {
        self.estimators.len()
    }
}

/// Draw `n` indices with probability proportional to `weights`.
fn weighted_bootstrap(weights: &[f64], rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for w in weights {
        total += w;
        cumulative.push(total);
    }
    let last = weights.len() - 1;
    (0..weights.len())
        .map(|_| {
            let u = rng.gen_range(0.0..total);
            cumulative.partition_point(|&c| c <= u).min(last)
        })
        .collect()
}

/// Value at which the cumulative estimator weight first reaches half.
fn weighted_median(values: &mut [(f64, f64)]) -> f64 {
    values.sort_by(|a, b| a.0.total_cmp(&b.0));
    let half = values.iter().map(|(_, w)| w).sum::<f64>() / 2.0;
    let mut acc = 0.0;
    for &(value, weight) in values.iter() {
        acc += weight;
        if acc >= half {
            return value;
        }
    }
    values.last().map(|v| v.0).unwrap_or(0.0)
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let mut rng = rng_from_seed(self.seed);
        let mut sample_weights = vec![1.0 / n as f64; n];

        self.estimators.clear();
        self.estimator_weights.clear();
        self.n_features = x.ncols();

        for round in 0..self.n_estimators {
            let rows = weighted_bootstrap(&sample_weights, &mut rng);
            let mut tree = DecisionTreeRegressor::new().with_max_depth(BASE_MAX_DEPTH);
            tree.fit_rows(x, y, &rows)?;
            let prediction = tree.predict(x)?;

            let mut errors: Vec<f64> = prediction
                .iter()
                .zip(y.iter())
                .map(|(p, t)| (p - t).abs())
                .collect();
            let max_error = errors.iter().cloned().fold(0.0f64, f64::max);
            if max_error > 0.0 {
                errors.iter_mut().for_each(|e| *e /= max_error);
            }

            let estimator_error: f64 = errors
                .iter()
                .zip(&sample_weights)
                .map(|(e, w)| e * w)
                .sum();

            if estimator_error <= 0.0 {
                // Perfect fit: nothing left to boost.
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }

            if estimator_error >= 0.5 {
                // Worse than chance; keep it only if nothing else was learned.
                if self.estimators.is_empty() {
                    self.estimators.push(tree);
                    self.estimator_weights.push(1.0);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            self.estimators.push(tree);
            self.estimator_weights
                .push(self.learning_rate * (1.0 / beta).ln());

            if round + 1 < self.n_estimators {
                for (w, e) in sample_weights.iter_mut().zip(&errors) {
                    *w *= beta.powf((1.0 - e) * self.learning_rate);
                }
                let total: f64 = sample_weights.iter().sum();
                if total <= 0.0 || !total.is_finite() {
                    break;
                }
                sample_weights.iter_mut().for_each(|w| *w /= total);
            }
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.estimators.is_empty() {
            return Err(LearningError::NotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let per_estimator = self
            .estimators
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut column = Vec::with_capacity(self.estimators.len());
        let predictions = (0..x.nrows())
            .map(|row| {
                column.clear();
                column.extend(
                    per_estimator
                        .iter()
                        .zip(&self.estimator_weights)
                        .map(|(pred, &w)| (pred[row], w)),
                );
                weighted_median(&mut column)
            })
            .collect();
        Ok(predictions)
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = param_as_count(name, value)?,
            "learning_rate" => self.learning_rate = param_as_positive(name, value)?,
            _ => return Err(unknown_param(ModelKind::AdaBoost, name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;
    use crate::models::test_support::{linear_data, step_data};
    use rand::SeedableRng;

    #[test]
    fn test_weighted_median() {
        let mut values = vec![(3.0, 1.0), (1.0, 1.0), (2.0, 1.0)];
        assert_eq!(weighted_median(&mut values), 2.0);

        let mut skewed = vec![(10.0, 5.0), (1.0, 1.0), (2.0, 1.0)];
        assert_eq!(weighted_median(&mut skewed), 10.0);
    }

    #[test]
    fn test_weighted_bootstrap_respects_zero_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let rows = weighted_bootstrap(&[0.0, 1.0, 0.0, 1.0], &mut rng);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|&r| r == 1 || r == 3));
    }

    #[test]
    fn test_stops_on_perfect_fit() {
        let (x, y) = step_data();
        let mut model = AdaBoostRegressor::new(Some(1));
        model.fit(&x, &y).unwrap();
        assert!(model.n_fitted_estimators() <= 50);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (x, y) = linear_data(80, 4);
        let mut a = AdaBoostRegressor::new(Some(9));
        let mut b = AdaBoostRegressor::new(Some(9));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert!(r2_score(&y, &a.predict(&x).unwrap()).unwrap() > 0.8);
    }
}
