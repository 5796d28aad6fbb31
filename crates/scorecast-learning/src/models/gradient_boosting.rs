//! Least-squares gradient boosting over shallow regression trees.

use super::tree::DecisionTreeRegressor;
use super::{
    ModelKind, Regressor, check_fit_input, check_predict_input, param_as_count,
    param_as_positive, rng_from_seed, unknown_param,
};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows drawn (without replacement) per stage
    pub subsample: f64,
    seed: Option<u64>,
    init: Option<f64>,
    stages: Vec<DecisionTreeRegressor>,
    n_features: usize,
}

impl GradientBoostingRegressor {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            seed,
            init: None,
            stages: Vec::new(),
            n_features: 0,
        }
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let mut rng = rng_from_seed(self.seed);

        let init = y.sum() / n as f64;
        let mut current = Array1::from_elem(n, init);
        let n_sample = ((self.subsample * n as f64).round() as usize).clamp(1, n);
        let mut all_rows: Vec<usize> = (0..n).collect();

        self.stages.clear();
        self.n_features = x.ncols();

        for _ in 0..self.n_estimators {
            let residuals = y - &current;

            let rows = if n_sample < n {
                all_rows.shuffle(&mut rng);
                &all_rows[..n_sample]
            } else {
                &all_rows[..]
            };

            let mut tree = DecisionTreeRegressor::new().with_max_depth(self.max_depth);
            tree.fit_rows(x, &residuals, rows)?;
            current = current + tree.predict(x)? * self.learning_rate;
            self.stages.push(tree);
        }

        self.init = Some(init);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let init = self.init.ok_or(LearningError::NotFitted)?;
        check_predict_input(x, self.n_features)?;

        let mut out = Array1::from_elem(x.nrows(), init);
        for tree in &self.stages {
            out = out + tree.predict(x)? * self.learning_rate;
        }
        Ok(out)
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = param_as_count(name, value)?,
            "learning_rate" => self.learning_rate = param_as_positive(name, value)?,
            "max_depth" => self.max_depth = param_as_count(name, value)?,
            "subsample" => {
                let fraction = param_as_positive(name, value)?;
                if fraction > 1.0 {
                    return Err(LearningError::InvalidConfig(format!(
                        "'subsample' must be in (0, 1], got {value}"
                    )));
                }
                self.subsample = fraction;
            }
            _ => return Err(unknown_param(ModelKind::GradientBoosting, name)),
        }
        Ok(())
    }
}
