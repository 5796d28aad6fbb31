//! Bagged regression trees averaged at prediction time.

use super::tree::DecisionTreeRegressor;
use super::{
    ModelKind, Regressor, check_fit_input, check_predict_input, param_as_count, rng_from_seed,
    unknown_param,
};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    /// Depth limit for every tree; `None` grows them fully
    pub max_depth: Option<usize>,
    seed: Option<u64>,
    trees: Vec<DecisionTreeRegressor>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            seed,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let mut rng = rng_from_seed(self.seed);

        self.trees.clear();
        self.n_features = x.ncols();

        for _ in 0..self.n_estimators {
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut tree = DecisionTreeRegressor::new();
            tree.max_depth = self.max_depth;
            tree.fit_rows(x, y, &rows)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(LearningError::NotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            sum = sum + tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = param_as_count(name, value)?,
            "max_depth" => self.max_depth = Some(param_as_count(name, value)?),
            _ => return Err(unknown_param(ModelKind::RandomForest, name)),
        }
        Ok(())
    }
}
