//! Brute-force k-nearest-neighbours regression (Euclidean, uniform weights).

use super::{
    ModelKind, Regressor, check_fit_input, check_predict_input, param_as_count, unknown_param,
};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    /// Neighbours averaged per prediction (clipped to the training size).
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KNeighborsRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl KNeighborsRegressor {
    pub fn new() -> Self {
        Self {
            n_neighbors: 5,
            x_train: None,
            y_train: None,
        }
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    fn predict_row(&self, x_train: &Array2<f64>, y_train: &Array1<f64>, row: ArrayView1<f64>) -> f64 {
        let mut distances: Vec<(f64, usize)> = x_train
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, train_row)| {
                let d: f64 = train_row
                    .iter()
                    .zip(row.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (d, i)
            })
            .collect();

        let k = self.n_neighbors.min(distances.len());
        // Equal distances resolve by training order.
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        distances[..k].iter().map(|&(_, i)| y_train[i]).sum::<f64>() / k as f64
    }
}

impl Regressor for KNeighborsRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (Some(x_train), Some(y_train)) = (&self.x_train, &self.y_train) else {
            return Err(LearningError::NotFitted);
        };
        check_predict_input(x, x_train.ncols())?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.predict_row(x_train, y_train, row))
            .collect())
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "n_neighbors" => self.n_neighbors = param_as_count(name, value)?,
            _ => return Err(unknown_param(ModelKind::KNeighbors, name)),
        }
        Ok(())
    }
}
