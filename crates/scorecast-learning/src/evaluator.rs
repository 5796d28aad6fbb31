//! Model evaluation.
//!
//! This module provides the [`Evaluate`] seam used by the trainer and its
//! production implementation, [`ModelEvaluator`]. Evaluation is
//! all-or-nothing: the first candidate that fails to fit, predict, or
//! produce a finite score aborts the run with
//! [`LearningError::Evaluation`] and no report is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecast_learning::{EvaluationData, Evaluate, ModelEvaluator, catalog};
//!
//! let data = EvaluationData::from_matrices(&train, &test)?;
//! let mut candidates = catalog(None);
//! let report = ModelEvaluator::default().evaluate(&data, &mut candidates)?;
//! for (name, score) in report.test_scores() {
//!     println!("{name}: {score:.4}");
//! }
//! ```

use crate::config::{ParamGrid, TrainerConfig};
use crate::cross_validation::grid_search;
use crate::error::{LearningError, Result};
use crate::metrics::{mean_absolute_error, r2_score, root_mean_squared_error};
use crate::models::{Model, ModelKind, Regressor};
use ndarray::{Array1, Array2, Axis, s};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One named, untrained candidate.
pub type Candidate = (ModelKind, Model);

/// Train/test features and targets.
#[derive(Debug, Clone)]
pub struct EvaluationData {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

impl EvaluationData {
    /// Split the last column off each matrix as its target.
    pub fn from_matrices(train: &Array2<f64>, test: &Array2<f64>) -> Result<Self> {
        if train.ncols() < 2 {
            return Err(LearningError::InvalidInput(format!(
                "training matrix needs features and a target column, got {} columns",
                train.ncols()
            )));
        }
        if train.ncols() != test.ncols() {
            return Err(LearningError::ShapeMismatch {
                expected: format!("{} test columns", train.ncols()),
                actual: format!("{} test columns", test.ncols()),
            });
        }

        let last = train.ncols() - 1;
        Ok(Self {
            x_train: train.slice(s![.., ..last]).to_owned(),
            y_train: train.column(last).to_owned(),
            x_test: test.slice(s![.., ..last]).to_owned(),
            y_test: test.column(last).to_owned(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.x_train.len_of(Axis(1))
    }
}

/// Scores of one evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    /// Display name, e.g. "Linear Regression".
    pub name: String,
    pub kind: ModelKind,
    /// R² on the training split (diagnostic only).
    pub train_score: f64,
    /// R² on the test split; the selection score.
    pub test_score: f64,
    pub test_mae: f64,
    pub test_rmse: f64,
    /// Parameters chosen by the grid search; empty when defaults were used.
    pub params: BTreeMap<String, f64>,
}

/// Per-candidate scores, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub scores: Vec<ModelScore>,
}

impl ModelReport {
    /// Name → test R², in candidate order.
    pub fn test_scores(&self) -> Vec<(&str, f64)> {
        self.scores
            .iter()
            .map(|s| (s.name.as_str(), s.test_score))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Trains every candidate in place and scores it on held-out data.
pub trait Evaluate {
    fn evaluate(&self, data: &EvaluationData, candidates: &mut [Candidate]) -> Result<ModelReport>;
}

/// The production evaluator: optional grid search, final fit, R² scoring.
#[derive(Debug, Clone)]
pub struct ModelEvaluator {
    grid_search: bool,
    cv_folds: usize,
    random_seed: Option<u64>,
    param_grids: BTreeMap<ModelKind, ParamGrid>,
}

impl Default for ModelEvaluator {
    fn default() -> Self {
        Self::from_config(&TrainerConfig::default())
    }
}

impl ModelEvaluator {
    pub fn from_config(config: &TrainerConfig) -> Self {
        Self {
            grid_search: config.grid_search,
            cv_folds: config.cv_folds,
            random_seed: config.random_seed,
            param_grids: config.param_grids.clone(),
        }
    }

    fn evaluate_one(
        &self,
        data: &EvaluationData,
        kind: ModelKind,
        model: &mut Model,
    ) -> Result<ModelScore> {
        let mut params = BTreeMap::new();
        if self.grid_search
            && let Some(grid) = self.param_grids.get(&kind).filter(|g| !g.is_empty())
        {
            let best = grid_search(
                kind,
                grid,
                &data.x_train,
                &data.y_train,
                self.cv_folds,
                self.random_seed,
            )?;
            debug!(model = %kind, cv_score = best.cv_score, "Grid search finished");
            for (name, &value) in &best.params {
                model.set_param(name, value)?;
            }
            params = best.params;
        }

        model.fit(&data.x_train, &data.y_train)?;
        let train_pred = model.predict(&data.x_train)?;
        let test_pred = model.predict(&data.x_test)?;

        let score = ModelScore {
            name: kind.display_name().to_string(),
            kind,
            train_score: r2_score(&data.y_train, &train_pred)?,
            test_score: r2_score(&data.y_test, &test_pred)?,
            test_mae: mean_absolute_error(&data.y_test, &test_pred)?,
            test_rmse: root_mean_squared_error(&data.y_test, &test_pred)?,
            params,
        };

        if !score.train_score.is_finite() || !score.test_score.is_finite() {
            return Err(LearningError::Computation(format!(
                "non-finite R² (train {}, test {})",
                score.train_score, score.test_score
            )));
        }
        Ok(score)
    }
}

impl Evaluate for ModelEvaluator {
    fn evaluate(&self, data: &EvaluationData, candidates: &mut [Candidate]) -> Result<ModelReport> {
        let mut report = ModelReport::default();

        for (kind, model) in candidates.iter_mut() {
            let score = self
                .evaluate_one(data, *kind, model)
                .map_err(|e| e.in_model(kind.display_name()))?;

            info!(
                model = %score.name,
                train_r2 = score.train_score,
                test_r2 = score.test_score,
                test_mae = score.test_mae,
                "Candidate evaluated"
            );
            report.scores.push(score);
        }

        Ok(report)
    }
}
