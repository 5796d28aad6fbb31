//! Configuration types for model evaluation and selection.
//!
//! This module provides [`TrainerConfig`] and its builder for configuring
//! the evaluator and selector.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecast_learning::TrainerConfig;
//!
//! let config = TrainerConfig::builder()
//!     .quality_floor(0.6)
//!     .grid_search(true)
//!     .cv_folds(3)
//!     .random_seed(42)
//!     .build()?;
//! ```

use crate::models::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named candidate values for each tunable parameter of one model.
pub type ParamGrid = BTreeMap<String, Vec<f64>>;

/// Configuration for the model trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Minimum test-set R² a model needs to be persisted (0.0 - 1.0).
    /// Default: 0.6
    pub quality_floor: f64,

    /// Whether to tune each candidate with a k-fold grid search before the
    /// final fit.
    /// Default: false
    pub grid_search: bool,

    /// Number of folds for the grid search (at least 2).
    /// Default: 3
    pub cv_folds: usize,

    /// Seed for randomized models and fold assignment.
    ///
    /// When `None`, tree ensembles draw a fresh seed per run, so repeated
    /// runs can report slightly different scores. This is accepted
    /// behaviour, not a defect.
    /// Default: None
    pub random_seed: Option<u64>,

    /// Per-model grids used when `grid_search` is on. Models without an
    /// entry are fit with their defaults.
    /// Default: [`crate::cross_validation::default_param_grids`]
    pub param_grids: BTreeMap<ModelKind, ParamGrid>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            quality_floor: 0.6,
            grid_search: false,
            cv_folds: 3,
            random_seed: None,
            param_grids: crate::cross_validation::default_param_grids(),
        }
    }
}

impl TrainerConfig {
    /// Creates a new builder for `TrainerConfig`.
    #[must_use]
    pub fn builder() -> TrainerConfigBuilder {
        TrainerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.quality_floor) {
            return Err(ConfigValidationError::InvalidQualityFloor(self.quality_floor));
        }

        if self.cv_folds < 2 {
            return Err(ConfigValidationError::InvalidCvFolds(self.cv_folds));
        }

        for (kind, grid) in &self.param_grids {
            for (param, values) in grid {
                if values.is_empty() {
                    return Err(ConfigValidationError::EmptyGrid {
                        model: kind.display_name().to_string(),
                        param: param.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid quality floor: {0} (must be between 0.0 and 1.0)")]
    InvalidQualityFloor(f64),

    #[error("Invalid cv_folds: {0} (must be at least 2)")]
    InvalidCvFolds(usize),

    #[error("Parameter grid for '{model}' has no values for '{param}'")]
    EmptyGrid { model: String, param: String },
}

/// Builder for [`TrainerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct TrainerConfigBuilder {
    quality_floor: Option<f64>,
    grid_search: Option<bool>,
    cv_folds: Option<usize>,
    random_seed: Option<u64>,
    param_grids: Option<BTreeMap<ModelKind, ParamGrid>>,
}

impl TrainerConfigBuilder {
    /// Set the minimum acceptable test-set R².
    #[must_use]
    pub fn quality_floor(mut self, floor: f64) -> Self {
        self.quality_floor = Some(floor);
        self
    }

    /// Enable or disable the grid search.
    #[must_use]
    pub fn grid_search(mut self, enable: bool) -> Self {
        self.grid_search = Some(enable);
        self
    }

    /// Set the number of cross-validation folds.
    #[must_use]
    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = Some(folds);
        self
    }

    /// Seed randomized models and fold assignment.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Replace the grid for one model.
    #[must_use]
    pub fn param_grid(mut self, kind: ModelKind, grid: ParamGrid) -> Self {
        self.param_grids
            .get_or_insert_with(crate::cross_validation::default_param_grids)
            .insert(kind, grid);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `TrainerConfig` or an error if validation fails.
    pub fn build(self) -> Result<TrainerConfig, ConfigValidationError> {
        let config = TrainerConfig {
            quality_floor: self.quality_floor.unwrap_or(0.6),
            grid_search: self.grid_search.unwrap_or(false),
            cv_folds: self.cv_folds.unwrap_or(3),
            random_seed: self.random_seed,
            param_grids: self
                .param_grids
                .unwrap_or_else(crate::cross_validation::default_param_grids),
        };

        config.validate()?;
        Ok(config)
    }
}
