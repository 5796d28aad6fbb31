//! Regressor catalog.
//!
//! The candidate set is closed: [`ModelKind`] enumerates every algorithm in
//! catalog order and [`Model`] holds one trained-or-untrained instance of
//! each. Both dispatch through the [`Regressor`] trait by `match`, so adding
//! an algorithm means adding a variant, not registering a trait object.

mod adaboost;
mod gradient_boosting;
mod knn;
mod linear;
mod random_forest;
mod tree;
mod xgboost;

pub use adaboost::AdaBoostRegressor;
pub use gradient_boosting::GradientBoostingRegressor;
pub use knn::KNeighborsRegressor;
pub use linear::LinearRegression;
pub use random_forest::RandomForestRegressor;
pub use tree::{DecisionTreeRegressor, TreeNode};
pub use xgboost::XGBRegressor;

use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniform fit/predict capability shared by every candidate.
pub trait Regressor {
    /// Train on `x` (rows are samples) against `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Override a named hyperparameter before fitting.
    fn set_param(&mut self, name: &str, value: f64) -> Result<()>;
}

/// Algorithms in the catalog, declared in catalog order.
///
/// The derived `Ord` follows declaration order, which is also the
/// tie-break order used by model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    DecisionTree,
    KNeighbors,
    AdaBoost,
    GradientBoosting,
    RandomForest,
    XGBoost,
}

impl ModelKind {
    /// Every kind, in catalog order.
    pub const ALL: [ModelKind; 7] = [
        ModelKind::LinearRegression,
        ModelKind::DecisionTree,
        ModelKind::KNeighbors,
        ModelKind::AdaBoost,
        ModelKind::GradientBoosting,
        ModelKind::RandomForest,
        ModelKind::XGBoost,
    ];

    /// Name shown in reports and stored in the model artifact.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::KNeighbors => "KNN Regressor",
            ModelKind::AdaBoost => "Ada Boost Regressor",
            ModelKind::GradientBoosting => "Gradient Boost Regressor",
            ModelKind::RandomForest => "Random Forest Regressor",
            ModelKind::XGBoost => "XGB Regressor",
        }
    }

    /// Look a kind up by its display name.
    pub fn from_display_name(name: &str) -> Option<ModelKind> {
        Self::ALL.into_iter().find(|k| k.display_name() == name)
    }

    /// Whether fitting draws random numbers.
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            ModelKind::AdaBoost | ModelKind::GradientBoosting | ModelKind::RandomForest
        )
    }

    /// Untrained instance with default hyperparameters.
    pub fn build(&self, seed: Option<u64>) -> Model {
        match self {
            ModelKind::LinearRegression => Model::LinearRegression(LinearRegression::new()),
            ModelKind::DecisionTree => Model::DecisionTree(DecisionTreeRegressor::new()),
            ModelKind::KNeighbors => Model::KNeighbors(KNeighborsRegressor::new()),
            ModelKind::AdaBoost => Model::AdaBoost(AdaBoostRegressor::new(seed)),
            ModelKind::GradientBoosting => {
                Model::GradientBoosting(GradientBoostingRegressor::new(seed))
            }
            ModelKind::RandomForest => Model::RandomForest(RandomForestRegressor::new(seed)),
            ModelKind::XGBoost => Model::XGBoost(XGBRegressor::new()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One candidate of the catalog. Serialized as the persisted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Model {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTreeRegressor),
    KNeighbors(KNeighborsRegressor),
    AdaBoost(AdaBoostRegressor),
    GradientBoosting(GradientBoostingRegressor),
    RandomForest(RandomForestRegressor),
    XGBoost(XGBRegressor),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::LinearRegression(_) => ModelKind::LinearRegression,
            Model::DecisionTree(_) => ModelKind::DecisionTree,
            Model::KNeighbors(_) => ModelKind::KNeighbors,
            Model::AdaBoost(_) => ModelKind::AdaBoost,
            Model::GradientBoosting(_) => ModelKind::GradientBoosting,
            Model::RandomForest(_) => ModelKind::RandomForest,
            Model::XGBoost(_) => ModelKind::XGBoost,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Model::LinearRegression(m) => m,
            Model::DecisionTree(m) => m,
            Model::KNeighbors(m) => m,
            Model::AdaBoost(m) => m,
            Model::GradientBoosting(m) => m,
            Model::RandomForest(m) => m,
            Model::XGBoost(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Model::LinearRegression(m) => m,
            Model::DecisionTree(m) => m,
            Model::KNeighbors(m) => m,
            Model::AdaBoost(m) => m,
            Model::GradientBoosting(m) => m,
            Model::RandomForest(m) => m,
            Model::XGBoost(m) => m,
        }
    }
}

impl Regressor for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        self.as_regressor_mut().set_param(name, value)
    }
}

/// The full catalog as untrained `(kind, model)` pairs, in catalog order.
pub fn catalog(seed: Option<u64>) -> Vec<(ModelKind, Model)> {
    ModelKind::ALL
        .into_iter()
        .map(|kind| (kind, kind.build(seed)))
        .collect()
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Seeded stream, or a fresh one when no seed is configured.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LearningError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(LearningError::InvalidInput(
            "cannot fit on zero samples".to_string(),
        ));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(LearningError::InvalidInput(
            "training data contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(LearningError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Interpret a grid value as a positive count.
pub(crate) fn param_as_count(name: &str, value: f64) -> Result<usize> {
    if value >= 1.0 && value.fract() == 0.0 && value.is_finite() {
        Ok(value as usize)
    } else {
        Err(LearningError::InvalidConfig(format!(
            "'{name}' must be a positive integer, got {value}"
        )))
    }
}

/// Interpret a grid value as a positive real.
pub(crate) fn param_as_positive(name: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(LearningError::InvalidConfig(format!(
            "'{name}' must be positive, got {value}"
        )))
    }
}

pub(crate) fn unknown_param(model: ModelKind, name: &str) -> LearningError {
    LearningError::InvalidConfig(format!("'{}' has no parameter '{}'", model, name))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;

    #[test]
    fn test_catalog_order_and_names() {
        let names: Vec<&str> = catalog(Some(0)).iter().map(|(k, _)| k.display_name()).collect();
        assert_eq!(
            names,
            vec![
                "Linear Regression",
                "Decision Tree",
                "KNN Regressor",
                "Ada Boost Regressor",
                "Gradient Boost Regressor",
                "Random Forest Regressor",
                "XGB Regressor",
            ]
        );
    }

    #[test]
    fn test_kind_round_trips_through_display_name() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_display_name(kind.display_name()), Some(kind));
            assert_eq!(kind.build(None).kind(), kind);
        }
        assert_eq!(ModelKind::from_display_name("SVR"), None);
    }

    #[test]
    fn test_deterministic_kinds_repeat_without_seed() {
        let randomized: Vec<ModelKind> =
            ModelKind::ALL.into_iter().filter(|k| k.is_randomized()).collect();
        assert_eq!(
            randomized,
            vec![ModelKind::AdaBoost, ModelKind::GradientBoosting, ModelKind::RandomForest]
        );

        let (x, y) = test_support::linear_data(60, 11);
        for kind in ModelKind::ALL.into_iter().filter(|k| !k.is_randomized()) {
            let mut first = kind.build(None);
            let mut second = kind.build(None);
            first.fit(&x, &y).unwrap();
            second.fit(&x, &y).unwrap();
            assert_eq!(first.predict(&x).unwrap(), second.predict(&x).unwrap(), "{kind}");
        }
    }

    #[test]
    fn test_every_model_learns_linear_signal() {
        let (x, y) = test_support::linear_data(120, 3);
        for (kind, mut model) in catalog(Some(11)) {
            model.fit(&x, &y).unwrap();
            let score = r2_score(&y, &model.predict(&x).unwrap()).unwrap();
            assert!(score > 0.5, "{kind} scored {score}");
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let x = Array2::zeros((2, 2));
        for (kind, model) in catalog(Some(0)) {
            assert!(
                matches!(model.predict(&x), Err(LearningError::NotFitted)),
                "{kind} predicted without fitting"
            );
        }
    }

    #[test]
    fn test_fit_rejects_mismatched_lengths() {
        let x = Array2::zeros((3, 2));
        let y = Array1::zeros(2);
        let mut model = ModelKind::LinearRegression.build(None);
        assert!(matches!(
            model.fit(&x, &y),
            Err(LearningError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_param_is_rejected() {
        let mut model = ModelKind::LinearRegression.build(None);
        assert!(matches!(
            model.set_param("max_depth", 3.0),
            Err(LearningError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_model_serde_round_trip() {
        let (x, y) = test_support::linear_data(30, 5);
        for (kind, mut model) in catalog(Some(2)) {
            model.fit(&x, &y).unwrap();
            let json = serde_json::to_string(&model).unwrap();
            let restored: Model = serde_json::from_str(&json).unwrap();
            assert_eq!(
                model.predict(&x).unwrap(),
                restored.predict(&x).unwrap(),
                "{kind} changed after serde"
            );
        }
    }
}
