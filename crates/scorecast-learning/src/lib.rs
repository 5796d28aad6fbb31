//! scorecast-learning: model selection and inference for student scores.
//!
//! This crate trains a fixed catalog of regressors on the matrices produced
//! by `scorecast-processing`, keeps the best one by test-set R², and serves
//! predictions from the persisted transformer/model pair.
//!
//! # Features
//!
//! - **Regressor catalog**: linear regression, decision tree, k-nearest
//!   neighbours, AdaBoost, gradient boosting, random forest and an
//!   XGBoost-style booster, all native Rust over `ndarray`
//! - **All-or-nothing evaluation**: one failing candidate aborts the run
//! - **Deterministic selection**: highest test R², first in catalog order on
//!   ties, nothing persisted below the quality floor
//! - **Optional grid search**: k-fold cross-validated parameter grids
//! - **Guarded inference**: the model artifact carries the fingerprint of the
//!   transformer it was trained against
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scorecast_learning::{CustomData, PredictPipeline, TrainingPipeline};
//! use scorecast_processing::ArtifactConfig;
//!
//! let outcome = TrainingPipeline::builder().build()?.run()?;
//! println!("{}: {:.4}", outcome.best_model_name, outcome.best_model_score);
//!
//! let record = CustomData::from_text_fields(
//!     "female", "group B", "bachelor's degree", "standard", "none", "72", "72",
//! )?;
//! let score = PredictPipeline::new(ArtifactConfig::default()).predict_one(&record)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! raw csv ─► DataIngestion ─► DataTransformation ─► ModelTrainer ─► model.json
//!                                    │                   │
//!                                    ▼                   ▼
//!                            preprocessor.json    ModelEvaluator (catalog)
//!
//! CustomData ─► PredictPipeline (preprocessor.json + model.json) ─► f64
//! ```
//!
//! # Logging
//!
//! The library emits `tracing` events inside one span per stage
//! (`ingestion`, `transformation`, `model_trainer`, `predict`) and never
//! installs a subscriber; the `scorecast` binary does that once at startup.

pub mod config;
pub mod cross_validation;
mod error;
pub mod evaluator;
pub mod metrics;
pub mod models;
mod pipeline;
mod predict;
mod trainer;

// Re-export public API
//
// Configuration types
pub use config::{ConfigValidationError, ParamGrid, TrainerConfig, TrainerConfigBuilder};
// Error types
pub use error::{LearningError, Result};
// Evaluation
pub use evaluator::{Candidate, Evaluate, EvaluationData, ModelEvaluator, ModelReport, ModelScore};
// Regressors
pub use models::{Model, ModelKind, Regressor, catalog};
// Pipelines
pub use pipeline::{TrainingPipeline, TrainingPipelineBuilder};
pub use predict::{CustomData, PredictPipeline};
pub use trainer::{MODEL_FORMAT_VERSION, ModelArtifact, ModelTrainer, TrainingOutcome};
