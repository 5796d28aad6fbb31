//! Model selection and persistence.
//!
//! [`ModelTrainer`] runs an [`Evaluate`] implementation over the full
//! catalog, picks the highest test-set R² (first in catalog order on ties),
//! rejects it when below the quality floor, and only then writes the model
//! artifact.

use crate::config::TrainerConfig;
use crate::error::{LearningError, Result};
use crate::evaluator::{Evaluate, EvaluationData, ModelEvaluator, ModelReport};
use crate::models::{Model, ModelKind, catalog};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use scorecast_processing::ArtifactConfig;
use scorecast_processing::artifact::save_object;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, info_span, warn};

/// Version of the persisted [`ModelArtifact`] layout.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// The persisted winner together with what it was trained against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_name: String,
    pub kind: ModelKind,
    pub test_score: f64,
    /// Fingerprint of the fitted transformer that produced the training matrix.
    pub transformer_fingerprint: String,
    pub feature_count: usize,
    pub trained_at: DateTime<Utc>,
    pub model: Model,
}

/// Result of a successful selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub best_model_name: String,
    pub best_model_score: f64,
    pub model_path: PathBuf,
    pub report: ModelReport,
}

/// Index of the highest test score; strict `>` keeps the earliest on ties.
fn select_best(report: &ModelReport) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, score) in report.scores.iter().enumerate() {
        if best.is_none_or(|(_, b)| score.test_score > b) {
            best = Some((i, score.test_score));
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug)]
pub struct ModelTrainer<E = ModelEvaluator> {
    config: TrainerConfig,
    artifacts: ArtifactConfig,
    evaluator: E,
}

impl ModelTrainer<ModelEvaluator> {
    pub fn new(config: TrainerConfig, artifacts: ArtifactConfig) -> Result<Self> {
        config.validate()?;
        let evaluator = ModelEvaluator::from_config(&config);
        Ok(Self {
            config,
            artifacts,
            evaluator,
        })
    }
}

impl<E: Evaluate> ModelTrainer<E> {
    /// Swap the evaluator, keeping config and artifact locations.
    pub fn with_evaluator<F: Evaluate>(self, evaluator: F) -> ModelTrainer<F> {
        ModelTrainer {
            config: self.config,
            artifacts: self.artifacts,
            evaluator,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Evaluate the catalog on `train`/`test` (target in the last column)
    /// and persist the winner.
    ///
    /// # Errors
    ///
    /// - [`LearningError::Evaluation`] when any candidate fails
    /// - [`LearningError::ModelQuality`] when the best test R² is below the
    ///   floor; the previous model artifact is left untouched
    /// - [`LearningError::Processing`] when the artifact cannot be written
    pub fn initiate_model_trainer(
        &self,
        train: &Array2<f64>,
        test: &Array2<f64>,
        transformer_fingerprint: &str,
    ) -> Result<TrainingOutcome> {
        let _span = info_span!("model_trainer").entered();

        let data = EvaluationData::from_matrices(train, test)?;
        info!(
            train_rows = data.x_train.nrows(),
            test_rows = data.x_test.nrows(),
            features = data.n_features(),
            "Model training and evaluation initiated"
        );

        let mut candidates = catalog(self.config.random_seed);
        if self.config.random_seed.is_none() {
            let unseeded: Vec<&str> = candidates
                .iter()
                .filter(|(kind, _)| kind.is_randomized())
                .map(|(kind, _)| kind.display_name())
                .collect();
            info!(models = ?unseeded, "Randomized candidates are unseeded; their scores vary between runs");
        }
        let report = self.evaluator.evaluate(&data, &mut candidates)?;
        info!(candidates = report.len(), "Model evaluation completed");

        let best = select_best(&report).ok_or_else(|| {
            LearningError::Computation("evaluation produced an empty report".to_string())
        })?;
        let best_score = &report.scores[best];

        if best_score.test_score < self.config.quality_floor {
            warn!(
                model = %best_score.name,
                score = best_score.test_score,
                floor = self.config.quality_floor,
                "Best model is below the quality floor; nothing persisted"
            );
            return Err(LearningError::ModelQuality {
                best_model: best_score.name.clone(),
                score: best_score.test_score,
                floor: self.config.quality_floor,
            });
        }

        let (kind, model) = candidates
            .into_iter()
            .find(|(kind, _)| *kind == best_score.kind)
            .ok_or_else(|| {
                LearningError::Computation(format!(
                    "report names '{}' but no such candidate exists",
                    best_score.name
                ))
            })?;

        let artifact = ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            model_name: best_score.name.clone(),
            kind,
            test_score: best_score.test_score,
            transformer_fingerprint: transformer_fingerprint.to_string(),
            feature_count: data.n_features(),
            trained_at: Utc::now(),
            model,
        };

        let model_path = self.artifacts.model_path();
        save_object(&model_path, &artifact)?;
        info!(
            model = %artifact.model_name,
            score = artifact.test_score,
            path = %model_path.display(),
            "Best model selected and saved"
        );

        Ok(TrainingOutcome {
            best_model_name: artifact.model_name,
            best_model_score: artifact.test_score,
            model_path,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Candidate, ModelScore};
    use std::collections::BTreeMap;

    fn score(kind: ModelKind, test_score: f64) -> ModelScore {
        ModelScore {
            name: kind.display_name().to_string(),
            kind,
            train_score: test_score,
            test_score,
            test_mae: 0.0,
            test_rmse: 0.0,
            params: BTreeMap::new(),
        }
    }

    /// Returns fixed scores in catalog order without fitting anything.
    struct FixedScores(Vec<f64>);

    impl Evaluate for FixedScores {
        fn evaluate(&self, _: &EvaluationData, candidates: &mut [Candidate]) -> Result<ModelReport> {
            Ok(ModelReport {
                scores: candidates
                    .iter()
                    .zip(&self.0)
                    .map(|((kind, _), &s)| score(*kind, s))
                    .collect(),
            })
        }
    }

    fn matrices() -> (Array2<f64>, Array2<f64>) {
        (Array2::zeros((4, 3)), Array2::zeros((2, 3)))
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        let report = ModelReport {
            scores: vec![
                score(ModelKind::LinearRegression, 0.7),
                score(ModelKind::DecisionTree, 0.9),
                score(ModelKind::KNeighbors, 0.9),
            ],
        };
        assert_eq!(select_best(&report), Some(1));
        assert_eq!(select_best(&ModelReport::default()), None);
    }

    #[test]
    fn test_tie_persists_first_in_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(TrainerConfig::default(), ArtifactConfig::in_dir(dir.path()))
            .unwrap()
            .with_evaluator(FixedScores(vec![0.5, 0.8, 0.8, 0.1, 0.8, 0.2, 0.3]));

        let (train, test) = matrices();
        let outcome = trainer.initiate_model_trainer(&train, &test, "00000000").unwrap();

        assert_eq!(outcome.best_model_name, "Decision Tree");
        assert_eq!(outcome.best_model_score, 0.8);
        assert!(outcome.model_path.exists());
    }

    #[test]
    fn test_below_floor_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactConfig::in_dir(dir.path());
        let trainer = ModelTrainer::new(TrainerConfig::default(), artifacts.clone())
            .unwrap()
            .with_evaluator(FixedScores(vec![0.59; 7]));

        let (train, test) = matrices();
        let err = trainer.initiate_model_trainer(&train, &test, "00000000").unwrap_err();

        assert!(matches!(err, LearningError::ModelQuality { floor, .. } if floor == 0.6));
        assert!(!artifacts.model_path().exists());
    }

    #[test]
    fn test_score_at_floor_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(TrainerConfig::default(), ArtifactConfig::in_dir(dir.path()))
            .unwrap()
            .with_evaluator(FixedScores(vec![0.6, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1]));

        let (train, test) = matrices();
        let outcome = trainer.initiate_model_trainer(&train, &test, "abc").unwrap();
        assert_eq!(outcome.best_model_name, "Linear Regression");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrainerConfig {
            cv_folds: 1,
            ..TrainerConfig::default()
        };
        assert!(matches!(
            ModelTrainer::new(config, ArtifactConfig::default()),
            Err(LearningError::InvalidConfig(_))
        ));
    }
}
