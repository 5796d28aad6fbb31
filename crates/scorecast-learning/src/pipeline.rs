//! Training pipeline implementation.
//!
//! This module provides the [`TrainingPipeline`] struct and its builder. The
//! pipeline runs the three training stages in order:
//!
//! 1. **Ingestion** - copy the raw dataset and write the seeded train/test split
//! 2. **Transformation** - derive `avg_score`, fit the transformer on the
//!    training split, encode both splits, persist the transformer
//! 3. **Model training** - evaluate the catalog, select, persist the winner
//!
//! Any stage failure aborts the run and is returned unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecast_learning::{TrainerConfig, TrainingPipeline};
//! use scorecast_processing::IngestionConfig;
//!
//! let outcome = TrainingPipeline::builder()
//!     .ingestion(IngestionConfig::builder().source_path("stud.csv").build()?)
//!     .trainer(TrainerConfig::builder().random_seed(7).build()?)
//!     .build()?
//!     .run()?;
//!
//! println!("{} ({:.4})", outcome.best_model_name, outcome.best_model_score);
//! ```

use crate::config::TrainerConfig;
use crate::error::Result;
use crate::trainer::{ModelTrainer, TrainingOutcome};
use scorecast_processing::{DataIngestion, DataTransformation, IngestionConfig};
use tracing::{info, info_span};

/// One-shot training run from source dataset to persisted model.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    ingestion: IngestionConfig,
    trainer: TrainerConfig,
}

impl TrainingPipeline {
    /// Create a new builder for `TrainingPipeline`.
    #[must_use]
    pub fn builder() -> TrainingPipelineBuilder {
        TrainingPipelineBuilder::default()
    }

    pub fn ingestion_config(&self) -> &IngestionConfig {
        &self.ingestion
    }

    pub fn trainer_config(&self) -> &TrainerConfig {
        &self.trainer
    }

    /// Run ingestion, transformation and model training.
    ///
    /// Artifacts are written under the ingestion config's artifact directory.
    pub fn run(&self) -> Result<TrainingOutcome> {
        let _span = info_span!("training_run").entered();
        let artifacts = self.ingestion.artifacts.clone();

        let splits = DataIngestion::new(self.ingestion.clone()).initiate_data_ingestion()?;
        let transformed = DataTransformation::new(artifacts.clone())
            .initiate_data_transformation(&splits.train, &splits.test)?;

        let outcome = ModelTrainer::new(self.trainer.clone(), artifacts)?.initiate_model_trainer(
            &transformed.train,
            &transformed.test,
            &transformed.fingerprint,
        )?;

        info!(
            best_model = %outcome.best_model_name,
            score = outcome.best_model_score,
            "Training run completed"
        );
        Ok(outcome)
    }
}

/// Builder for [`TrainingPipeline`].
///
/// Both configurations are optional and fall back to their defaults.
#[derive(Debug, Default)]
pub struct TrainingPipelineBuilder {
    ingestion: Option<IngestionConfig>,
    trainer: Option<TrainerConfig>,
}

impl TrainingPipelineBuilder {
    /// Set the ingestion configuration (source path, split, artifact directory).
    #[must_use]
    pub fn ingestion(mut self, config: IngestionConfig) -> Self {
        self.ingestion = Some(config);
        self
    }

    /// Set the trainer configuration (floor, grid search, seed).
    #[must_use]
    pub fn trainer(mut self, config: TrainerConfig) -> Self {
        self.trainer = Some(config);
        self
    }

    /// Validate both configurations and build the pipeline.
    pub fn build(self) -> Result<TrainingPipeline> {
        let ingestion = self.ingestion.unwrap_or_default();
        let trainer = self.trainer.unwrap_or_default();
        ingestion.validate()?;
        trainer.validate()?;
        Ok(TrainingPipeline { ingestion, trainer })
    }
}
