//! Inference over the persisted transformer and model.
//!
//! Both artifacts are loaded on every call and never mutated, so any number
//! of callers can predict concurrently. The model artifact records the
//! fingerprint of the transformer it was trained against; a pair from
//! different training runs is refused instead of producing a silently wrong
//! prediction.
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecast_learning::{CustomData, PredictPipeline};
//! use scorecast_processing::ArtifactConfig;
//!
//! let record = CustomData::from_text_fields(
//!     "female", "group B", "bachelor's degree", "standard", "none", "72", "72",
//! )?;
//! let score = PredictPipeline::new(ArtifactConfig::default()).predict_one(&record)?;
//! println!("predicted average score: {score}");
//! ```

use crate::error::{LearningError, Result};
use crate::models::Regressor;
use crate::trainer::{MODEL_FORMAT_VERSION, ModelArtifact};
use ndarray::Array1;
use polars::prelude::*;
use scorecast_processing::artifact::load_object;
use scorecast_processing::schema::{
    GENDER, LUNCH, MATH_SCORE, PARENTAL_LEVEL_OF_EDUCATION, RACE_ETHNICITY, READING_SCORE,
    TEST_PREPARATION_COURSE,
};
use scorecast_processing::{
    ArtifactConfig, FittedTransformer, ProcessingError, TRANSFORMER_FORMAT_VERSION,
    parse_numeric_string,
};
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;
use std::collections::HashMap;
use tracing::{debug, info_span};

/// One record submitted for prediction: the feature columns, no target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    pub gender: String,
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    pub math_score: f64,
    pub reading_score: f64,
}

fn parse_score(field: &str, raw: &str) -> Result<f64> {
    parse_numeric_string(raw).ok_or_else(|| {
        LearningError::InvalidInput(format!("'{field}' is not a number: '{raw}'"))
    })
}

impl CustomData {
    /// Build a record from raw text fields, coercing the two scores.
    pub fn from_text_fields(
        gender: &str,
        race_ethnicity: &str,
        parental_level_of_education: &str,
        lunch: &str,
        test_preparation_course: &str,
        math_score: &str,
        reading_score: &str,
    ) -> Result<Self> {
        Ok(Self {
            gender: gender.to_string(),
            race_ethnicity: race_ethnicity.to_string(),
            parental_level_of_education: parental_level_of_education.to_string(),
            lunch: lunch.to_string(),
            test_preparation_course: test_preparation_course.to_string(),
            math_score: parse_score(MATH_SCORE, math_score)?,
            reading_score: parse_score(READING_SCORE, reading_score)?,
        })
    }

    /// Decode submitted form fields keyed by column name.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let field = |name: &str| {
            form.get(name)
                .map(String::as_str)
                .ok_or_else(|| LearningError::InvalidInput(format!("missing field '{name}'")))
        };

        Self::from_text_fields(
            field(GENDER)?,
            field(RACE_ETHNICITY)?,
            field(PARENTAL_LEVEL_OF_EDUCATION)?,
            field(LUNCH)?,
            field(TEST_PREPARATION_COURSE)?,
            field(MATH_SCORE)?,
            field(READING_SCORE)?,
        )
    }

    /// One-row frame in the layout the transformer was fit on.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let df = df!(
            GENDER => [self.gender.as_str()],
            RACE_ETHNICITY => [self.race_ethnicity.as_str()],
            PARENTAL_LEVEL_OF_EDUCATION => [self.parental_level_of_education.as_str()],
            LUNCH => [self.lunch.as_str()],
            TEST_PREPARATION_COURSE => [self.test_preparation_course.as_str()],
            MATH_SCORE => [self.math_score],
            READING_SCORE => [self.reading_score]
        )
        .map_err(ProcessingError::from)?;
        Ok(df)
    }
}

/// Stateless prediction over the artifacts in one directory.
#[derive(Debug, Clone)]
pub struct PredictPipeline {
    artifacts: ArtifactConfig,
}

assert_impl_all!(PredictPipeline: Send, Sync);

impl PredictPipeline {
    pub fn new(artifacts: ArtifactConfig) -> Self {
        Self { artifacts }
    }

    /// Predict one value per row of `features`.
    ///
    /// Every failure is returned as [`LearningError::Inference`].
    pub fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let _span = info_span!("predict").entered();
        self.predict_inner(features)
            .map_err(LearningError::into_inference)
    }

    /// Predict a single record, rounded to two decimals.
    pub fn predict_one(&self, record: &CustomData) -> Result<f64> {
        let df = record.to_dataframe().map_err(LearningError::into_inference)?;
        let prediction = self.predict(&df)?;
        let value = prediction.get(0).copied().ok_or_else(|| {
            LearningError::Computation("model returned no prediction".to_string()).into_inference()
        })?;
        Ok((value * 100.0).round() / 100.0)
    }

    fn load(&self) -> Result<(FittedTransformer, ModelArtifact)> {
        let transformer: FittedTransformer = load_object(&self.artifacts.preprocessor_path())?;
        let artifact: ModelArtifact = load_object(&self.artifacts.model_path())?;

        if transformer.format_version() != TRANSFORMER_FORMAT_VERSION {
            return Err(LearningError::IncompatibleArtifacts {
                expected: format!("transformer format {TRANSFORMER_FORMAT_VERSION}"),
                found: format!("transformer format {}", transformer.format_version()),
            });
        }

        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(LearningError::IncompatibleArtifacts {
                expected: format!("model format {MODEL_FORMAT_VERSION}"),
                found: format!("model format {}", artifact.format_version),
            });
        }

        let found = transformer.fingerprint()?;
        if artifact.transformer_fingerprint != found {
            return Err(LearningError::IncompatibleArtifacts {
                expected: artifact.transformer_fingerprint,
                found,
            });
        }

        Ok((transformer, artifact))
    }

    fn predict_inner(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let (transformer, artifact) = self.load()?;
        let x = transformer.transform(features)?;

        if x.ncols() != artifact.feature_count {
            return Err(LearningError::ShapeMismatch {
                expected: format!("{} features", artifact.feature_count),
                actual: format!("{} features", x.ncols()),
            });
        }

        let prediction = artifact.model.predict(&x)?;
        debug!(model = %artifact.model_name, rows = prediction.len(), "Prediction served");
        Ok(prediction)
    }
}
