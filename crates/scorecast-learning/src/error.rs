//! Error types for the scorecast-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, LearningError>`.
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Attributed**: evaluation and inference failures name the stage and,
//!   where relevant, the model that failed
//! - **Safe to surface**: [`LearningError::user_message`] gives a generic text
//!   for end users, while `Display` carries the full diagnostic chain for logs
//!
//! # Example
//!
//! ```rust,ignore
//! use scorecast_learning::{LearningError, TrainerConfig};
//!
//! fn configure() -> Result<TrainerConfig, LearningError> {
//!     let config = TrainerConfig::builder().quality_floor(0.6).build()?;
//!     Ok(config)
//! }
//! ```

use scorecast_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for scorecast-learning operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// A candidate failed to fit or predict; the whole evaluation is aborted.
    #[error("Evaluation of '{model}' failed: {source}")]
    Evaluation {
        model: String,
        #[source]
        source: Box<LearningError>,
    },

    /// The best candidate scored below the acceptance floor.
    ///
    /// No model artifact is written when this is returned.
    #[error("No model reached the quality floor: best was '{best_model}' with R² {score:.4} (floor {floor})")]
    ModelQuality {
        best_model: String,
        score: f64,
        floor: f64,
    },

    /// Serving a prediction failed.
    #[error("Inference failed: {0}")]
    Inference(#[source] Box<LearningError>),

    /// The model artifact was trained against a different transformer.
    #[error("Model was trained against transformer {expected}, but the loaded transformer is {found}")]
    IncompatibleArtifacts { expected: String, found: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed input record or training matrix.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `predict` was called before `fit`.
    #[error("Model has not been fitted")]
    NotFitted,

    /// Array dimensions do not line up.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Numerical failure inside a model.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Failure in ingestion, transformation or artifact persistence.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LearningError {
    /// Wrap this error as the failure of candidate `model`.
    pub fn in_model(self, model: impl Into<String>) -> Self {
        LearningError::Evaluation {
            model: model.into(),
            source: Box::new(self),
        }
    }

    /// Wrap this error as an inference failure (idempotent).
    pub fn into_inference(self) -> Self {
        match self {
            LearningError::Inference(_) => self,
            other => LearningError::Inference(Box::new(other)),
        }
    }

    /// Get error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Evaluation { .. } => "EVALUATION_FAILED",
            Self::ModelQuality { .. } => "MODEL_QUALITY",
            Self::Inference(_) => "INFERENCE_FAILED",
            Self::IncompatibleArtifacts { .. } => "INCOMPATIBLE_ARTIFACTS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFitted => "NOT_FITTED",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::Computation(_) => "COMPUTATION_ERROR",
            Self::Processing(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Generic message for end users: no paths, no internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Inference(inner) => match inner.as_ref() {
                Self::InvalidInput(_) => {
                    "The submitted values could not be read. Please check the form and try again."
                }
                _ => "Prediction is currently unavailable. Please try again later.",
            },
            Self::InvalidInput(_) => {
                "The submitted values could not be read. Please check the form and try again."
            }
            Self::ModelQuality { .. } => "Training finished without an acceptable model.",
            _ => "Something went wrong. Please try again later.",
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

impl From<crate::config::ConfigValidationError> for LearningError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        LearningError::InvalidConfig(err.to_string())
    }
}

impl From<scorecast_processing::ConfigValidationError> for LearningError {
    fn from(err: scorecast_processing::ConfigValidationError) -> Self {
        LearningError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecast_processing::Stage;
    use std::path::PathBuf;

    #[test]
    fn test_error_code() {
        assert_eq!(LearningError::NotFitted.error_code(), "NOT_FITTED");
        assert_eq!(
            LearningError::Computation("singular".to_string())
                .in_model("Linear Regression")
                .error_code(),
            "EVALUATION_FAILED"
        );
    }

    #[test]
    fn test_processing_code_passes_through() {
        let err: LearningError = ProcessingError::ColumnNotFound("lunch".to_string())
            .with_stage(Stage::Transformation)
            .into();
        assert_eq!(err.error_code(), "TRANSFORMATION_FAILED");
    }

    #[test]
    fn test_evaluation_names_model() {
        let err = LearningError::NotFitted.in_model("KNN Regressor");
        assert!(err.to_string().contains("KNN Regressor"));
    }

    #[test]
    fn test_into_inference_is_idempotent() {
        let err = LearningError::NotFitted.into_inference().into_inference();
        match err {
            LearningError::Inference(inner) => assert!(matches!(*inner, LearningError::NotFitted)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_user_message_hides_paths() {
        let err = LearningError::Processing(ProcessingError::ArtifactNotFound {
            path: PathBuf::from("/srv/secret/artifact/model.json"),
        })
        .into_inference();

        assert!(err.to_string().contains("/srv/secret"));
        assert!(!err.user_message().contains("/srv/secret"));
        assert_eq!(err.error_code(), "INFERENCE_FAILED");
    }

    #[test]
    fn test_error_serialization() {
        let err = LearningError::ModelQuality {
            best_model: "Decision Tree".to_string(),
            score: 0.12,
            floor: 0.6,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("MODEL_QUALITY"));
        assert!(json.contains("Decision Tree"));
    }
}
