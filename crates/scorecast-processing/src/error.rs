//! Custom error types for the ingestion and transformation stages.
//!
//! This module provides the error hierarchy for the data side of the
//! pipeline using `thiserror`. Leaf variants describe what went wrong;
//! [`ProcessingError::StageFailed`] records which stage it went wrong in,
//! so a failure can be diagnosed from the log without re-running.
//!
//! Errors are serializable as `{code, message}` so an outer layer can hand
//! them over a wire without leaking internals.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    /// Reading the source dataset and writing the raw/train/test splits.
    Ingestion,
    /// Deriving the target, fitting the transformer and encoding both splits.
    Transformation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingestion => write!(f, "ingestion"),
            Stage::Transformation => write!(f, "transformation"),
        }
    }
}

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The dataset has no rows, or too few to split.
    #[error("Dataset is empty or too small: {0}")]
    EmptyDataset(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A value could not be interpreted as a number.
    #[error("Column '{column}' row {row}: value is missing or not numeric")]
    InvalidValue { column: String, row: usize },

    /// A column has a type that cannot hold the expected values.
    #[error("Column '{column}' has type {dtype}, expected numeric or text")]
    InvalidColumnType { column: String, dtype: String },

    /// A persisted artifact does not exist at the expected location.
    #[error("Artifact not found: {}", .path.display())]
    ArtifactNotFound { path: PathBuf },

    /// A stage failed; wraps the underlying cause.
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<ProcessingError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Attribute this error to a pipeline stage.
    ///
    /// Idempotent: an error already attributed to a stage keeps its
    /// original stage.
    pub fn with_stage(self, stage: Stage) -> Self {
        if self.stage().is_some() {
            return self;
        }
        ProcessingError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            Self::WithContext { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// Get error code for programmatic handling.
    ///
    /// Stage-attributed errors report the stage code; the leaf cause is
    /// available through [`root_code`](Self::root_code).
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::StageFailed { stage, .. } => match stage {
                Stage::Ingestion => "INGESTION_FAILED",
                Stage::Transformation => "TRANSFORMATION_FAILED",
            },
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Error code of the innermost cause, skipping stage and context wrappers.
    pub fn root_code(&self) -> &'static str {
        match self {
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.root_code()
            }
            other => other.error_code(),
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Attribute an error result to a pipeline stage.
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.with_stage(stage))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }

    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_stage(stage))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Io(e).with_context(context))
    }

    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| ProcessingError::Io(e).with_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::NoValidValues("math_score".to_string()).error_code(),
            "NO_VALID_VALUES"
        );
    }

    #[test]
    fn test_stage_code_and_root_code() {
        let error = ProcessingError::ColumnNotFound("lunch".to_string())
            .with_stage(Stage::Transformation);
        assert_eq!(error.error_code(), "TRANSFORMATION_FAILED");
        assert_eq!(error.root_code(), "COLUMN_NOT_FOUND");
        assert_eq!(error.stage(), Some(Stage::Transformation));
    }

    #[test]
    fn test_with_stage_keeps_first_stage() {
        let error = ProcessingError::EmptyDataset("no rows".to_string())
            .with_stage(Stage::Ingestion)
            .with_stage(Stage::Transformation);
        assert_eq!(error.stage(), Some(Stage::Ingestion));
        assert!(error.to_string().starts_with("ingestion stage failed"));
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::ColumnNotFound("gender".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("gender"));
    }

    #[test]
    fn test_with_context() {
        let error = ProcessingError::ColumnNotFound("test".to_string())
            .with_context("While deriving avg_score");
        assert!(error.to_string().contains("While deriving avg_score"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
    }

    #[test]
    fn test_stage_survives_context() {
        let error = ProcessingError::Io(std::io::Error::other("disk full"))
            .with_stage(Stage::Ingestion)
            .with_context("writing train split");
        assert_eq!(error.stage(), Some(Stage::Ingestion));
        assert_eq!(error.error_code(), "INGESTION_FAILED");
    }

    #[test]
    fn test_result_ext_io() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let error = result.stage(Stage::Ingestion).unwrap_err();
        assert_eq!(error.root_code(), "IO_ERROR");
    }
}
