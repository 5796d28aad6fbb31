//! Configuration types for the ingestion and transformation stages.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the source dataset.
pub const DEFAULT_SOURCE_PATH: &str = "notebook/data/stud.csv";

/// Default directory all artifacts are written to.
pub const DEFAULT_ARTIFACT_DIR: &str = "artifact";

/// Locations of every persisted artifact.
///
/// File names are fixed; only the directory is expected to change between
/// deployments (tests point it at a temporary directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory holding all artifacts.
    /// Default: "artifact"
    pub artifact_dir: PathBuf,

    /// Unmodified copy of the source dataset.
    /// Default: "raw.csv"
    pub raw_file: String,

    /// Training split.
    /// Default: "train.csv"
    pub train_file: String,

    /// Test split.
    /// Default: "test.csv"
    pub test_file: String,

    /// Fitted feature transformer.
    /// Default: "preprocessor.json"
    pub preprocessor_file: String,

    /// Selected model.
    /// Default: "model.json"
    pub model_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            raw_file: "raw.csv".to_string(),
            train_file: "train.csv".to_string(),
            test_file: "test.csv".to_string(),
            preprocessor_file: "preprocessor.json".to_string(),
            model_file: "model.json".to_string(),
        }
    }
}

impl ArtifactConfig {
    /// Default file names under a custom directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.raw_file)
    }

    pub fn train_data_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.train_file)
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.test_file)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.preprocessor_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.model_file)
    }
}

/// Configuration for the ingestion stage.
///
/// Use [`IngestionConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use scorecast_processing::config::IngestionConfig;
///
/// let config = IngestionConfig::builder()
///     .source_path("data/students.csv")
///     .test_size(0.25)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Path of the source dataset (CSV with a header row).
    /// Default: "notebook/data/stud.csv"
    pub source_path: PathBuf,

    /// Fraction of rows held out for the test split (exclusive 0.0 - 1.0).
    /// Default: 0.2
    pub test_size: f64,

    /// Seed of the shuffle that assigns rows to splits.
    /// Identical seeds produce identical splits.
    /// Default: 42
    pub random_seed: u64,

    /// Where the raw copy and the splits are written.
    pub artifacts: ArtifactConfig,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            test_size: 0.2,
            random_seed: 42,
            artifacts: ArtifactConfig::default(),
        }
    }
}

impl IngestionConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> IngestionConfigBuilder {
        IngestionConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "test_size".to_string(),
                value: self.test_size,
            });
        }

        if self.source_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("source_path".to_string()));
        }

        if self.artifacts.artifact_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("artifact_dir".to_string()));
        }

        Ok(())
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value} (must be strictly between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("Path '{0}' must not be empty")]
    EmptyPath(String),
}

impl From<ConfigValidationError> for crate::error::ProcessingError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ProcessingError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`IngestionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct IngestionConfigBuilder {
    source_path: Option<PathBuf>,
    test_size: Option<f64>,
    random_seed: Option<u64>,
    artifacts: Option<ArtifactConfig>,
}

impl IngestionConfigBuilder {
    /// Set the source dataset path.
    #[must_use]
    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Set the held-out fraction.
    ///
    /// # Arguments
    /// * `size` - Value strictly between 0.0 and 1.0 (e.g., 0.2 = 20%)
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.test_size = Some(size);
        self
    }

    /// Set the split seed.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set artifact locations.
    #[must_use]
    pub fn artifacts(mut self, artifacts: ArtifactConfig) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Write artifacts under `dir` with default file names.
    #[must_use]
    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts = Some(ArtifactConfig::in_dir(dir));
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `IngestionConfig` or an error if validation fails.
    pub fn build(self) -> Result<IngestionConfig, ConfigValidationError> {
        let config = IngestionConfig {
            source_path: self
                .source_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_PATH)),
            test_size: self.test_size.unwrap_or(0.2),
            random_seed: self.random_seed.unwrap_or(42),
            artifacts: self.artifacts.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
