//! Data side of the student score pipeline.
//!
//! # Overview
//!
//! - **Ingestion**: read the source dataset, keep a raw copy, and write a
//!   seeded train/test split ([`DataIngestion`])
//! - **Transformation**: derive `avg_score`, fit the feature transformer on
//!   the training split once, and encode both splits ([`DataTransformation`])
//! - **Feature transformer**: median/standard-scaled numeric columns and
//!   scaled one-hot categorical columns ([`FeatureTransformer`],
//!   [`FittedTransformer`])
//! - **Artifacts**: atomic JSON and CSV persistence ([`artifact`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scorecast_processing::{DataIngestion, DataTransformation, IngestionConfig};
//!
//! let config = IngestionConfig::builder()
//!     .source_path("notebook/data/stud.csv")
//!     .build()?;
//! let artifacts = config.artifacts.clone();
//!
//! let splits = DataIngestion::new(config).initiate_data_ingestion()?;
//! let output = DataTransformation::new(artifacts)
//!     .initiate_data_transformation(&splits.train, &splits.test)?;
//!
//! println!("train matrix: {:?}", output.train.dim());
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod imputers;
pub mod ingestion;
pub mod schema;
pub mod transformation;
pub mod transformer;
pub mod utils;

// Re-exports for convenient access
pub use config::{ArtifactConfig, ConfigValidationError, IngestionConfig, IngestionConfigBuilder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt, Stage};
pub use imputers::{MedianImputer, MostFrequentImputer};
pub use ingestion::{DataIngestion, SplitPaths, split_indices};
pub use transformation::{
    DataTransformation, TransformationOutput, add_average_score, append_target,
    split_features_target,
};
pub use transformer::{FeatureTransformer, FittedTransformer, TRANSFORMER_FORMAT_VERSION};
pub use utils::parse_numeric_string;
