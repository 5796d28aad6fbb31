//! Transformation stage: derive the target, fit the transformer on the
//! training features, encode both splits and persist the fitted state.

use crate::artifact::{read_csv, save_object};
use crate::config::ArtifactConfig;
use crate::error::{ProcessingError, Result, ResultExt, Stage};
use crate::schema::{SCORE_COLUMNS, TARGET, WRITING_SCORE};
use crate::transformer::FeatureTransformer;
use crate::utils::{numeric_values, require_columns};
use ndarray::{Array1, Array2, s};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};

/// Encoded splits plus the persisted transformer's location and tag.
///
/// Both matrices carry the target as their last column.
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    pub train: Array2<f64>,
    pub test: Array2<f64>,
    pub preprocessor_path: PathBuf,
    pub fingerprint: String,
    pub feature_names: Vec<String>,
}

/// Add `avg_score` (mean of the three scores) and drop `writing_score`.
///
/// A missing or non-numeric score fails rather than producing a NaN target.
pub fn add_average_score(df: &DataFrame) -> Result<DataFrame> {
    require_columns(df, &SCORE_COLUMNS)?;

    let columns = SCORE_COLUMNS
        .iter()
        .map(|c| numeric_values(df, c))
        .collect::<Result<Vec<_>>>()?;

    let mut avg = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut total = 0.0;
        for (name, values) in SCORE_COLUMNS.iter().zip(&columns) {
            total += values[row].ok_or_else(|| ProcessingError::InvalidValue {
                column: (*name).to_string(),
                row,
            })?;
        }
        avg.push(total / SCORE_COLUMNS.len() as f64);
    }

    let mut out = df.drop(WRITING_SCORE)?;
    out.with_column(Series::new(TARGET.into(), avg))?;
    Ok(out)
}

/// Separate the target column from the input features.
pub fn split_features_target(df: &DataFrame) -> Result<(DataFrame, Array1<f64>)> {
    let target = numeric_values(df, TARGET)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| ProcessingError::InvalidValue {
                column: TARGET.to_string(),
                row,
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    let features = df.drop(TARGET)?;
    Ok((features, Array1::from(target)))
}

/// Append `target` as the last column of `features`.
pub fn append_target(features: &Array2<f64>, target: &Array1<f64>) -> Array2<f64> {
    let (rows, width) = features.dim();
    let mut out = Array2::<f64>::zeros((rows, width + 1));
    out.slice_mut(s![.., ..width]).assign(features);
    out.column_mut(width).assign(target);
    out
}

/// Runs the transformation stage against the split artifacts.
#[derive(Debug, Clone, Default)]
pub struct DataTransformation {
    artifacts: ArtifactConfig,
}

impl DataTransformation {
    pub fn new(artifacts: ArtifactConfig) -> Self {
        Self { artifacts }
    }

    /// Encode both splits and persist the fitted transformer.
    ///
    /// Every failure is reported as a transformation-stage error; nothing is
    /// persisted unless both splits encode.
    pub fn initiate_data_transformation(
        &self,
        train_path: &Path,
        test_path: &Path,
    ) -> Result<TransformationOutput> {
        let _span = info_span!("transformation").entered();
        self.run(train_path, test_path).stage(Stage::Transformation)
    }

    fn run(&self, train_path: &Path, test_path: &Path) -> Result<TransformationOutput> {
        let train_df = read_csv(train_path).context("reading train split")?;
        let test_df = read_csv(test_path).context("reading test split")?;
        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            "Read train and test data completed"
        );

        let train_df = add_average_score(&train_df).context("train split")?;
        let test_df = add_average_score(&test_df).context("test split")?;

        let (train_features, train_target) = split_features_target(&train_df)?;
        let (test_features, test_target) = split_features_target(&test_df)?;

        info!("Applying preprocessing object on training and testing frames");
        let (transformer, train_matrix) =
            FeatureTransformer::new().fit_transform(&train_features).context("train split")?;
        let test_matrix = transformer.transform(&test_features).context("test split")?;
        debug!(features = ?transformer.feature_names_out(), "Encoded feature layout");

        let preprocessor_path = self.artifacts.preprocessor_path();
        save_object(&preprocessor_path, &transformer)?;
        let fingerprint = transformer.fingerprint()?;
        info!(
            path = %preprocessor_path.display(),
            fingerprint = %fingerprint,
            "Saved preprocessing object"
        );

        Ok(TransformationOutput {
            train: append_target(&train_matrix, &train_target),
            test: append_target(&test_matrix, &test_target),
            preprocessor_path,
            fingerprint,
            feature_names: transformer.feature_names_out(),
        })
    }
}
