//! Dataset ingestion: raw copy plus a seeded train/test split.

use crate::artifact::{read_csv, write_csv};
use crate::config::IngestionConfig;
use crate::error::{ProcessingError, Result, ResultExt, Stage};
use polars::prelude::*;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, info_span};

/// Paths of the two splits handed to the transformation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPaths {
    pub train: PathBuf,
    pub test: PathBuf,
}

/// Row indices of a split, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<IdxSize>,
    pub test: Vec<IdxSize>,
}

/// Shuffle `0..n_rows` with a seeded ChaCha stream and cut off the first
/// `ceil(n_rows * test_size)` rows as the test split.
///
/// Fails when either side would be empty.
pub fn split_indices(n_rows: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    let n_test = (n_rows as f64 * test_size).ceil() as usize;
    if n_rows == 0 || n_test == 0 || n_test >= n_rows {
        return Err(ProcessingError::EmptyDataset(format!(
            "{n_rows} rows cannot be split with test_size {test_size}"
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Reads the source dataset and writes the raw, train and test artifacts.
#[derive(Debug, Clone)]
pub struct DataIngestion {
    config: IngestionConfig,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Run ingestion end to end and return the split paths.
    ///
    /// Every failure is reported as an ingestion-stage error. Nothing is
    /// written when the source cannot be read.
    pub fn initiate_data_ingestion(&self) -> Result<SplitPaths> {
        let _span = info_span!("ingestion").entered();
        info!(source = %self.config.source_path.display(), "Entered the data ingestion stage");
        self.run().stage(Stage::Ingestion)
    }

    fn run(&self) -> Result<SplitPaths> {
        let artifacts = &self.config.artifacts;

        let mut raw = read_csv(&self.config.source_path).context("reading source dataset")?;
        info!(rows = raw.height(), columns = raw.width(), "Read the dataset");

        let SplitIndices { train, test } =
            split_indices(raw.height(), self.config.test_size, self.config.random_seed)?;

        let mut train_df = raw.take(&IdxCa::from_vec("idx".into(), train))?;
        let mut test_df = raw.take(&IdxCa::from_vec("idx".into(), test))?;

        write_csv(&artifacts.raw_data_path(), &mut raw)?;
        write_csv(&artifacts.train_data_path(), &mut train_df)?;
        write_csv(&artifacts.test_data_path(), &mut test_df)?;

        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            seed = self.config.random_seed,
            "Ingestion of the data is completed"
        );

        Ok(SplitPaths {
            train: artifacts.train_data_path(),
            test: artifacts.test_data_path(),
        })
    }
}
