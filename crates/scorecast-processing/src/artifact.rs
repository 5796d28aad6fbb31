//! Persistence of artifacts: dataset splits, the fitted transformer and the
//! selected model.
//!
//! Every write goes to a sibling temporary file first and is renamed over
//! the destination, so readers see either the previous artifact or the new
//! one, never a truncated file.

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .context(format!("creating directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Run `write` against a temporary sibling of `path`, then rename it into place.
fn write_atomic(path: &Path, write: impl FnOnce(&mut File) -> Result<()>) -> Result<()> {
    ensure_parent(path)?;
    let temp_path = path.with_extension("tmp");

    let outcome: Result<()> = (|| {
        let mut file = File::create(&temp_path)?;
        write(&mut file)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if outcome.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    outcome.map_err(|e: ProcessingError| e.with_context(format!("writing {}", path.display())))
}

/// Serialize `value` as JSON to `path`, replacing any previous artifact.
pub fn save_object<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    write_atomic(path, |file| {
        file.write_all(&bytes)?;
        Ok(())
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved artifact");
    Ok(())
}

/// Load a JSON artifact previously written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ProcessingError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).context(format!("reading {}", path.display()))?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| ProcessingError::Json(e).with_context(format!("decoding {}", path.display())))?;
    Ok(value)
}

/// Write a frame as CSV with a header row, replacing any previous file.
pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    write_atomic(path, |file| {
        CsvWriter::new(file).include_header(true).finish(df)?;
        Ok(())
    })?;
    debug!(path = %path.display(), rows = df.height(), "Wrote CSV");
    Ok(())
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ProcessingError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("opening {}", path.display()))?
        .finish()
        .context(format!("parsing {}", path.display()))?;
    Ok(df)
}

/// CRC32 of the canonical JSON encoding of `value`, as 8 hex digits.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(format!("{:08x}", crc32fast::hash(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        weights: Vec<f64>,
    }

    fn sample() -> Sample {
        Sample {
            name: "linear".to_string(),
            weights: vec![0.5, -1.25],
        }
    }

    #[test]
    fn test_save_and_load_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");

        save_object(&path, &sample()).unwrap();
        let loaded: Sample = load_object(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        save_object(&path, &sample()).unwrap();
        let replacement = Sample {
            name: "tree".to_string(),
            weights: vec![],
        };
        save_object(&path, &replacement).unwrap();

        let loaded: Sample = load_object(&path).unwrap();
        assert_eq!(loaded.name, "tree");
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Sample> = load_object(&dir.path().join("absent.json"));
        assert!(matches!(
            result,
            Err(ProcessingError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_load_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"{not json").unwrap();

        let result: Result<Sample> = load_object(&path);
        assert_eq!(result.unwrap_err().error_code(), "JSON_ERROR");
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("split.csv");
        let mut df = df![
            "gender" => ["female", "male"],
            "math_score" => [72i64, 69],
        ]
        .unwrap();

        write_csv(&path, &mut df).unwrap();
        let loaded = read_csv(&path).unwrap();

        assert_eq!(loaded.shape(), (2, 2));
        assert!(loaded.equals(&df));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(&sample()).unwrap();
        let b = fingerprint(&sample()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);

        let other = fingerprint(&Sample {
            name: "knn".to_string(),
            weights: vec![0.5, -1.25],
        })
        .unwrap();
        assert_ne!(a, other);
    }
}
