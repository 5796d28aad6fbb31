//! End-to-end tests: training runs on synthetic datasets, then inference
//! against the artifacts they leave behind.

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scorecast_learning::{
    Candidate, CustomData, Evaluate, EvaluationData, LearningError, ModelKind, ModelReport,
    ModelScore, ModelTrainer, PredictPipeline, TrainerConfig, TrainingOutcome, TrainingPipeline,
};
use scorecast_processing::{
    ArtifactConfig, DataIngestion, DataTransformation, IngestionConfig, TRANSFORMER_FORMAT_VERSION,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// Helper Functions
// ============================================================================

const GENDERS: [&str; 2] = ["female", "male"];
const GROUPS: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];
const EDUCATION: [&str; 6] = [
    "associate's degree",
    "bachelor's degree",
    "high school",
    "master's degree",
    "some college",
    "some high school",
];
const LUNCH: [&str; 2] = ["free/reduced", "standard"];
const PREP: [&str; 2] = ["completed", "none"];

/// Write a student dataset whose (math, reading, writing) come from `scores`.
fn write_dataset<F>(path: &Path, rows: usize, seed: u64, mut scores: F)
where
    F: FnMut(&mut ChaCha8Rng) -> (u32, u32, u32),
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut csv = String::from(
        "gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,math_score,reading_score,writing_score\n",
    );
    for id in 0..rows {
        let (math, reading, writing) = scores(&mut rng);
        csv.push_str(&format!(
            "{},{},\"{}\",{},{},{math},{reading},{writing}\n",
            GENDERS[id % GENDERS.len()],
            GROUPS[id % GROUPS.len()],
            EDUCATION[id % EDUCATION.len()],
            LUNCH[(id / 2) % LUNCH.len()],
            PREP[(id / 3) % PREP.len()],
        ));
    }
    fs::write(path, csv).unwrap();
}

/// Writing mirrors reading, so the target is an exact linear function of
/// the two numeric features.
fn linear_scores(rng: &mut ChaCha8Rng) -> (u32, u32, u32) {
    let math = rng.gen_range(20..=100);
    let reading = rng.gen_range(20..=100);
    (math, reading, reading)
}

/// Math and reading barely vary; the target is driven by the dropped
/// writing score.
fn uninformative_scores(rng: &mut ChaCha8Rng) -> (u32, u32, u32) {
    (
        rng.gen_range(50..=51),
        rng.gen_range(50..=51),
        rng.gen_range(0..=100),
    )
}

fn train_in(dir: &Path, rows: usize, split_seed: u64) -> Result<TrainingOutcome, LearningError> {
    let source = dir.join("stud.csv");
    write_dataset(&source, rows, 5, linear_scores);

    let ingestion = IngestionConfig::builder()
        .source_path(source)
        .artifact_dir(dir.join("artifact"))
        .random_seed(split_seed)
        .build()?;
    let trainer = TrainerConfig::builder().random_seed(7).build()?;

    TrainingPipeline::builder()
        .ingestion(ingestion)
        .trainer(trainer)
        .build()?
        .run()
}

fn sample_record(lunch: &str) -> CustomData {
    CustomData::from_text_fields(
        "female",
        "group B",
        "bachelor's degree",
        lunch,
        "none",
        "72",
        "72",
    )
    .unwrap()
}

// ============================================================================
// Training Tests
// ============================================================================

#[test]
fn test_linear_relationship_selects_linear_regression() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = train_in(dir.path(), 150, 42).unwrap();

    assert_eq!(outcome.best_model_name, "Linear Regression");
    assert!(outcome.best_model_score > 0.99);
    assert!(outcome.model_path.exists());

    let names: Vec<&str> = outcome.report.test_scores().iter().map(|(n, _)| *n).collect();
    let catalog: Vec<&str> = ModelKind::ALL.iter().map(|k| k.display_name()).collect();
    assert_eq!(names, catalog);
}

#[test]
fn test_uninformative_features_persist_no_model() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    write_dataset(&source, 150, 9, uninformative_scores);

    let artifacts = ArtifactConfig::in_dir(dir.path().join("artifact"));
    let ingestion = IngestionConfig::builder()
        .source_path(source)
        .artifacts(artifacts.clone())
        .build()
        .unwrap();

    let err = TrainingPipeline::builder()
        .ingestion(ingestion)
        .trainer(TrainerConfig::builder().random_seed(1).build().unwrap())
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(err, LearningError::ModelQuality { .. }), "got {err:?}");
    assert_eq!(err.error_code(), "MODEL_QUALITY");
    assert!(artifacts.preprocessor_path().exists());
    assert!(!artifacts.model_path().exists());
}

/// Scores every candidate identically without fitting.
struct EqualScores;

impl Evaluate for EqualScores {
    fn evaluate(
        &self,
        _data: &EvaluationData,
        candidates: &mut [Candidate],
    ) -> scorecast_learning::Result<ModelReport> {
        Ok(ModelReport {
            scores: candidates
                .iter()
                .map(|(kind, _)| ModelScore {
                    name: kind.display_name().to_string(),
                    kind: *kind,
                    train_score: 0.75,
                    test_score: 0.75,
                    test_mae: 1.0,
                    test_rmse: 1.0,
                    params: BTreeMap::new(),
                })
                .collect(),
        })
    }
}

#[test]
fn test_equal_scores_select_first_in_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stud.csv");
    write_dataset(&source, 60, 3, linear_scores);

    let artifacts = ArtifactConfig::in_dir(dir.path().join("artifact"));
    let ingestion = IngestionConfig::builder()
        .source_path(source)
        .artifacts(artifacts.clone())
        .build()
        .unwrap();
    let splits = DataIngestion::new(ingestion).initiate_data_ingestion().unwrap();
    let transformed = DataTransformation::new(artifacts.clone())
        .initiate_data_transformation(&splits.train, &splits.test)
        .unwrap();

    let outcome = ModelTrainer::new(TrainerConfig::default(), artifacts)
        .unwrap()
        .with_evaluator(EqualScores)
        .initiate_model_trainer(&transformed.train, &transformed.test, &transformed.fingerprint)
        .unwrap();

    assert_eq!(outcome.best_model_name, "Linear Regression");
    assert_eq!(outcome.best_model_score, 0.75);
}

// ============================================================================
// Inference Tests
// ============================================================================

#[test]
fn test_inference_is_repeatable_and_rounded() {
    let dir = tempfile::tempdir().unwrap();
    train_in(dir.path(), 150, 42).unwrap();

    let pipeline = PredictPipeline::new(ArtifactConfig::in_dir(dir.path().join("artifact")));
    let record = sample_record("standard");

    let first = pipeline.predict_one(&record).unwrap();
    let second = pipeline.predict_one(&record).unwrap();

    assert_eq!(first, second);
    assert_eq!((first * 100.0).round() / 100.0, first);
    // avg = (72 + 72 + 72) / 3 under the linear relationship
    assert!((first - 72.0).abs() < 0.5, "predicted {first}");
}

#[test]
fn test_unseen_category_does_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    train_in(dir.path(), 150, 42).unwrap();

    let pipeline = PredictPipeline::new(ArtifactConfig::in_dir(dir.path().join("artifact")));
    let prediction = pipeline.predict_one(&sample_record("catered")).unwrap();
    assert!(prediction.is_finite());
}

#[test]
fn test_missing_column_is_inference_error() {
    let dir = tempfile::tempdir().unwrap();
    train_in(dir.path(), 150, 42).unwrap();

    let pipeline = PredictPipeline::new(ArtifactConfig::in_dir(dir.path().join("artifact")));
    let df = sample_record("standard").to_dataframe().unwrap().drop("lunch").unwrap();

    let err = pipeline.predict(&df).unwrap_err();
    assert_eq!(err.error_code(), "INFERENCE_FAILED");
}

#[test]
fn test_mismatched_artifacts_are_refused() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    train_in(first.path(), 150, 42).unwrap();
    train_in(second.path(), 150, 7).unwrap();

    // Replace the first run's transformer with the second run's.
    let target = ArtifactConfig::in_dir(first.path().join("artifact"));
    let other = ArtifactConfig::in_dir(second.path().join("artifact"));
    fs::copy(other.preprocessor_path(), target.preprocessor_path()).unwrap();

    let err = PredictPipeline::new(target)
        .predict_one(&sample_record("standard"))
        .unwrap_err();

    match err {
        LearningError::Inference(inner) => assert!(
            matches!(*inner, LearningError::IncompatibleArtifacts { .. }),
            "got {inner:?}"
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_newer_transformer_format_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    train_in(dir.path(), 150, 42).unwrap();

    let artifacts = ArtifactConfig::in_dir(dir.path().join("artifact"));
    let path = artifacts.preprocessor_path();
    let mut stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    stored["format_version"] = serde_json::json!(TRANSFORMER_FORMAT_VERSION + 1);
    fs::write(&path, stored.to_string()).unwrap();

    let err = PredictPipeline::new(artifacts)
        .predict_one(&sample_record("standard"))
        .unwrap_err();

    match err {
        LearningError::Inference(inner) => match *inner {
            LearningError::IncompatibleArtifacts { expected, found } => {
                assert_eq!(expected, format!("transformer format {TRANSFORMER_FORMAT_VERSION}"));
                assert_eq!(found, format!("transformer format {}", TRANSFORMER_FORMAT_VERSION + 1));
            }
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
}
