//! CLI entry point for training and prediction.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use scorecast_learning::{CustomData, PredictPipeline, TrainerConfig, TrainingPipeline};
use scorecast_processing::config::{DEFAULT_ARTIFACT_DIR, DEFAULT_SOURCE_PATH};
use scorecast_processing::{ArtifactConfig, IngestionConfig};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Student score forecaster",
    long_about = "Trains a catalog of regressors to predict a student's average score \
                  and serves single predictions from the persisted artifacts.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  SCORECAST_DATA           Source dataset for `train`\n  \
                  SCORECAST_ARTIFACT_DIR   Directory holding splits, transformer and model\n\n\
                  EXAMPLES:\n  \
                  scorecast train --data notebook/data/stud.csv --model-seed 7\n\n  \
                  scorecast predict --gender female --race-ethnicity 'group B' \\\n    \
                  --parental-level-of-education \"bachelor's degree\" --lunch standard \\\n    \
                  --test-preparation-course none --math-score 72 --reading-score 72"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run ingestion, transformation and model selection
    Train(TrainArgs),
    /// Predict the average score of one student
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Source dataset (CSV with header)
    #[arg(long, env = "SCORECAST_DATA", default_value = DEFAULT_SOURCE_PATH)]
    data: PathBuf,

    /// Directory for all artifacts
    #[arg(long, env = "SCORECAST_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: PathBuf,

    /// Seed of the train/test split
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Seed for randomized models and CV folds (unseeded when omitted)
    #[arg(long)]
    model_seed: Option<u64>,

    /// Tune each model with a k-fold grid search before the final fit
    #[arg(long)]
    grid_search: bool,

    /// Number of folds for the grid search
    #[arg(long, default_value = "3")]
    cv_folds: usize,

    /// Minimum test R² a model needs to be saved
    #[arg(long, default_value = "0.6")]
    quality_floor: f64,

    /// Print the outcome as JSON on stdout and disable logging
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[arg(long)]
    gender: String,

    #[arg(long)]
    race_ethnicity: String,

    #[arg(long)]
    parental_level_of_education: String,

    #[arg(long)]
    lunch: String,

    #[arg(long)]
    test_preparation_course: String,

    /// Math score; formatted text such as "72" or " 72 " is accepted
    #[arg(long)]
    math_score: String,

    /// Reading score
    #[arg(long)]
    reading_score: String,

    /// Directory holding preprocessor.json and model.json
    #[arg(long, env = "SCORECAST_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: PathBuf,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON document.
fn init_logging(level: &str, quiet: bool, log_dir: Option<&Path>, json_output: bool) -> Result<()> {
    if json_output {
        return Ok(());
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let name = format!("{}.log", chrono::Local::now().format("%m_%d_%Y_%H_%M_%S"));
            let file = File::create(dir.join(&name))
                .with_context(|| format!("cannot create log file {name}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load .env first: SCORECAST_* variables back CLI flags
    dotenv().ok();

    let cli = Cli::parse();

    let json = matches!(&cli.command, Command::Train(args) if args.json);
    init_logging(&cli.log_level, cli.quiet, cli.log_dir.as_deref(), json)?;

    match cli.command {
        Command::Train(args) => run_train(args),
        Command::Predict(args) => run_predict(args),
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let ingestion = IngestionConfig::builder()
        .source_path(&args.data)
        .artifact_dir(&args.artifact_dir)
        .random_seed(args.seed)
        .build()?;

    let mut trainer = TrainerConfig::builder()
        .quality_floor(args.quality_floor)
        .grid_search(args.grid_search)
        .cv_folds(args.cv_folds);
    if let Some(seed) = args.model_seed {
        trainer = trainer.random_seed(seed);
    }

    let pipeline = TrainingPipeline::builder()
        .ingestion(ingestion)
        .trainer(trainer.build()?)
        .build()?;

    info!(data = %args.data.display(), "Starting training run");
    let outcome = match pipeline.run() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(code = e.error_code(), "{e}");
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{:<28} {:>10} {:>10}", "Model", "Train R²", "Test R²");
    println!("{}", "-".repeat(50));
    for score in &outcome.report.scores {
        println!(
            "{:<28} {:>10.4} {:>10.4}",
            score.name, score.train_score, score.test_score
        );
    }
    println!();
    println!(
        "Best model: {} (R² {:.4}) saved to {}",
        outcome.best_model_name,
        outcome.best_model_score,
        outcome.model_path.display()
    );
    Ok(())
}

/// Parse the submitted fields and predict against the artifact directory.
fn predict_score(args: &PredictArgs) -> scorecast_learning::Result<f64> {
    let record = CustomData::from_text_fields(
        &args.gender,
        &args.race_ethnicity,
        &args.parental_level_of_education,
        &args.lunch,
        &args.test_preparation_course,
        &args.math_score,
        &args.reading_score,
    )?;
    PredictPipeline::new(ArtifactConfig::in_dir(&args.artifact_dir)).predict_one(&record)
}

fn run_predict(args: PredictArgs) -> Result<()> {
    match predict_score(&args) {
        Ok(score) => {
            println!("{score:.2}");
            Ok(())
        }
        Err(e) => {
            // Diagnostics go to the log; the user gets the generic message.
            error!(code = e.error_code(), "{e}");
            anyhow::bail!(e.user_message())
        }
    }
}
