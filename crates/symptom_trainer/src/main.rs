//! Symptom Model Trainer
//!
//! Trains per-symptom decision-tree classifiers from the meal/symptom event
//! log and exports them for on-device inference.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use event_store::{create_pool, run_migrations};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use symptom_trainer::commands;
use symptom_trainer::run::RunParams;
use tree_model::TreeParams;

/// Symptom Model Trainer
#[derive(Parser)]
#[command(name = "symptom-trainer")]
#[command(about = "Trains per-symptom prediction models from the meal/symptom event log")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and export models for all eligible symptom classes
    Train {
        /// Maximum event age considered for training, in days
        #[arg(long, default_value_t = config::DEFAULT_LOOKBACK_DAYS)]
        lookback_days: i64,

        /// Upper bound of the symptom response window, in hours after a meal
        #[arg(long, default_value_t = config::DEFAULT_WINDOW_HOURS)]
        window_hours: i64,

        /// Minimum extracted rows required to train a class
        #[arg(long, default_value_t = config::DEFAULT_MIN_SAMPLES)]
        min_samples: usize,

        /// Minimum symptom event count for a class to be probed eligible
        #[arg(long, default_value_t = config::DEFAULT_MIN_CLASS_COUNT)]
        min_class_count: i64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = config::DEFAULT_TEST_FRACTION)]
        test_fraction: f64,

        /// Seed for the deterministic split and cross-validation folds
        #[arg(long, default_value_t = config::DEFAULT_SEED)]
        seed: u64,

        /// Output directory for model artifacts (defaults to MODELS_DIR)
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Maximum decision tree depth
        #[arg(long, default_value_t = 10)]
        max_depth: usize,

        /// Minimum rows required to attempt a split
        #[arg(long, default_value_t = 15)]
        min_samples_split: usize,

        /// Minimum rows on each side of a split
        #[arg(long, default_value_t = 5)]
        min_samples_leaf: usize,

        /// Disable balanced class weighting
        #[arg(long)]
        no_balance: bool,
    },

    /// Report which symptom classes have enough data to train
    Probe {
        /// Maximum event age considered, in days
        #[arg(long, default_value_t = config::DEFAULT_LOOKBACK_DAYS)]
        lookback_days: i64,

        /// Minimum symptom event count for eligibility
        #[arg(long, default_value_t = config::DEFAULT_MIN_CLASS_COUNT)]
        min_class_count: i64,
    },

    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::Config::from_env()?;

    // An unreachable store is fatal before any class is processed.
    let pool = create_pool(&config.database_url).await?;

    let result = dispatch(&pool, &config, cli.command).await;

    // The pool is released exactly once, on every exit path.
    pool.close().await;
    result
}

async fn dispatch(pool: &SqlitePool, config: &config::Config, command: Commands) -> Result<()> {
    match command {
        Commands::Train {
            lookback_days,
            window_hours,
            min_samples,
            min_class_count,
            test_fraction,
            seed,
            models_dir,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            no_balance,
        } => {
            let params = RunParams {
                lookback_days,
                window_hours,
                min_samples,
                min_class_count,
                test_fraction,
                seed,
                tree: TreeParams {
                    max_depth,
                    min_samples_split,
                    min_samples_leaf,
                    balanced: !no_balance,
                },
                models_dir: models_dir.unwrap_or_else(|| config.models_dir.clone()),
            };
            commands::train::run(pool, params).await
        }
        Commands::Probe {
            lookback_days,
            min_class_count,
        } => commands::probe::run(pool, lookback_days, min_class_count).await,
        Commands::Migrate => {
            run_migrations(pool).await?;
            info!("migrations complete");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_flags_default_and_override() {
        let cli = Cli::try_parse_from(["symptom-trainer", "train"]).unwrap();
        match cli.command {
            Commands::Train {
                test_fraction,
                seed,
                ..
            } => {
                assert!((test_fraction - config::DEFAULT_TEST_FRACTION).abs() < f64::EPSILON);
                assert_eq!(seed, config::DEFAULT_SEED);
            }
            _ => panic!("expected train command"),
        }

        let cli =
            Cli::try_parse_from(["symptom-trainer", "train", "--test-fraction", "0.3"]).unwrap();
        match cli.command {
            Commands::Train { test_fraction, .. } => {
                assert!((test_fraction - 0.3).abs() < f64::EPSILON);
            }
            _ => panic!("expected train command"),
        }
    }
}
