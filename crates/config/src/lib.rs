//! Configuration for the symptom model trainer.
//!
//! Environment-backed settings (database location, artifact directory) plus
//! the default run parameters shared between the CLI and the library crates.

use std::path::PathBuf;

use anyhow::Context;

/// Default lookback window in days for event queries.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
/// Default upper bound of the symptom response window, in hours after a meal.
pub const DEFAULT_WINDOW_HOURS: i64 = 8;
/// Minimum number of extracted training rows required to fit a model.
pub const DEFAULT_MIN_SAMPLES: usize = 30;
/// Minimum symptom event count for a class to be considered at all.
pub const DEFAULT_MIN_CLASS_COUNT: i64 = 5;
/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
/// Seed for the deterministic train/test split and cross-validation folds.
pub const DEFAULT_SEED: u64 = 42;

/// A trainable symptom class: the exported model name and the tag used to
/// select matching symptom events in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymptomClass {
    /// Model name used for artifacts and history rows.
    pub name: &'static str,
    /// Tag string matched against symptom event tags.
    pub tag: &'static str,
}

/// All symptom classes the trainer attempts, intestinal and
/// extra-intestinal. Tags are the ones users apply in the logging app.
pub const SYMPTOM_CLASSES: &[SymptomClass] = &[
    SymptomClass { name: "pain", tag: "Inflammation" },
    SymptomClass { name: "diarrhea", tag: "Urgent" },
    SymptomClass { name: "bloating", tag: "Gaz" },
    SymptomClass { name: "joints", tag: "Articulations" },
    SymptomClass { name: "skin", tag: "Peau" },
    SymptomClass { name: "oral", tag: "Bouche/ORL" },
    SymptomClass { name: "systemic", tag: "Général" },
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL for the event store.
    pub database_url: String,

    /// Directory where exported model artifacts are written.
    pub models_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `DATABASE_URL`: SQLite connection string for the event store
    ///
    /// Optional environment variables:
    /// - `MODELS_DIR`: Output directory for model artifacts (default: `models`)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

        let models_dir = std::env::var("MODELS_DIR")
            .map_or_else(|_| PathBuf::from("models"), PathBuf::from);

        Ok(Self {
            database_url,
            models_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_unique() {
        let mut names: Vec<&str> = SYMPTOM_CLASSES.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SYMPTOM_CLASSES.len());
    }
}
