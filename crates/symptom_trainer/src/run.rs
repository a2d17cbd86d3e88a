//! Per-run state: parameters and accumulated results.
//!
//! A training run's state lives in an explicit [`RunContext`] threaded
//! through the pipeline stages, never in process-wide fields, so stages stay
//! re-entrant and testable in isolation.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use event_store::CreateTrainingHistory;
use feature_extractor::FEATURE_NAMES;
use model_export::{ExportMetrics, ModelArtifact};
use serde_json::Value;
use tree_model::metrics::{CrossValidation, Evaluation};
use tree_model::{DecisionTree, TreeParams};

/// Everything that parameterizes one training run. All values are supplied
/// externally (CLI flags and environment), none are business logic.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub lookback_days: i64,
    pub window_hours: i64,
    pub min_samples: usize,
    pub min_class_count: i64,
    pub test_fraction: f64,
    pub seed: u64,
    pub tree: TreeParams,
    pub models_dir: PathBuf,
}

/// A fitted model for one symptom class plus everything the exporter and
/// history recorder need.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub name: String,
    pub tag: String,
    pub sample_size: usize,
    pub positives: usize,
    pub tree: DecisionTree,
    pub evaluation: Evaluation,
    pub cross_validation: Option<CrossValidation>,
    pub importances: Vec<f64>,
    pub trained_at: NaiveDateTime,
}

impl TrainedModel {
    /// Feature importances paired with their names, highest first.
    #[must_use]
    pub fn ranked_importances(&self) -> Vec<(&'static str, f64)> {
        let mut ranked: Vec<(&'static str, f64)> = FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// The audit row appended to the training history log.
    #[must_use]
    pub fn history_record(&self) -> CreateTrainingHistory {
        let importances: serde_json::Map<String, Value> = FEATURE_NAMES
            .iter()
            .zip(&self.importances)
            .map(|(name, &value)| ((*name).to_string(), Value::from(value)))
            .collect();

        CreateTrainingHistory {
            model_name: self.name.clone(),
            trained_at: self.trained_at,
            sample_size: self.sample_size as i64,
            accuracy: self.evaluation.accuracy,
            precision: self.evaluation.precision,
            recall: self.evaluation.recall,
            f1: self.evaluation.f1,
            feature_importances: Value::Object(importances),
            validation_passed: true,
        }
    }

    /// Builds the portable export artifact for this model.
    ///
    /// # Errors
    ///
    /// Returns an error if tree serialization fails.
    pub fn artifact(&self, params: &RunParams) -> anyhow::Result<ModelArtifact> {
        Ok(ModelArtifact {
            symptom_type: self.name.clone(),
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            tree_structure: model_export::serialize_tree(&self.tree, &FEATURE_NAMES)?,
            metrics: ExportMetrics {
                accuracy: self.evaluation.accuracy,
                precision: self.evaluation.precision,
                recall: self.evaluation.recall,
                f1: self.evaluation.f1,
            },
            training_date: self.trained_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            lookback_days: params.lookback_days,
            time_window_hours: params.window_hours,
        })
    }
}

/// Accumulated state of one training run, populated sequentially by the
/// orchestrator.
#[derive(Debug)]
pub struct RunContext {
    pub params: RunParams,
    trained: Vec<TrainedModel>,
}

impl RunContext {
    #[must_use]
    pub fn new(params: RunParams) -> Self {
        Self {
            params,
            trained: Vec::new(),
        }
    }

    pub fn record(&mut self, model: TrainedModel) {
        self.trained.push(model);
    }

    #[must_use]
    pub fn trained(&self) -> &[TrainedModel] {
        &self.trained
    }

    /// Names of all models trained this run, in training order.
    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.trained.iter().map(|m| m.name.as_str()).collect()
    }
}
