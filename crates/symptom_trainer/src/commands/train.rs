//! Train command - the full per-class training pipeline.
//!
//! Probe, extract, fit, evaluate, export, and record history for every
//! eligible symptom class. Classes are processed strictly one at a time; a
//! class that fails the minimum-sample precondition is skipped with a
//! warning and does not affect the others.

use anyhow::Result;
use chrono::Utc;
use config::{SymptomClass, SYMPTOM_CLASSES};
use event_store::TrainingHistoryRepository;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use tree_model::metrics::{cross_val_f1, evaluate, ConfusionCounts};
use tree_model::split::stratified_split;
use tree_model::DecisionTree;

use crate::extract::{self, ExtractError, TrainingSet};
use crate::probe;
use crate::run::{RunContext, RunParams, TrainedModel};

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if the event store becomes unreachable or an artifact
/// cannot be written. Per-class insufficient-data failures are skipped, and
/// history persistence failures are reported but never fatal.
pub async fn run(pool: &SqlitePool, params: RunParams) -> Result<()> {
    info!(
        lookback_days = params.lookback_days,
        window_hours = params.window_hours,
        min_samples = params.min_samples,
        "starting training run"
    );

    let eligible = probe::eligible_classes(
        pool,
        SYMPTOM_CLASSES,
        params.lookback_days,
        params.min_class_count,
    )
    .await?;

    if eligible.is_empty() {
        warn!("no symptom classes have sufficient data for training");
        info!("log some symptoms in the app, then try training again");
        return Ok(());
    }
    info!(classes = eligible.len(), "proceeding with eligible symptom classes");

    let mut ctx = RunContext::new(params);
    for entry in &eligible {
        let class = entry.class;
        let set = match extract::extract_training_set(
            pool,
            class.tag,
            ctx.params.lookback_days,
            ctx.params.window_hours,
            ctx.params.min_samples,
        )
        .await
        {
            Ok(set) => set,
            Err(ExtractError::InsufficientData { found, required }) => {
                warn!(
                    class = class.name,
                    found, required, "skipping class, insufficient training data"
                );
                continue;
            }
            Err(ExtractError::Store(error)) => return Err(error.into()),
        };

        let trained = fit_and_evaluate(&ctx.params, class, &set)?;

        let artifact = trained.artifact(&ctx.params)?;
        let path = model_export::write_artifact(&ctx.params.models_dir, &artifact)?;
        info!(class = class.name, path = %path.display(), "model exported");

        ctx.record(trained);
    }

    if ctx.trained().is_empty() {
        warn!("no models were successfully trained");
        return Ok(());
    }

    record_history(pool, &ctx).await;

    info!(models = ?ctx.model_names(), "training complete");
    Ok(())
}

/// Fits and evaluates one class: deterministic stratified split, tree fit,
/// held-out metrics, cross-validated F1, and ranked feature importances.
fn fit_and_evaluate(
    params: &RunParams,
    class: SymptomClass,
    set: &TrainingSet,
) -> Result<TrainedModel> {
    let (x, y) = set.matrix();
    let (train_idx, test_idx) = stratified_split(&y, params.test_fraction, params.seed);
    info!(
        class = class.name,
        train = train_idx.len(),
        test = test_idx.len(),
        "split training data"
    );

    let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let train_y: Vec<bool> = train_idx.iter().map(|&i| y[i]).collect();
    let tree = DecisionTree::fit(&train_x, &train_y, &params.tree)?;

    let test_y: Vec<bool> = test_idx.iter().map(|&i| y[i]).collect();
    let predictions: Vec<bool> = test_idx
        .iter()
        .map(|&i| tree.predict(&x[i]).class == 1)
        .collect();
    let evaluation = evaluate(&test_y, &predictions);
    info!(
        class = class.name,
        "held-out evaluation: accuracy {:.3}, precision {:.3}, recall {:.3}, F1 {:.3}",
        evaluation.accuracy,
        evaluation.precision,
        evaluation.recall,
        evaluation.f1
    );

    let confusion = ConfusionCounts::from_predictions(&test_y, &predictions);
    debug!(
        tp = confusion.true_positives,
        fp = confusion.false_positives,
        fn_ = confusion.false_negatives,
        tn = confusion.true_negatives,
        "confusion matrix"
    );

    // Small samples get fewer folds so every fold still has both classes.
    let k = 5.min(train_y.len() / 2);
    let cross_validation = if k >= 2 {
        let cv = cross_val_f1(&train_x, &train_y, &params.tree, k, params.seed)?;
        info!(
            class = class.name,
            k,
            "cross-validated F1: {:.3} (+/- {:.3})",
            cv.mean_f1,
            cv.std_f1
        );
        Some(cv)
    } else {
        warn!(class = class.name, "train split too small for cross-validation");
        None
    };

    let importances = tree.feature_importances().to_vec();
    let trained = TrainedModel {
        name: class.name.to_string(),
        tag: class.tag.to_string(),
        sample_size: set.rows.len(),
        positives: set.positives(),
        tree,
        evaluation,
        cross_validation,
        importances,
        trained_at: Utc::now().naive_utc(),
    };

    for (name, importance) in trained.ranked_importances().iter().take(10) {
        if *importance > 0.0 {
            debug!(class = class.name, feature = *name, "importance {importance:.4}");
        }
    }

    Ok(trained)
}

/// Appends one history row per trained model. History is best-effort
/// telemetry; failures are reported and the run continues.
async fn record_history(pool: &SqlitePool, ctx: &RunContext) {
    let mut saved = 0usize;
    for model in ctx.trained() {
        match TrainingHistoryRepository::append(pool, model.history_record()).await {
            Ok(()) => saved += 1,
            Err(error) => {
                warn!(model = model.name.as_str(), %error, "failed to save training history");
            }
        }
    }
    info!(saved, "training history saved");
}
