//! Binary classification metrics and cross-validation.

use crate::split::stratified_kfold;
use crate::{DecisionTree, TreeParams};

/// Confusion counts for binary predictions, positive class = symptom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    /// Tallies predictions against ground truth.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[must_use]
    pub fn from_predictions(y_true: &[bool], y_pred: &[bool]) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "predictions and targets must have same length"
        );

        let mut counts = Self::default();
        for (&truth, &predicted) in y_true.iter().zip(y_pred) {
            match (truth, predicted) {
                (true, true) => counts.true_positives += 1,
                (false, true) => counts.false_positives += 1,
                (true, false) => counts.false_negatives += 1,
                (false, false) => counts.true_negatives += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// Held-out evaluation summary for one trained model.
///
/// Undefined ratios (zero denominators) report as 0.0 rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Computes accuracy, precision, recall, and F1 for binary predictions.
#[must_use]
pub fn evaluate(y_true: &[bool], y_pred: &[bool]) -> Evaluation {
    let counts = ConfusionCounts::from_predictions(y_true, y_pred);

    let accuracy = ratio(
        counts.true_positives + counts.true_negatives,
        counts.total(),
    );
    let precision = ratio(
        counts.true_positives,
        counts.true_positives + counts.false_positives,
    );
    let recall = ratio(
        counts.true_positives,
        counts.true_positives + counts.false_negatives,
    );
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Evaluation {
        accuracy,
        precision,
        recall,
        f1,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Cross-validated F1 scores.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub mean_f1: f64,
    pub std_f1: f64,
    pub fold_scores: Vec<f64>,
}

/// Runs stratified k-fold cross-validation, refitting a tree per fold and
/// scoring F1 on the held-out fold.
///
/// # Errors
///
/// Returns an error if `k` is out of range for the data, or if a fold fails
/// to fit.
pub fn cross_val_f1(
    x: &[Vec<f64>],
    y: &[bool],
    params: &TreeParams,
    k: usize,
    seed: u64,
) -> anyhow::Result<CrossValidation> {
    anyhow::ensure!(k >= 2, "cross-validation requires k >= 2, got {k}");
    anyhow::ensure!(
        k <= y.len(),
        "cross-validation with k = {k} needs at least {k} rows, got {}",
        y.len()
    );

    let mut fold_scores = Vec::with_capacity(k);
    for (train_idx, test_idx) in stratified_kfold(y, k, seed) {
        let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
        let train_y: Vec<bool> = train_idx.iter().map(|&i| y[i]).collect();
        let tree = DecisionTree::fit(&train_x, &train_y, params)?;

        let test_y: Vec<bool> = test_idx.iter().map(|&i| y[i]).collect();
        let predictions: Vec<bool> = test_idx
            .iter()
            .map(|&i| tree.predict(&x[i]).class == 1)
            .collect();
        fold_scores.push(evaluate(&test_y, &predictions).f1);
    }

    let mean_f1 = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    let variance = fold_scores
        .iter()
        .map(|score| (score - mean_f1).powi(2))
        .sum::<f64>()
        / fold_scores.len() as f64;

    Ok(CrossValidation {
        mean_f1,
        std_f1: variance.sqrt(),
        fold_scores,
    })
}
