//! Temporal join extraction: meals labeled by nearby symptom events.
//!
//! A meal is a positive sample for a symptom class when a matching symptom
//! event falls inside the response window after it. The window predicate is
//! a pure function over timestamps so the boundary semantics are testable
//! without a store.

use chrono::{Duration, NaiveDateTime, Utc};
use event_store::EventRepository;
use feature_extractor::{extract_meal_features, FeatureVector};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

/// Symptoms appearing sooner than this after a meal are treated as
/// unrelated noise, not caused by it.
pub const RESPONSE_LOWER_BOUND_HOURS: i64 = 4;

/// Errors from training-set extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Too few meals in the lookback window to train or evaluate
    /// meaningfully. Recoverable: the orchestrator skips the class.
    #[error("insufficient training data: {found} samples (minimum {required})")]
    InsufficientData { found: usize, required: usize },

    /// The event store query failed. Not recoverable per class.
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// One labeled training sample.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub meal_id: i64,
    pub features: FeatureVector,
    pub label: bool,
}

/// All training rows for one symptom class, rebuilt every run.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub rows: Vec<TrainingRow>,
}

impl TrainingSet {
    /// Number of positively labeled rows.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.rows.iter().filter(|row| row.label).count()
    }

    /// Dense feature matrix and label vector in row order.
    #[must_use]
    pub fn matrix(&self) -> (Vec<Vec<f64>>, Vec<bool>) {
        let x = self
            .rows
            .iter()
            .map(|row| row.features.values().to_vec())
            .collect();
        let y = self.rows.iter().map(|row| row.label).collect();
        (x, y)
    }
}

/// Oldest timestamp still considered current for training.
#[must_use]
pub fn lookback_cutoff(now: NaiveDateTime, lookback_days: i64) -> NaiveDateTime {
    now - Duration::days(lookback_days)
}

/// Whether a symptom at `symptom_time` is attributed to a meal at
/// `meal_time`: strictly after the 4-hour lower bound, at or before the
/// upper bound. Both edges are part of the labeling contract.
#[must_use]
pub fn symptom_in_window(
    meal_time: NaiveDateTime,
    symptom_time: NaiveDateTime,
    window_hours: i64,
) -> bool {
    let lower = meal_time + Duration::hours(RESPONSE_LOWER_BOUND_HOURS);
    let upper = meal_time + Duration::hours(window_hours);
    symptom_time > lower && symptom_time <= upper
}

/// Labels one meal against all candidate symptom times. Multiple matches
/// collapse to a single positive label.
#[must_use]
pub fn label_meal(
    meal_time: NaiveDateTime,
    symptom_times: &[NaiveDateTime],
    window_hours: i64,
) -> bool {
    symptom_times
        .iter()
        .any(|&symptom_time| symptom_in_window(meal_time, symptom_time, window_hours))
}

/// Builds the full training set for one symptom class.
///
/// # Errors
///
/// Returns [`ExtractError::InsufficientData`] when fewer than `min_samples`
/// meals fall inside the lookback window, or [`ExtractError::Store`] if a
/// query fails.
pub async fn extract_training_set(
    pool: &SqlitePool,
    tag: &str,
    lookback_days: i64,
    window_hours: i64,
    min_samples: usize,
) -> Result<TrainingSet, ExtractError> {
    let cutoff = lookback_cutoff(Utc::now().naive_utc(), lookback_days);

    let meals = EventRepository::meals_since(pool, cutoff).await?;
    if meals.len() < min_samples {
        return Err(ExtractError::InsufficientData {
            found: meals.len(),
            required: min_samples,
        });
    }

    let symptoms = EventRepository::symptoms_tagged_since(pool, tag, cutoff).await?;
    let symptom_times: Vec<NaiveDateTime> = symptoms.iter().map(|s| s.date_time).collect();

    let rows: Vec<TrainingRow> = meals
        .iter()
        .map(|meal| TrainingRow {
            meal_id: meal.id,
            features: extract_meal_features(meal),
            label: label_meal(meal.date_time, &symptom_times, window_hours),
        })
        .collect();

    let set = TrainingSet { rows };
    info!(
        tag,
        rows = set.rows.len(),
        positives = set.positives(),
        "extracted training rows"
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_lower_boundary_is_exclusive() {
        let meal = at(8, 0);
        // Exactly four hours after the meal: excluded.
        assert!(!symptom_in_window(meal, at(12, 0), 8));
        assert!(symptom_in_window(meal, at(12, 1), 8));
    }

    #[test]
    fn test_upper_boundary_is_inclusive() {
        let meal = at(8, 0);
        // Exactly at the window end: included.
        assert!(symptom_in_window(meal, at(16, 0), 8));
        assert!(!symptom_in_window(meal, at(16, 1), 8));
    }

    #[test]
    fn test_symptom_before_meal_never_matches() {
        let meal = at(8, 0);
        assert!(!symptom_in_window(meal, at(7, 0), 8));
    }

    #[test]
    fn test_multiple_matches_collapse_to_one_label() {
        let meal = at(8, 0);
        let symptoms = vec![at(13, 0), at(14, 0), at(15, 30)];
        assert!(label_meal(meal, &symptoms, 8));
    }

    #[test]
    fn test_no_matches_labels_negative() {
        let meal = at(8, 0);
        let symptoms = vec![at(9, 0), at(20, 0)];
        assert!(!label_meal(meal, &symptoms, 8));
    }

    #[test]
    fn test_lookback_cutoff() {
        let now = at(12, 0);
        let cutoff = lookback_cutoff(now, 90);
        assert_eq!(now - cutoff, Duration::days(90));
    }
}
