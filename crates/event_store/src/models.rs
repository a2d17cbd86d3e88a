//! Row models for the event log and training history.

use chrono::NaiveDateTime;

/// A logged meal event with its structured payloads still raw.
///
/// `meta_data` carries the nutrition payload (a JSON object with a `foods`
/// list) and `context_data` the environmental context captured at logging
/// time. Both are nullable and may contain malformed JSON; downstream
/// feature extraction degrades to defaults rather than failing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealEvent {
    pub id: i64,
    #[sqlx(rename = "dateTime")]
    pub date_time: NaiveDateTime,
    pub tags: String,
    pub meta_data: Option<String>,
    pub context_data: Option<String>,
}

impl MealEvent {
    /// Splits the comma-separated tag column into individual tags.
    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A logged symptom event. Only the timestamp participates in the temporal
/// join; severity is kept for future weighting.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SymptomEvent {
    pub id: i64,
    #[sqlx(rename = "dateTime")]
    pub date_time: NaiveDateTime,
    pub severity: Option<i64>,
}

/// Input for inserting an event row. The trainer itself is a read-only
/// consumer of the log; this exists for the logging side and for tests.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub event_type: String,
    pub date_time: NaiveDateTime,
    pub tags: String,
    pub meta_data: Option<String>,
    pub context_data: Option<String>,
    pub severity: Option<i64>,
}

/// Input for appending one training-run audit row.
#[derive(Debug, Clone)]
pub struct CreateTrainingHistory {
    pub model_name: String,
    pub trained_at: NaiveDateTime,
    pub sample_size: i64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// JSON object mapping feature name to importance.
    pub feature_importances: serde_json::Value,
    pub validation_passed: bool,
}
