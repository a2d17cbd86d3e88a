//! Repository functions for event store operations.
//!
//! All queries are parameterized; tag selectors and window bounds are bound
//! values, never spliced into query text.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::models::{CreateEvent, CreateTrainingHistory, MealEvent, SymptomEvent};

/// Repository for event log queries.
pub struct EventRepository;

impl EventRepository {
    /// Lists all meal events logged at or after `cutoff`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn meals_since(
        pool: &SqlitePool,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<MealEvent>, sqlx::Error> {
        sqlx::query_as::<_, MealEvent>(
            r#"
            SELECT id, dateTime, tags, meta_data, context_data
            FROM events
            WHERE type = 'meal' AND dateTime >= ?1
            ORDER BY dateTime DESC
            "#,
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Lists symptom events whose tags contain `tag`, logged at or after
    /// `cutoff`, in chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn symptoms_tagged_since(
        pool: &SqlitePool,
        tag: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<SymptomEvent>, sqlx::Error> {
        sqlx::query_as::<_, SymptomEvent>(
            r#"
            SELECT id, dateTime, severity
            FROM events
            WHERE type = 'symptom'
              AND tags LIKE '%' || ?1 || '%'
              AND dateTime >= ?2
            ORDER BY dateTime ASC
            "#,
        )
        .bind(tag)
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }

    /// Counts symptom events whose tags contain `tag`, logged at or after
    /// `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn count_symptoms_tagged_since(
        pool: &SqlitePool,
        tag: &str,
        cutoff: NaiveDateTime,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM events
            WHERE type = 'symptom'
              AND tags LIKE '%' || ?1 || '%'
              AND dateTime >= ?2
            "#,
        )
        .bind(tag)
        .bind(cutoff)
        .fetch_one(pool)
        .await
    }

    /// Inserts a new event row and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn insert(pool: &SqlitePool, input: CreateEvent) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (type, dateTime, tags, meta_data, context_data, severity)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(input.event_type)
        .bind(input.date_time)
        .bind(input.tags)
        .bind(input.meta_data)
        .bind(input.context_data)
        .bind(input.severity)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

/// Repository for the append-only training history log.
pub struct TrainingHistoryRepository;

impl TrainingHistoryRepository {
    /// Appends one training-run record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn append(
        pool: &SqlitePool,
        input: CreateTrainingHistory,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO training_history
                (model_name, trained_at, sample_size, accuracy, precision_val,
                 recall_val, f1_score, feature_importances, validation_passed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(input.model_name)
        .bind(input.trained_at)
        .bind(input.sample_size)
        .bind(input.accuracy)
        .bind(input.precision)
        .bind(input.recall)
        .bind(input.f1)
        .bind(input.feature_importances.to_string())
        .bind(input.validation_passed)
        .execute(pool)
        .await?;

        Ok(())
    }
}
