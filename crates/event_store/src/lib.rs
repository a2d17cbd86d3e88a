//! Read access to the event log and the training history sink.
//!
//! The event store is an append-only SQLite database owned by the companion
//! app; this crate only issues parameterized, time-windowed queries against
//! it and appends training-run audit rows.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod models;
pub mod repositories;

pub use models::{CreateEvent, CreateTrainingHistory, MealEvent, SymptomEvent};
pub use repositories::{EventRepository, TrainingHistoryRepository};

/// Creates a connection pool to the SQLite event store.
///
/// # Errors
///
/// Returns an error if the connection to the database fails.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if running migrations fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
