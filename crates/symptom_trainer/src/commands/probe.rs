//! Probe command - reports eligible symptom classes without training.

use anyhow::Result;
use config::SYMPTOM_CLASSES;
use sqlx::SqlitePool;
use tracing::info;

use crate::probe;

/// Runs the probe command.
///
/// # Errors
///
/// Returns an error if the event store cannot be queried.
pub async fn run(pool: &SqlitePool, lookback_days: i64, min_class_count: i64) -> Result<()> {
    let eligible =
        probe::eligible_classes(pool, SYMPTOM_CLASSES, lookback_days, min_class_count).await?;

    if eligible.is_empty() {
        info!("no symptom classes have sufficient data; log some symptoms and try again");
    } else {
        let names: Vec<&str> = eligible.iter().map(|e| e.class.name).collect();
        info!(classes = ?names, "eligible symptom classes");
    }

    Ok(())
}
