//! Availability probing: which symptom classes are worth extracting.
//!
//! Full feature extraction is expensive; a cheap tag-count pre-filter skips
//! classes that cannot possibly reach the extractor's stricter minimum.

use chrono::Utc;
use config::SymptomClass;
use event_store::EventRepository;
use sqlx::SqlitePool;
use tracing::info;

use crate::extract::lookback_cutoff;

/// A symptom class that passed the coarse availability check.
#[derive(Debug, Clone, Copy)]
pub struct EligibleClass {
    pub class: SymptomClass,
    /// Matching symptom events inside the lookback window.
    pub count: i64,
}

/// Counts tagged symptom events per candidate class and keeps those at or
/// above `min_class_count`. Deterministic on an unchanged store.
///
/// # Errors
///
/// Returns an error if a count query fails.
pub async fn eligible_classes(
    pool: &SqlitePool,
    classes: &[SymptomClass],
    lookback_days: i64,
    min_class_count: i64,
) -> Result<Vec<EligibleClass>, sqlx::Error> {
    let cutoff = lookback_cutoff(Utc::now().naive_utc(), lookback_days);

    let mut eligible = Vec::new();
    for class in classes {
        let count =
            EventRepository::count_symptoms_tagged_since(pool, class.tag, cutoff).await?;

        if count >= min_class_count {
            info!(
                class = class.name,
                tag = class.tag,
                count,
                "eligible, will attempt training"
            );
            eligible.push(EligibleClass {
                class: *class,
                count,
            });
        } else {
            info!(
                class = class.name,
                tag = class.tag,
                count,
                required = min_class_count,
                "skipping, not enough symptom events"
            );
        }
    }

    Ok(eligible)
}
