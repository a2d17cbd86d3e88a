//! Feature extractor crate for symptom prediction models.
//!
//! Turns one raw meal event into a fixed-length, fixed-order numeric feature
//! vector. The on-device interpreter resolves split nodes by feature name
//! against this exact ordering, so [`FEATURE_NAMES`] is the single source of
//! truth for feature identity: any change here changes the meaning of every
//! exported model.

use chrono::{Datelike, Timelike};
use event_store::MealEvent;
use serde::Deserialize;
use serde_json::Value;

pub mod nutrition;

use nutrition::{aggregate_nutrition, FoodItem};

/// The number of features extracted per meal.
/// This includes:
/// - Meal composition tag indicators = 11
/// - Aggregated nutrition totals and percentages = 9
/// - Processing level = 2
/// - Timing = 11
/// - Environmental context = 10
/// - Time-of-day and season one-hots = 8
/// Total: 51 features
pub const FEATURE_COUNT: usize = 51;

/// Meal composition tags with a dedicated indicator feature, matched
/// case-insensitively against the meal's tag list.
pub const MEAL_TAG_VOCABULARY: [&str; 11] = [
    "feculent",
    "proteine",
    "legume",
    "produit_laitier",
    "fruit",
    "epices",
    "gras",
    "sucre",
    "fermente",
    "gluten",
    "alcool",
];

/// Feature names in extraction order. Exported artifacts embed this list so
/// the interpreter can resolve features by name rather than position.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    // Tag indicators
    "tag_feculent",
    "tag_proteine",
    "tag_legume",
    "tag_produit_laitier",
    "tag_fruit",
    "tag_epices",
    "tag_gras",
    "tag_sucre",
    "tag_fermente",
    "tag_gluten",
    "tag_alcool",
    // Nutrition
    "protein_g",
    "fat_g",
    "carb_g",
    "fiber_g",
    "sugar_g",
    "energy_kcal",
    "protein_pct",
    "fat_pct",
    "carb_pct",
    // Processing level
    "nova_group",
    "is_processed",
    // Timing
    "hour_of_day",
    "day_of_week",
    "is_weekend",
    "is_breakfast",
    "is_lunch",
    "is_dinner",
    "is_snack",
    "is_late_night",
    "minutes_since_last_meal",
    "hours_since_last_meal",
    "meals_today_count",
    // Environmental context
    "temperature_celsius",
    "pressure_hpa",
    "pressure_change_6h",
    "humidity",
    "is_high_humidity",
    "is_pressure_dropping",
    "weather_sunny",
    "weather_rainy",
    "weather_cloudy",
    "weather_stormy",
    // Time of day / season
    "time_morning",
    "time_afternoon",
    "time_evening",
    "time_night",
    "season_spring",
    "season_summer",
    "season_fall",
    "season_winter",
];

/// Default NOVA processing group when no product data is available.
pub const DEFAULT_NOVA_GROUP: f64 = 2.0;
/// Default ambient temperature when context is missing, in Celsius.
pub const DEFAULT_TEMPERATURE: f64 = 20.0;
/// Default barometric pressure when context is missing, in hPa.
pub const DEFAULT_PRESSURE: f64 = 1013.0;
/// Default 6-hour pressure change when context is missing.
pub const DEFAULT_PRESSURE_CHANGE: f64 = 0.0;
/// Default relative humidity when context is missing.
pub const DEFAULT_HUMIDITY: f64 = 50.0;

// The "since last meal" / "meals today" features are fixed estimates, not
// computed from history. Deployed interpreters were trained with these
// constants; recomputing them from the log would change model semantics.
const DEFAULT_MINUTES_SINCE_LAST_MEAL: f64 = 240.0;
const DEFAULT_HOURS_SINCE_LAST_MEAL: f64 = 4.0;
const DEFAULT_MEALS_TODAY: f64 = 3.0;

/// Feature vector extracted from a single meal event.
///
/// Values are aligned with [`FEATURE_NAMES`]; every entry is a finite float.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// The raw values in extraction order.
    #[must_use]
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Looks up a feature value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values[i])
    }
}

/// Structured nutrition payload attached to a meal event.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MealPayload {
    pub foods: Vec<FoodItem>,
}

/// Parses an optional JSON payload, degrading to the default value on
/// missing or malformed input. This is the only recovery path for bad
/// payloads; it never propagates a parse error.
#[must_use]
pub fn parse_or_default<T>(raw: Option<&str>) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Extracts the full feature vector from a meal event.
///
/// Malformed or missing payloads degrade to documented defaults; the output
/// shape is invariant under garbage input.
#[must_use]
pub fn extract_meal_features(meal: &MealEvent) -> FeatureVector {
    let tags: Vec<String> = meal
        .tag_list()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let has_tag = |name: &str| -> f64 {
        if tags.iter().any(|t| t == name) {
            1.0
        } else {
            0.0
        }
    };

    let payload: MealPayload = parse_or_default(meal.meta_data.as_deref());
    let n = aggregate_nutrition(&payload.foods);

    let context: Value = parse_or_default(meal.context_data.as_deref());

    let is_processed = flag(tags.iter().any(|t| t.contains("industriel")));

    let hour = meal.date_time.hour();
    // Monday = 0 .. Sunday = 6
    let weekday = meal.date_time.weekday().num_days_from_monday();

    let humidity = context_number(&context, "humidity", DEFAULT_HUMIDITY);
    let pressure_change = context_number(&context, "pressureChange6h", DEFAULT_PRESSURE_CHANGE);
    let weather = context_string(&context, "weatherCondition", "unknown");
    let time_of_day = context_string(&context, "timeOfDay", "afternoon");
    let season = context_string(&context, "season", "summer");

    let values: [f64; FEATURE_COUNT] = [
        // Tag indicators
        has_tag("feculent"),
        has_tag("proteine"),
        has_tag("legume"),
        has_tag("produit_laitier"),
        has_tag("fruit"),
        has_tag("epices"),
        has_tag("gras"),
        has_tag("sucre"),
        has_tag("fermente"),
        has_tag("gluten"),
        has_tag("alcool"),
        // Nutrition
        n.protein_g,
        n.fat_g,
        n.carb_g,
        n.fiber_g,
        n.sugar_g,
        n.energy_kcal,
        n.protein_pct,
        n.fat_pct,
        n.carb_pct,
        // Processing level
        DEFAULT_NOVA_GROUP,
        is_processed,
        // Timing
        f64::from(hour),
        f64::from(weekday),
        flag(weekday >= 5),
        flag((6..10).contains(&hour)),
        flag((11..15).contains(&hour)),
        flag((18..22).contains(&hour)),
        has_tag("snack"),
        flag(hour >= 22 || hour < 6),
        DEFAULT_MINUTES_SINCE_LAST_MEAL,
        DEFAULT_HOURS_SINCE_LAST_MEAL,
        DEFAULT_MEALS_TODAY,
        // Environmental context
        context_number(&context, "temperature", DEFAULT_TEMPERATURE),
        context_number(&context, "barometricPressure", DEFAULT_PRESSURE),
        pressure_change,
        humidity,
        flag(humidity > 70.0),
        flag(pressure_change < -3.0),
        flag(weather == "sunny"),
        flag(weather == "rainy"),
        flag(weather == "cloudy"),
        flag(weather == "stormy"),
        // Time of day / season
        flag(time_of_day == "morning"),
        flag(time_of_day == "afternoon"),
        flag(time_of_day == "evening"),
        flag(time_of_day == "night"),
        flag(season == "spring"),
        flag(season == "summer"),
        flag(season == "fall"),
        flag(season == "winter"),
    ];

    FeatureVector { values }
}

const fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Reads a numeric context field. Values may be logged either as JSON
/// numbers or as strings; anything unparseable falls back to the default.
fn context_number(context: &Value, key: &str, default: f64) -> f64 {
    match context.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Reads a string context field with a fixed fallback.
fn context_string<'a>(context: &'a Value, key: &str, default: &'a str) -> &'a str {
    context.get(key).and_then(Value::as_str).unwrap_or(default)
}
