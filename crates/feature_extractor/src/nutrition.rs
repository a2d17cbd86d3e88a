//! Nutrition aggregation over the food items of a meal.

use serde::Deserialize;

/// One food item from a meal's structured payload. Missing macro fields
/// default to zero grams.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FoodItem {
    pub proteins: f64,
    pub fats: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugars: f64,
}

/// Aggregated macro totals and derived percentages for one meal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NutritionTotals {
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub energy_kcal: f64,
    pub protein_pct: f64,
    pub fat_pct: f64,
    pub carb_pct: f64,
}

/// Energy per gram of protein and carbohydrate, in kcal.
const KCAL_PER_G_PROTEIN_CARB: f64 = 4.0;
/// Energy per gram of fat, in kcal.
const KCAL_PER_G_FAT: f64 = 9.0;

/// Reduces a food list into macro totals and percentages.
///
/// Fiber and sugar are tracked but excluded from the energy total. The
/// percentage denominator is clamped to at least 1 kcal so a meal with no
/// macro data yields zero percentages instead of NaN.
#[must_use]
pub fn aggregate_nutrition(foods: &[FoodItem]) -> NutritionTotals {
    let mut totals = NutritionTotals::default();

    for food in foods {
        totals.protein_g += food.proteins;
        totals.fat_g += food.fats;
        totals.carb_g += food.carbs;
        totals.fiber_g += food.fiber;
        totals.sugar_g += food.sugars;
    }

    totals.energy_kcal = totals.protein_g * KCAL_PER_G_PROTEIN_CARB
        + totals.fat_g * KCAL_PER_G_FAT
        + totals.carb_g * KCAL_PER_G_PROTEIN_CARB;

    let total_calories = totals.energy_kcal.max(1.0);
    totals.protein_pct = totals.protein_g * KCAL_PER_G_PROTEIN_CARB / total_calories * 100.0;
    totals.fat_pct = totals.fat_g * KCAL_PER_G_FAT / total_calories * 100.0;
    totals.carb_pct = totals.carb_g * KCAL_PER_G_PROTEIN_CARB / total_calories * 100.0;

    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn food(proteins: f64, fats: f64, carbs: f64) -> FoodItem {
        FoodItem {
            proteins,
            fats,
            carbs,
            ..FoodItem::default()
        }
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let totals = aggregate_nutrition(&[]);
        assert_eq!(totals, NutritionTotals::default());
    }

    #[test]
    fn test_energy_excludes_fiber_and_sugar() {
        let totals = aggregate_nutrition(&[FoodItem {
            proteins: 10.0,
            fats: 5.0,
            carbs: 20.0,
            fiber: 12.0,
            sugars: 15.0,
        }]);
        // 10*4 + 5*9 + 20*4 = 165
        assert!((totals.energy_kcal - 165.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentages_sum_to_100_for_macro_only_meal() {
        let totals = aggregate_nutrition(&[food(30.0, 10.0, 45.0), food(5.0, 2.0, 8.0)]);
        let sum = totals.protein_pct + totals.fat_pct + totals.carb_pct;
        assert!((sum - 100.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn test_zero_energy_meal_has_finite_percentages() {
        // Fiber-only meal: zero energy, the epsilon guard kicks in.
        let totals = aggregate_nutrition(&[FoodItem {
            fiber: 30.0,
            ..FoodItem::default()
        }]);
        assert_eq!(totals.energy_kcal, 0.0);
        assert_eq!(totals.protein_pct, 0.0);
        assert_eq!(totals.fat_pct, 0.0);
        assert_eq!(totals.carb_pct, 0.0);
        assert!(totals.protein_pct.is_finite());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let item: FoodItem = serde_json::from_str(r#"{"proteins": 12.5}"#).unwrap();
        assert_eq!(item.proteins, 12.5);
        assert_eq!(item.fats, 0.0);
        assert_eq!(item.sugars, 0.0);
    }
}
