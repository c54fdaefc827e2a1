//! Core domain types for the soda tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Nutrient profiles and the brand/variant catalog
//! - Consumption entries and the requests that create them
//! - Goal configuration
//! - Derived daily and weekly statistics

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Volume on which all catalog nutrient values are defined (one standard can).
pub const REFERENCE_VOLUME_OZ: f64 = 12.0;

/// Grams of sugar in one teaspoon.
pub const SUGAR_GRAMS_PER_TEASPOON: f64 = 4.0;

/// Calories counted as one meal-equivalent.
pub const CALORIES_PER_MEAL: f64 = 150.0;

// ============================================================================
// Nutrition
// ============================================================================

/// Nutrient amounts for some volume of a drink
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NutrientProfile {
    pub calories: u32,
    pub sugar_g: f64,
    pub carbs_g: f64,
    pub caffeine_mg: f64,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// One flavour/formulation of a brand, with values per 12 fl oz
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogVariant {
    pub name: String,
    #[serde(flatten)]
    pub per_reference: NutrientProfile,
}

/// A drink brand and its variants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogBrand {
    pub name: String,
    pub variants: Vec<CatalogVariant>,
}

/// Ordered list of brands. Read-only once loaded.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub brands: Vec<CatalogBrand>,
}

/// A common container size offered when logging a drink
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct ServingSize {
    pub label: &'static str,
    pub volume_oz: f64,
}

// ============================================================================
// Entry Types
// ============================================================================

/// A recorded consumption event. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SodaEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub volume_oz: f64,
    pub brand_variant_name: String,
    pub nutrients: NutrientProfile,
}

/// What an entry store accepts; the store fills in id and (if absent) timestamp
#[derive(Clone, Debug, PartialEq)]
pub struct SodaEntryInput {
    pub timestamp: Option<DateTime<Utc>>,
    pub volume_oz: f64,
    pub brand_variant_name: String,
    pub nutrients: NutrientProfile,
}

impl SodaEntryInput {
    /// Turn the input into a stored entry with the given id and fallback time
    pub fn into_entry(self, id: Uuid, now: DateTime<Utc>) -> SodaEntry {
        SodaEntry {
            id,
            timestamp: self.timestamp.unwrap_or(now),
            volume_oz: self.volume_oz,
            brand_variant_name: self.brand_variant_name,
            nutrients: self.nutrients,
        }
    }
}

/// Raw "I drank this" request as submitted by presentation code
#[derive(Clone, Debug, PartialEq)]
pub struct LogRequest {
    pub volume_oz: f64,
    pub brand: String,
    pub variant: String,
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Goals
// ============================================================================

/// User goal configuration. Last write wins.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalConfig {
    pub daily_limit_oz: f64,
    pub weekly_limit_oz: f64,
    pub target_reduction_percent: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            daily_limit_oz: 16.0,
            weekly_limit_oz: 64.0,
            target_reduction_percent: 20.0,
        }
    }
}

// ============================================================================
// Derived Statistics
// ============================================================================

/// Totals for one local calendar day
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_volume_oz: f64,
    pub daily_limit_oz: f64,
    /// May be negative once the limit is exceeded
    pub remaining_allowance_oz: f64,
    pub progress_percent: f64,
    pub total_calories: u64,
    pub total_sugar_g: f64,
    pub total_carbs_g: f64,
    pub total_caffeine_mg: f64,
}

/// One calendar day's totals inside a weekly summary
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub weekday: String,
    pub entry_count: usize,
    pub volume_oz: f64,
    pub calories: u64,
    pub sugar_g: f64,
    pub carbs_g: f64,
    pub caffeine_mg: f64,
}

impl DayBucket {
    pub(crate) fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: date.format("%a").to_string(),
            entry_count: 0,
            volume_oz: 0.0,
            calories: 0,
            sugar_g: 0.0,
            carbs_g: 0.0,
            caffeine_mg: 0.0,
        }
    }

    pub(crate) fn add(&mut self, entry: &SodaEntry) {
        self.entry_count += 1;
        self.volume_oz += entry.volume_oz;
        self.calories += u64::from(entry.nutrients.calories);
        self.sugar_g += entry.nutrients.sugar_g;
        self.carbs_g += entry.nutrients.carbs_g;
        self.caffeine_mg += entry.nutrients.caffeine_mg;
    }
}

/// Seven consecutive days ending at `end_date`, oldest first
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WeeklyStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayBucket>,
    pub total_volume_oz: f64,
    pub total_calories: u64,
    pub total_sugar_g: f64,
    pub total_carbs_g: f64,
    pub total_caffeine_mg: f64,
    pub weekly_limit_oz: f64,
    pub remaining_allowance_oz: f64,
    pub days_over_daily_limit: usize,
}

impl WeeklyStats {
    /// Weekly sugar expressed as teaspoons (4 g each)
    pub fn sugar_teaspoons(&self) -> f64 {
        self.total_sugar_g / SUGAR_GRAMS_PER_TEASPOON
    }

    /// Weekly calories expressed as 150 kcal meal-equivalents
    pub fn meal_equivalents(&self) -> f64 {
        self.total_calories as f64 / CALORIES_PER_MEAL
    }
}
