//! Request flow from "I drank this" to stored entries and summaries.
//!
//! `Tracker` ties a catalog to an entry store and a goal store. It holds no
//! state of its own; everything it reports is recomputed from the stores.

use crate::aggregate;
use crate::nutrition::scale;
use crate::store::{EntryStore, GoalStore};
use crate::{Catalog, DailyStats, GoalConfig, LogRequest, Result, SodaEntry, SodaEntryInput, WeeklyStats};
use chrono::{NaiveDate, TimeZone};

/// Entry point used by presentation code
pub struct Tracker<'a, E: ?Sized, G: ?Sized> {
    catalog: &'a Catalog,
    entries: &'a E,
    goals: &'a G,
}

impl<'a, E, G> Tracker<'a, E, G>
where
    E: EntryStore + ?Sized,
    G: GoalStore + ?Sized,
{
    pub fn new(catalog: &'a Catalog, entries: &'a E, goals: &'a G) -> Self {
        Self {
            catalog,
            entries,
            goals,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Look up the drink, scale its nutrition to the volume and store the entry
    pub fn log(&self, request: LogRequest) -> Result<SodaEntry> {
        let variant = self.catalog.lookup(&request.brand, &request.variant)?;
        let nutrients = scale(&variant.per_reference, request.volume_oz)?;

        let entry = self.entries.append(SodaEntryInput {
            timestamp: request.timestamp,
            volume_oz: request.volume_oz,
            brand_variant_name: variant.name.clone(),
            nutrients,
        })?;

        tracing::info!(
            "Logged {} fl oz of {} ({} kcal)",
            entry.volume_oz,
            entry.brand_variant_name,
            entry.nutrients.calories
        );
        Ok(entry)
    }

    pub fn daily_stats<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Result<DailyStats> {
        aggregate::daily_stats(self.entries, self.goals, day, tz)
    }

    pub fn weekly_stats<Tz: TimeZone>(&self, end_day: NaiveDate, tz: &Tz) -> Result<WeeklyStats> {
        aggregate::weekly_stats(self.entries, self.goals, end_day, tz)
    }

    pub fn goals(&self) -> Result<GoalConfig> {
        self.goals.get()
    }

    /// Replace the goals. Only per-field ranges are checked.
    pub fn set_goals(&self, goals: GoalConfig) -> Result<GoalConfig> {
        goals.validate()?;
        let stored = self.goals.set(goals)?;
        tracing::info!(
            "Goals updated: {} fl oz/day, {} fl oz/week, {}% reduction target",
            stored.daily_limit_oz,
            stored.weekly_limit_oz,
            stored.target_reduction_percent
        );
        Ok(stored)
    }
}
