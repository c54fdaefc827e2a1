//! Daily and weekly statistics over the entry store.
//!
//! Nothing here is cached: every call reads the goal store and queries the
//! entry store afresh, so results always reflect the stores at call time.

use crate::store::{EntryStore, GoalStore};
use crate::{DailyStats, DayBucket, Error, GoalConfig, Result, WeeklyStats};
use chrono::{
    DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Days covered by a weekly summary
pub const DAYS_PER_WEEK: u64 = 7;

/// Longest DST gap we search across when local midnight does not exist
const MAX_GAP_MINUTES: u32 = 240;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// First and last instant of a local calendar day, inclusive
///
/// The day runs from 00:00:00.000 to 23:59:59.999 local time.
pub fn day_bounds<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (first, last) = NaiveTime::from_hms_milli_opt(0, 0, 0, 0)
        .zip(NaiveTime::from_hms_milli_opt(23, 59, 59, 999))
        .ok_or_else(|| Error::Other("invalid day boundary time".into()))?;

    let start = local_to_utc(tz, day.and_time(first), Edge::Start)?;
    let end = local_to_utc(tz, day.and_time(last), Edge::End)?;
    Ok((start, end))
}

/// Map a local wall-clock time to an instant
///
/// Ambiguous times (clocks going back) take the earliest instant for a start
/// bound and the latest for an end bound. Times inside a gap (clocks going
/// forward) move to the nearest valid minute inside the day.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, edge: Edge) -> Result<DateTime<Utc>> {
    let step = match edge {
        Edge::Start => Duration::minutes(1),
        Edge::End => Duration::minutes(-1),
    };

    let mut probe = local;
    for _ in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                let chosen = match edge {
                    Edge::Start => earliest,
                    Edge::End => latest,
                };
                return Ok(chosen.with_timezone(&Utc));
            }
            LocalResult::None => probe += step,
        }
    }

    Err(Error::Other(format!("no valid local time near {}", local)))
}

fn current_goals<G: GoalStore + ?Sized>(goals: &G) -> Result<GoalConfig> {
    goals
        .get()
        .map_err(|e| Error::GoalNotConfigured(e.to_string()))
}

/// Totals for one local calendar day against the daily limit
///
/// Fails with `GoalNotConfigured` only when the goal store cannot be read;
/// a day without entries is all zeros.
pub fn daily_stats<E, G, Tz>(entries: &E, goals: &G, day: NaiveDate, tz: &Tz) -> Result<DailyStats>
where
    E: EntryStore + ?Sized,
    G: GoalStore + ?Sized,
    Tz: TimeZone,
{
    let goals = current_goals(goals)?;
    let (start, end) = day_bounds(day, tz)?;

    let mut totals = DayBucket::empty(day);
    for entry in entries.query_range(start, end)? {
        totals.add(&entry);
    }

    let progress_percent = if goals.daily_limit_oz > 0.0 {
        totals.volume_oz / goals.daily_limit_oz * 100.0
    } else {
        0.0
    };

    tracing::debug!(
        "Daily stats for {}: {} entries, {} fl oz",
        day,
        totals.entry_count,
        totals.volume_oz
    );

    Ok(DailyStats {
        date: day,
        total_volume_oz: totals.volume_oz,
        daily_limit_oz: goals.daily_limit_oz,
        remaining_allowance_oz: goals.daily_limit_oz - totals.volume_oz,
        progress_percent,
        total_calories: totals.calories,
        total_sugar_g: totals.sugar_g,
        total_carbs_g: totals.carbs_g,
        total_caffeine_mg: totals.caffeine_mg,
    })
}

/// Seven day buckets ending at `end_day`, oldest first
///
/// Every bucket is present even when it has no entries. Entries are placed
/// by their calendar date in `tz`.
pub fn weekly_stats<E, G, Tz>(
    entries: &E,
    goals: &G,
    end_day: NaiveDate,
    tz: &Tz,
) -> Result<WeeklyStats>
where
    E: EntryStore + ?Sized,
    G: GoalStore + ?Sized,
    Tz: TimeZone,
{
    let goals = current_goals(goals)?;
    let start_day = end_day
        .checked_sub_days(Days::new(DAYS_PER_WEEK - 1))
        .ok_or_else(|| Error::Other(format!("week ending {} is out of range", end_day)))?;

    let mut days: Vec<DayBucket> = start_day
        .iter_days()
        .take(DAYS_PER_WEEK as usize)
        .map(DayBucket::empty)
        .collect();

    let (start, _) = day_bounds(start_day, tz)?;
    let (_, end) = day_bounds(end_day, tz)?;

    for entry in entries.query_range(start, end)? {
        let local_date = entry.timestamp.with_timezone(tz).date_naive();
        let offset = (local_date - start_day).num_days();
        match usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) {
            Some(bucket) => bucket.add(&entry),
            None => tracing::debug!("Entry {} on {} falls outside the week", entry.id, local_date),
        }
    }

    let total_volume_oz: f64 = days.iter().map(|d| d.volume_oz).sum();
    let days_over_daily_limit = days
        .iter()
        .filter(|d| d.volume_oz > goals.daily_limit_oz)
        .count();

    Ok(WeeklyStats {
        start_date: start_day,
        end_date: end_day,
        total_volume_oz,
        total_calories: days.iter().map(|d| d.calories).sum(),
        total_sugar_g: days.iter().map(|d| d.sugar_g).sum(),
        total_carbs_g: days.iter().map(|d| d.carbs_g).sum(),
        total_caffeine_mg: days.iter().map(|d| d.caffeine_mg).sum(),
        weekly_limit_oz: goals.weekly_limit_oz,
        remaining_allowance_oz: goals.weekly_limit_oz - total_volume_oz,
        days_over_daily_limit,
        days,
    })
}
