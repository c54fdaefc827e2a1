//! Entry and goal store contracts, plus in-memory implementations.
//!
//! File-backed implementations live in `wal` (entries) and `goals` (goals).

use crate::{GoalConfig, Result, SodaEntry, SodaEntryInput};
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Append-only log of consumption entries
///
/// Implementations must make each append visible to later queries in one
/// step and must never hand out a partially written entry.
pub trait EntryStore: Send + Sync {
    /// Store a new entry, assigning its id and (if missing) its timestamp
    fn append(&self, input: SodaEntryInput) -> Result<SodaEntry>;

    /// Entries with `start <= timestamp <= end`, oldest first
    fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SodaEntry>>;
}

/// Holder of the single active goal configuration
pub trait GoalStore: Send + Sync {
    /// Current goals, or the defaults if none were ever set
    fn get(&self) -> Result<GoalConfig>;

    /// Replace the goals and return what was stored
    fn set(&self, goals: GoalConfig) -> Result<GoalConfig>;
}

/// Fresh entry id. UUIDv7 ids sort by creation time.
pub fn new_entry_id() -> Uuid {
    Uuid::now_v7()
}

// Each write is a single insert or replace, so a poisoned lock never guards
// half-written data and can be recovered.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// In-memory entry store
// ============================================================================

/// Entry store backed by a timestamp-sorted vector
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    entries: RwLock<Vec<SodaEntry>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntryStore for MemoryEntryStore {
    fn append(&self, input: SodaEntryInput) -> Result<SodaEntry> {
        let entry = input.into_entry(new_entry_id(), Utc::now());

        let mut entries = write(&self.entries);
        // Insert after any equal timestamps; in-order appends land at the end
        let pos = entries.partition_point(|e| e.timestamp <= entry.timestamp);
        entries.insert(pos, entry.clone());
        drop(entries);

        tracing::debug!("Appended entry {} at {}", entry.id, entry.timestamp);
        Ok(entry)
    }

    fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SodaEntry>> {
        if start > end {
            return Ok(Vec::new());
        }

        let entries = read(&self.entries);
        let from = entries.partition_point(|e| e.timestamp < start);
        let to = entries.partition_point(|e| e.timestamp <= end);
        Ok(entries[from..to].to_vec())
    }
}

// ============================================================================
// In-memory goal store
// ============================================================================

/// Goal store holding the configuration in memory
#[derive(Debug, Default)]
pub struct MemoryGoalStore {
    goals: RwLock<GoalConfig>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goals(goals: GoalConfig) -> Self {
        Self {
            goals: RwLock::new(goals),
        }
    }
}

impl GoalStore for MemoryGoalStore {
    fn get(&self) -> Result<GoalConfig> {
        Ok(*read(&self.goals))
    }

    fn set(&self, goals: GoalConfig) -> Result<GoalConfig> {
        *write(&self.goals) = goals;
        tracing::debug!("Replaced goals: {:?}", goals);
        Ok(goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NutrientProfile;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn input_at(timestamp: Option<DateTime<Utc>>, volume_oz: f64) -> SodaEntryInput {
        SodaEntryInput {
            timestamp,
            volume_oz,
            brand_variant_name: "Coca-Cola Classic".into(),
            nutrients: NutrientProfile {
                calories: 140,
                sugar_g: 39.0,
                carbs_g: 39.0,
                caffeine_mg: 34.0,
            },
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn everything(store: &MemoryEntryStore) -> Vec<SodaEntry> {
        store
            .query_range(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
            .unwrap()
    }

    #[test]
    fn test_append_assigns_id_and_timestamp() {
        let store = MemoryEntryStore::new();
        let before = Utc::now();
        let entry = store.append(input_at(None, 12.0)).unwrap();
        let after = Utc::now();

        assert!(entry.timestamp >= before && entry.timestamp <= after);
        assert_eq!(entry.volume_oz, 12.0);
        assert_eq!(entry.nutrients.calories, 140);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_append_keeps_supplied_timestamp() {
        let store = MemoryEntryStore::new();
        let entry = store.append(input_at(Some(base_time()), 12.0)).unwrap();
        assert_eq!(entry.timestamp, base_time());
    }

    #[test]
    fn test_full_range_returns_everything_in_order() {
        let store = MemoryEntryStore::new();
        let offsets = [5, -3, 0, 10, -3, 7];
        let mut ids = HashSet::new();
        for hours in offsets {
            let entry = store
                .append(input_at(Some(base_time() + Duration::hours(hours)), 12.0))
                .unwrap();
            ids.insert(entry.id);
        }

        let all = everything(&store);
        assert_eq!(all.len(), offsets.len());
        assert_eq!(ids.len(), offsets.len());
        assert!(all.iter().all(|e| ids.contains(&e.id)));
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_equal_timestamps_keep_append_order() {
        let store = MemoryEntryStore::new();
        let first = store.append(input_at(Some(base_time()), 8.0)).unwrap();
        let second = store.append(input_at(Some(base_time()), 16.0)).unwrap();

        let all = everything(&store);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn test_query_range_bounds_are_inclusive() {
        let store = MemoryEntryStore::new();
        for hours in 0..5 {
            store
                .append(input_at(Some(base_time() + Duration::hours(hours)), 12.0))
                .unwrap();
        }

        let hits = store
            .query_range(base_time() + Duration::hours(1), base_time() + Duration::hours(3))
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].timestamp, base_time() + Duration::hours(1));
        assert_eq!(hits[2].timestamp, base_time() + Duration::hours(3));
    }

    #[test]
    fn test_query_range_inverted_is_empty() {
        let store = MemoryEntryStore::new();
        store.append(input_at(Some(base_time()), 12.0)).unwrap();
        let hits = store
            .query_range(base_time() + Duration::hours(1), base_time())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_concurrent_appends_are_all_visible() {
        let store = Arc::new(MemoryEntryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        let ts = base_time() + Duration::seconds(t * 1000 + i);
                        store.append(input_at(Some(ts), 12.0)).unwrap();
                        // Readers never see a torn or missing earlier append
                        let seen = store.query_range(ts, ts).unwrap();
                        assert!(!seen.is_empty());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let all = everything(&store);
        assert_eq!(all.len(), 400);
        let ids: HashSet<_> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 400);
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_goal_store_defaults_and_replace() {
        let store = MemoryGoalStore::new();
        assert_eq!(store.get().unwrap(), GoalConfig::default());

        let goals = GoalConfig {
            daily_limit_oz: 24.0,
            weekly_limit_oz: 100.0,
            target_reduction_percent: 50.0,
        };
        assert_eq!(store.set(goals).unwrap(), goals);
        assert_eq!(store.get().unwrap(), goals);
    }

    #[test]
    fn test_goal_store_allows_weekly_below_daily() {
        let store = MemoryGoalStore::new();
        let goals = GoalConfig {
            daily_limit_oz: 32.0,
            weekly_limit_oz: 12.0,
            target_reduction_percent: 0.0,
        };
        assert_eq!(store.set(goals).unwrap(), goals);
    }
}
