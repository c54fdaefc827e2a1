//! CSV rollup for archiving WAL entries.
//!
//! Moves everything in the entry WAL into an append-only CSV archive. The
//! WAL stays exclusively locked from the read until it has been emptied, so
//! appends that arrive meanwhile wait and land in the emptied WAL. The CSV is
//! fsynced before the WAL is truncated; a crash in between can only produce
//! duplicates, which readers drop by id.

use crate::wal::parse_entries;
use crate::{Result, SodaEntry};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ArchiveRow {
    pub id: String,
    pub timestamp: String,
    pub volume_oz: f64,
    pub brand_variant_name: String,
    pub calories: u32,
    pub sugar_g: f64,
    pub carbs_g: f64,
    pub caffeine_mg: f64,
}

impl From<&SodaEntry> for ArchiveRow {
    fn from(entry: &SodaEntry) -> Self {
        ArchiveRow {
            id: entry.id.to_string(),
            timestamp: entry.timestamp.to_rfc3339(),
            volume_oz: entry.volume_oz,
            brand_variant_name: entry.brand_variant_name.clone(),
            calories: entry.nutrients.calories,
            sugar_g: entry.nutrients.sugar_g,
            carbs_g: entry.nutrients.carbs_g,
            caffeine_mg: entry.nutrients.caffeine_mg,
        }
    }
}

/// Roll up WAL entries into CSV and archive the WAL
///
/// Under an exclusive lock on the WAL:
/// 1. Reads all entries from the WAL
/// 2. Appends them to the CSV file (with headers if the file is new)
/// 3. Syncs the CSV to disk
/// 4. Copies the WAL to `<name>.<first entry id>.wal.processed`
/// 5. Truncates the WAL
///
/// Returns the number of entries moved.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    if !wal_path.exists() {
        return Ok(0);
    }

    let mut wal = OpenOptions::new().read(true).write(true).open(wal_path)?;
    wal.lock_exclusive()?;

    let mut raw = String::new();
    wal.read_to_string(&mut raw)?;
    let entries = parse_entries(raw.as_bytes())?;

    let first_id = match entries.first() {
        Some(entry) => entry.id,
        None => {
            wal.unlock()?;
            tracing::info!("No entries in WAL to roll up");
            return Ok(0);
        }
    };

    append_to_csv(csv_path, &entries)?;
    tracing::info!("Wrote {} entries to CSV", entries.len());

    let archived = processed_path(wal_path, &first_id.to_string());
    let mut processed = File::create(&archived)?;
    processed.write_all(raw.as_bytes())?;
    processed.sync_all()?;

    wal.set_len(0)?;
    wal.sync_all()?;
    wal.unlock()?;

    tracing::info!("Archived WAL to {:?}", archived);

    Ok(entries.len())
}

fn append_to_csv(csv_path: &Path, entries: &[SodaEntry]) -> Result<()> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a brand-new archive gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in entries {
        writer.serialize(ArchiveRow::from(entry))?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| crate::Error::Other(format!("Failed to flush CSV: {}", e)))?;
    file.sync_all()?;
    Ok(())
}

/// `entries.wal` becomes `entries.<tag>.wal.processed` next to it
fn processed_path(wal_path: &Path, tag: &str) -> PathBuf {
    let stem = wal_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entries".to_string());
    wal_path.with_file_name(format!("{}.{}.wal.processed", stem, tag))
}

/// Read every row of the CSV archive
///
/// A missing archive is empty; malformed rows are logged and skipped.
pub(crate) fn read_archive(path: &Path) -> Result<Vec<ArchiveRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<ArchiveRow>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(rows)
}

/// Remove `.processed` WAL files left behind by earlier rollups
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntryStore;
    use crate::wal::JsonlEntryStore;
    use crate::{NutrientProfile, SodaEntryInput};

    fn processed_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir.join("wal"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with(".wal.processed"))
            .collect()
    }

    fn append_one(store: &JsonlEntryStore, name: &str) -> SodaEntry {
        store
            .append(SodaEntryInput {
                timestamp: None,
                volume_oz: 16.9,
                brand_variant_name: name.into(),
                nutrients: NutrientProfile {
                    calories: 197,
                    sugar_g: 55.0,
                    carbs_g: 55.0,
                    caffeine_mg: 48.0,
                },
            })
            .unwrap()
    }

    #[test]
    fn test_wal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::in_data_dir(temp_dir.path());

        for i in 0..3 {
            append_one(&store, &format!("variant_{}", i));
        }

        let count = wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap();
        assert_eq!(count, 3);

        assert!(store.archive_path().exists());
        assert_eq!(std::fs::metadata(store.wal_path()).unwrap().len(), 0);
        assert_eq!(processed_files(temp_dir.path()).len(), 1);
    }

    #[test]
    fn test_wal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::in_data_dir(temp_dir.path());

        append_one(&store, "first");
        assert_eq!(
            wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap(),
            1
        );

        append_one(&store, "second");
        assert_eq!(
            wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap(),
            1
        );

        let reader = csv::Reader::from_path(store.archive_path()).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_each_rollup_keeps_its_own_processed_copy() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::in_data_dir(temp_dir.path());

        let first = append_one(&store, "first");
        wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap();
        let second = append_one(&store, "second");
        wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap();

        let copies = processed_files(temp_dir.path());
        assert_eq!(copies.len(), 2);

        let contents: Vec<String> = copies
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert!(contents.iter().any(|c| c.contains(&first.id.to_string())));
        assert!(contents.iter().any(|c| c.contains(&second.id.to_string())));
    }

    #[test]
    fn test_append_after_rollup_goes_to_emptied_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::in_data_dir(temp_dir.path());

        append_one(&store, "before");
        wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap();
        let after = append_one(&store, "after");

        let in_wal = crate::wal::read_entries(store.wal_path()).unwrap();
        assert_eq!(in_wal, vec![after]);
    }

    #[test]
    fn test_archive_rows_round_trip_to_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlEntryStore::in_data_dir(temp_dir.path());
        let entry = append_one(&store, "Mountain Dew");

        wal_to_csv_and_archive(store.wal_path(), store.archive_path()).unwrap();

        let rows = read_archive(store.archive_path()).unwrap();
        assert_eq!(rows.len(), 1);
        let restored = SodaEntry::try_from(rows.into_iter().next().unwrap()).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("entries.csv");

        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("s1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("s2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("s1.wal.processed").exists());
        assert!(!temp_dir.path().join("s2.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
