//! Write-Ahead Log (WAL) for consumption entries.
//!
//! Entries are appended to a JSONL (JSON Lines) file under an exclusive file
//! lock. Queries merge the live WAL with the CSV archive written by
//! `rollup`, so entries stay visible after they have been rolled up.

use crate::rollup::{read_archive, ArchiveRow};
use crate::store::{new_entry_id, EntryStore};
use crate::{Result, SodaEntry, SodaEntryInput};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// JSONL-backed entry store with file locking
#[derive(Clone, Debug)]
pub struct JsonlEntryStore {
    wal_path: PathBuf,
    archive_path: PathBuf,
}

impl JsonlEntryStore {
    /// Store writing to `wal_path` and reading archived entries from `archive_path`
    pub fn new(wal_path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            wal_path: wal_path.into(),
            archive_path: archive_path.into(),
        }
    }

    /// Standard layout inside a data directory
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(
            data_dir.join("wal").join("entries.wal"),
            data_dir.join("entries.csv"),
        )
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.wal_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Every stored entry, WAL first, with archived duplicates removed
    fn load_all(&self) -> Result<Vec<SodaEntry>> {
        let mut entries = read_entries(&self.wal_path)?;
        let mut seen: HashSet<_> = entries.iter().map(|e| e.id).collect();

        let mut archived = 0;
        for row in read_archive(&self.archive_path)? {
            match SodaEntry::try_from(row) {
                Ok(entry) => {
                    if seen.insert(entry.id) {
                        entries.push(entry);
                        archived += 1;
                    }
                }
                Err(e) => tracing::warn!("Skipping archived entry: {}", e),
            }
        }
        tracing::debug!("Loaded {} archived entries", archived);

        Ok(entries)
    }
}

impl EntryStore for JsonlEntryStore {
    fn append(&self, input: SodaEntryInput) -> Result<SodaEntry> {
        self.ensure_parent_dir()?;
        let entry = input.into_entry(new_entry_id(), Utc::now());

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.wal_path)?;

        file.lock_exclusive()?;

        // One write per line so readers never see a partial entry
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended entry {} to WAL", entry.id);
        Ok(entry)
    }

    fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SodaEntry>> {
        let mut entries: Vec<_> = self
            .load_all()?
            .into_iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect();

        // Stable sort: equal timestamps stay in file order
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }
}

impl TryFrom<ArchiveRow> for SodaEntry {
    type Error = crate::Error;

    fn try_from(row: ArchiveRow) -> Result<Self> {
        let id = uuid::Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        Ok(SodaEntry {
            id,
            timestamp,
            volume_oz: row.volume_oz,
            brand_variant_name: row.brand_variant_name,
            nutrients: crate::NutrientProfile {
                calories: row.calories,
                sugar_g: row.sugar_g,
                carbs_g: row.carbs_g,
                caffeine_mg: row.caffeine_mg,
            },
        })
    }
}

/// Read all entries from a WAL file
///
/// Lines that fail to parse are logged and skipped.
pub fn read_entries(path: &Path) -> Result<Vec<SodaEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let parsed = parse_entries(BufReader::new(&file));
    file.unlock()?;

    let entries = parsed?;
    tracing::debug!("Read {} entries from WAL", entries.len());
    Ok(entries)
}

/// Parse WAL lines from an already locked reader
pub(crate) fn parse_entries<R: BufRead>(reader: R) -> Result<Vec<SodaEntry>> {
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SodaEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(entries)
}
