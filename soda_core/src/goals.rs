//! Goal persistence with file locking, and goal value checks.
//!
//! The goal file holds a single JSON object. Saves go through a temp file
//! and an atomic rename, so readers see either the old or the new goals.

use crate::store::GoalStore;
use crate::{Error, GoalConfig, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl GoalConfig {
    /// Check each field is in range
    ///
    /// Cross-field consistency (weekly vs daily) is only warned about.
    pub fn validate(&self) -> Result<()> {
        if !self.daily_limit_oz.is_finite() || self.daily_limit_oz <= 0.0 {
            return Err(Error::InvalidGoal(format!(
                "daily limit must be a positive number of fl oz, got {}",
                self.daily_limit_oz
            )));
        }
        if !self.weekly_limit_oz.is_finite() || self.weekly_limit_oz <= 0.0 {
            return Err(Error::InvalidGoal(format!(
                "weekly limit must be a positive number of fl oz, got {}",
                self.weekly_limit_oz
            )));
        }
        if !(0.0..=100.0).contains(&self.target_reduction_percent) {
            return Err(Error::InvalidGoal(format!(
                "target reduction must be between 0 and 100 percent, got {}",
                self.target_reduction_percent
            )));
        }

        if self.weekly_limit_oz < self.daily_limit_oz {
            tracing::warn!(
                "Weekly limit {} fl oz is below the daily limit {} fl oz",
                self.weekly_limit_oz,
                self.daily_limit_oz
            );
        }
        Ok(())
    }
}

/// Goal store backed by a JSON file
#[derive(Clone, Debug)]
pub struct FileGoalStore {
    path: PathBuf,
    defaults: GoalConfig,
}

impl FileGoalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defaults: GoalConfig::default(),
        }
    }

    /// Standard layout inside a data directory
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("goals.json"))
    }

    /// Goals reported while no goal file exists yet
    pub fn with_defaults(mut self, defaults: GoalConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file writers lock while replacing the goal file
    pub fn lock_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "goals.json".to_string());
        self.path.with_file_name(format!("{}.lock", name))
    }

    /// Load goals with a shared lock
    ///
    /// A missing file yields the defaults; a file that cannot be read or
    /// parsed is an error.
    fn load(&self) -> Result<GoalConfig> {
        if !self.path.exists() {
            tracing::debug!("No goal file at {:?}, using defaults", self.path);
            return Ok(self.defaults);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let goals = serde_json::from_str::<GoalConfig>(&contents)?;
        tracing::debug!("Loaded goals from {:?}", self.path);
        Ok(goals)
    }

    /// Save goals while holding the writer lock
    ///
    /// Atomically writes goals by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&self, goals: &GoalConfig) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "goal path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        // One writer at a time; readers rely on the rename alone
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(goals)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        lock.unlock()?;

        tracing::debug!("Saved goals to {:?}", self.path);
        Ok(())
    }
}

impl GoalStore for FileGoalStore {
    fn get(&self) -> Result<GoalConfig> {
        self.load()
    }

    fn set(&self, goals: GoalConfig) -> Result<GoalConfig> {
        self.save(&goals)?;
        Ok(goals)
    }
}
