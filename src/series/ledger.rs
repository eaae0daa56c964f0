//! Record of which series have already been announced as complete

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LEDGER_FILE: &str = "series-announcements.json";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

pub trait AnnouncementLedger: Send + Sync {
    fn is_announced(&self, series: &str) -> Result<bool>;

    fn mark_announced(&self, series: &str, on: NaiveDate) -> Result<()>;

    /// Forget an announcement so a later completion is announced again
    fn clear(&self, series: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub announced_on: NaiveDate,
}

type Entries = BTreeMap<String, Announcement>;

/// Announcements kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Entries>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnnouncementLedger for MemoryLedger {
    fn is_announced(&self, series: &str) -> Result<bool> {
        let entries = self.entries.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(entries.contains_key(series))
    }

    fn mark_announced(&self, series: &str, on: NaiveDate) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| LedgerError::Poisoned)?;
        entries
            .entry(series.to_string())
            .or_insert(Announcement { announced_on: on });
        Ok(())
    }

    fn clear(&self, series: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| LedgerError::Poisoned)?;
        entries.remove(series);
        Ok(())
    }
}

/// Announcements persisted as JSON under the state directory
pub struct FileLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLedger {
    pub fn new(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        Ok(Self {
            path: state_dir.join(LEDGER_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl AnnouncementLedger for FileLedger {
    fn is_announced(&self, series: &str) -> Result<bool> {
        let _guard = self.lock.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(self.load()?.contains_key(series))
    }

    fn mark_announced(&self, series: &str, on: NaiveDate) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| LedgerError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.contains_key(series) {
            return Ok(());
        }
        entries.insert(series.to_string(), Announcement { announced_on: on });
        self.save(&entries)
    }

    fn clear(&self, series: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| LedgerError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.remove(series).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_memory_ledger_mark_and_clear() {
        let ledger = MemoryLedger::new();
        assert!(!ledger.is_announced("calculus").unwrap());

        ledger.mark_announced("calculus", day()).unwrap();
        assert!(ledger.is_announced("calculus").unwrap());

        ledger.clear("calculus").unwrap();
        assert!(!ledger.is_announced("calculus").unwrap());
    }

    #[test]
    fn test_file_ledger_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FileLedger::new(temp_dir.path()).unwrap();
        ledger.mark_announced("calculus", day()).unwrap();

        let reopened = FileLedger::new(temp_dir.path()).unwrap();
        assert!(reopened.is_announced("calculus").unwrap());
        assert!(!reopened.is_announced("algebra").unwrap());
    }

    #[test]
    fn test_file_ledger_keeps_first_date() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FileLedger::new(temp_dir.path()).unwrap();
        ledger.mark_announced("calculus", day()).unwrap();
        ledger
            .mark_announced("calculus", day().succ_opt().unwrap())
            .unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        let entries: Entries = serde_json::from_str(&content).unwrap();
        assert_eq!(entries["calculus"].announced_on, day());
    }

    #[test]
    fn test_file_ledger_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FileLedger::new(temp_dir.path()).unwrap();
        fs::write(ledger.path(), "{not json").unwrap();

        assert!(matches!(
            ledger.is_announced("calculus"),
            Err(LedgerError::Json(_))
        ));
    }
}
