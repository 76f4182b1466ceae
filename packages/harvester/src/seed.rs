//! On-disk artifacts: the discovery index and one seed file per statute.
//!
//! Layout inside the output directory:
//!
//! ```text
//! index.json                  ordered, deduplicated IndexEntry list
//! statutes/act-45-1860.json   StatuteRecord for Act 45 of 1860
//! ```
//!
//! Files are pretty JSON with a trailing newline, written to a temporary
//! sibling first and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HarvestConfig;
use crate::error::{HarvesterError, Result};
use crate::types::{IndexEntry, RecordState, StatuteRecord};

/// What the cache holds for one statute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    /// Present but unreadable; treated like a miss.
    Corrupt,
    Complete,
    Incomplete,
    Placeholder(String),
}

impl CacheStatus {
    /// Whether a run should process the statute again.
    #[must_use]
    pub fn needs_harvest(&self, retry_placeholders: bool) -> bool {
        match self {
            Self::Complete => false,
            Self::Placeholder(_) => retry_placeholders,
            Self::Missing | Self::Corrupt | Self::Incomplete => true,
        }
    }
}

/// Index and seed files of one output directory.
#[derive(Debug, Clone)]
pub struct SeedStore {
    index_path: PathBuf,
    seed_dir: PathBuf,
}

impl SeedStore {
    /// Open the store, creating the output directories if needed.
    pub fn open(config: &HarvestConfig) -> Result<Self> {
        let seed_dir = config.seed_dir();
        fs::create_dir_all(&seed_dir).map_err(|e| HarvesterError::io(&seed_dir, e))?;
        Ok(Self {
            index_path: config.index_path(),
            seed_dir,
        })
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the seed file for a record id such as `act-45-1860`.
    #[must_use]
    pub fn seed_path(&self, record_id: &str) -> PathBuf {
        self.seed_dir.join(format!("{record_id}.json"))
    }

    /// Load the previous index, if there is a readable one.
    pub fn load_index(&self) -> Result<Option<Vec<IndexEntry>>> {
        if !self.index_path.exists() {
            return Ok(None);
        }
        match read_json(&self.index_path) {
            Ok(entries) => Ok(Some(entries)),
            Err(HarvesterError::Json(e)) => {
                tracing::warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "Ignoring unreadable index"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn save_index(&self, entries: &[IndexEntry]) -> Result<()> {
        write_json(&self.index_path, &entries)
    }

    /// Read a seed record; `Ok(None)` when no seed exists.
    pub fn read(&self, record_id: &str) -> Result<Option<StatuteRecord>> {
        let path = self.seed_path(record_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Classify the cached seed of a statute.
    pub fn lookup(&self, record_id: &str) -> CacheStatus {
        match self.read(record_id) {
            Ok(None) => CacheStatus::Missing,
            Ok(Some(record)) => match record.state {
                RecordState::Complete => CacheStatus::Complete,
                RecordState::Incomplete => CacheStatus::Incomplete,
                RecordState::Placeholder { reason } => CacheStatus::Placeholder(reason),
            },
            Err(e) => {
                tracing::debug!(record = record_id, error = %e, "Unreadable seed, treating as miss");
                CacheStatus::Corrupt
            }
        }
    }

    /// Whether a complete seed exists for the statute.
    pub fn is_complete(&self, record_id: &str) -> bool {
        self.lookup(record_id) == CacheStatus::Complete
    }

    /// Write a seed record, replacing any previous one.
    pub fn write(&self, record: &StatuteRecord) -> Result<PathBuf> {
        let path = self.seed_path(&record.id);
        write_json(&path, record)?;
        Ok(path)
    }

    /// Write a negative-cache record for a statute that could not be harvested.
    pub fn write_placeholder(&self, entry: &IndexEntry, reason: &str) -> Result<PathBuf> {
        self.write(&StatuteRecord::placeholder(entry, reason))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| HarvesterError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| HarvesterError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| HarvesterError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::types::Provision;

    fn store(dir: &TempDir) -> SeedStore {
        SeedStore::open(&HarvestConfig::default().with_output_dir(dir.path())).unwrap()
    }

    fn entry() -> IndexEntry {
        IndexEntry {
            title: "The Indian Penal Code, 1860".to_string(),
            year: 1860,
            act_number: "45".to_string(),
            url: "https://portal.example/acts/45".to_string(),
            last_seen: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn complete_record() -> StatuteRecord {
        let mut record = StatuteRecord::placeholder(&entry(), "unused");
        record.provisions.push(Provision {
            provision_ref: "s1".to_string(),
            section_number: "1.".to_string(),
            title: "Title".to_string(),
            content: "Text".to_string(),
        });
        record.state = RecordState::Complete;
        record
    }

    #[test]
    fn test_open_creates_directories() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(dir.path().join("statutes").is_dir());
        assert_eq!(store.index_path(), dir.path().join("index.json"));
        assert_eq!(
            store.seed_path("act-45-1860"),
            dir.path().join("statutes").join("act-45-1860.json")
        );
    }

    #[test]
    fn test_lookup_states() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.lookup("act-45-1860"), CacheStatus::Missing);

        store.write_placeholder(&entry(), "HTTP 404").unwrap();
        assert_eq!(
            store.lookup("act-45-1860"),
            CacheStatus::Placeholder("HTTP 404".to_string())
        );
        assert!(!store.is_complete("act-45-1860"));

        store.write(&complete_record()).unwrap();
        assert_eq!(store.lookup("act-45-1860"), CacheStatus::Complete);
        assert!(store.is_complete("act-45-1860"));
    }

    #[test]
    fn test_corrupt_seed_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.seed_path("act-45-1860"), "{ not json").unwrap();
        assert_eq!(store.lookup("act-45-1860"), CacheStatus::Corrupt);
        assert!(CacheStatus::Corrupt.needs_harvest(false));
    }

    #[test]
    fn test_needs_harvest() {
        assert!(!CacheStatus::Complete.needs_harvest(true));
        assert!(CacheStatus::Missing.needs_harvest(false));
        assert!(CacheStatus::Incomplete.needs_harvest(false));
        assert!(!CacheStatus::Placeholder("x".into()).needs_harvest(false));
        assert!(CacheStatus::Placeholder("x".into()).needs_harvest(true));
    }

    #[test]
    fn test_write_is_stable_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.write(&complete_record()).unwrap();
        let first = fs::read(&path).unwrap();
        store.write(&store.read("act-45-1860").unwrap().unwrap()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
        assert!(first.ends_with(b"}\n"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_index_roundtrip_and_corrupt_index() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.load_index().unwrap(), None);

        store.save_index(&[entry()]).unwrap();
        assert_eq!(store.load_index().unwrap(), Some(vec![entry()]));

        fs::write(store.index_path(), "[{").unwrap();
        assert_eq!(store.load_index().unwrap(), None);
    }
}
