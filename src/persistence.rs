//! Device-local persistence for planners.
//!
//! Values live in a flat key-value space shaped like browser local storage:
//! every key maps to a string, and structured values are JSON-encoded into
//! that string. [`Persistence`] sits on top of any [`KeyValueStore`] and knows
//! which keys hold the planner list, the active planner id and the legacy
//! single-planner record.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{DEFAULT_PLANNER_TITLE, DayEntry, MIGRATED_PLANNER_TITLE, Planner};

pub const PLANNERS_KEY: &str = "selfCarePlanners";
pub const ACTIVE_PLANNER_KEY: &str = "activePlannerId";
pub const LEGACY_STATE_KEY: &str = "selfCareState";

const STORAGE_FILE_NAME: &str = "storage.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Write several keys as one state change.
    fn set_many(&mut self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

fn decode_values(bytes: Vec<u8>) -> Result<BTreeMap<String, String>, String> {
    let text = String::from_utf8(bytes).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

impl FileStore {
    /// `~/.hundred-days`, when a home directory can be resolved.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".hundred-days"))
    }

    pub fn open_in(data_dir: &Path) -> Result<Self, StorageError> {
        Self::open(data_dir.join(STORAGE_FILE_NAME))
    }

    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let values = if path.exists() {
            let bytes = fs::read(&path)?;
            match decode_values(bytes) {
                Ok(values) => values,
                Err(reason) => {
                    warn!(
                        path = %path.display(),
                        error = %reason,
                        "storage file is corrupt, starting empty"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole file through a temporary file and an atomic rename
    /// so a crash never leaves a half-written store behind.
    fn flush(&self) -> Result<(), StorageError> {
        let temp = self.path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        let content = serde_json::to_string_pretty(&self.values)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &self.path)?;
        debug!(path = %self.path.display(), "storage flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn set_many(&mut self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in pairs {
            self.values.insert(key.to_string(), value.to_string());
        }
        self.flush()
    }
}

/// Where the initial planner list came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Current,
    Legacy,
    Fresh,
}

#[derive(Clone, Debug)]
pub struct LoadedState {
    pub planners: Vec<Planner>,
    /// Saved pointer, possibly stale or empty; the store repairs it.
    pub active_id: String,
    pub source: LoadSource,
}

/// Single-planner record written by older versions.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyState {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    entries: Option<BTreeMap<u32, DayEntry>>,
}

type Loader<S> = fn(&S) -> Result<Option<Vec<Planner>>, StorageError>;

fn load_current<S: KeyValueStore>(store: &S) -> Result<Option<Vec<Planner>>, StorageError> {
    let Some(raw) = store.get(PLANNERS_KEY)? else {
        return Ok(None);
    };
    let planners: Vec<Planner> = serde_json::from_str(&raw)?;
    Ok(Some(planners))
}

fn load_legacy<S: KeyValueStore>(store: &S) -> Result<Option<Vec<Planner>>, StorageError> {
    let Some(raw) = store.get(LEGACY_STATE_KEY)? else {
        return Ok(None);
    };
    let legacy: LegacyState = serde_json::from_str(&raw)?;
    let mut planner = Planner::new(MIGRATED_PLANNER_TITLE);
    planner.start_date = legacy.start_date.unwrap_or_default();
    planner.goal = legacy.goal.unwrap_or_default();
    planner.entries = legacy.entries.unwrap_or_default();
    Ok(Some(vec![planner]))
}

pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Produce the starting planner list by trying each loader in priority
    /// order. A loader that fails is logged and skipped; when none yields a
    /// list a single fresh planner is created. Never fails.
    pub fn load(&self) -> LoadedState {
        let loaders: [(LoadSource, Loader<S>); 2] = [
            (LoadSource::Current, load_current::<S>),
            (LoadSource::Legacy, load_legacy::<S>),
        ];

        let mut loaded = None;
        for (source, loader) in loaders {
            match loader(&self.store) {
                Ok(Some(planners)) => {
                    loaded = Some((source, planners));
                    break;
                }
                Ok(None) => debug!(?source, "nothing stored"),
                Err(e) => warn!(?source, error = %e, "stored planners unreadable, falling through"),
            }
        }

        let (source, planners) = loaded.unwrap_or_else(|| {
            (LoadSource::Fresh, vec![Planner::new(DEFAULT_PLANNER_TITLE)])
        });

        let active_id = match self.store.get(ACTIVE_PLANNER_KEY) {
            Ok(id) => id.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "active planner id unreadable");
                String::new()
            }
        };

        info!(?source, planners = planners.len(), "planners loaded");
        LoadedState {
            planners,
            active_id,
            source,
        }
    }

    /// Mirror the full planner list and the active id to storage.
    pub fn save(&mut self, planners: &[Planner], active_id: &str) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(planners)?;
        self.store
            .set_many(&[(PLANNERS_KEY, encoded.as_str()), (ACTIVE_PLANNER_KEY, active_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;

    fn sample_planners() -> Vec<Planner> {
        let mut first = Planner::new("First");
        first.start_date = "2024-01-01".into();
        first.goal = "Walk daily".into();
        first.entries.insert(
            5,
            DayEntry {
                day_number: 5,
                date: Some("2024-01-05".into()),
                completed: true,
                mood: Some(Mood::Calm),
                content: "slow walk".into(),
                activities: Some(vec!["walk".into()]),
            },
        );
        vec![first, Planner::new("Second")]
    }

    #[test]
    fn current_format_round_trips() {
        let planners = sample_planners();
        let mut persistence = Persistence::new(MemoryStore::new());
        persistence.save(&planners, &planners[1].id).unwrap();

        let loaded = persistence.load();
        assert_eq!(loaded.source, LoadSource::Current);
        assert_eq!(loaded.planners, planners);
        assert_eq!(loaded.active_id, planners[1].id);
    }

    #[test]
    fn legacy_record_is_migrated_into_one_planner() {
        let store = MemoryStore::new().with(
            LEGACY_STATE_KEY,
            r#"{"startDate":"2024-01-01","goal":"G","entries":{"1":{"dayNumber":1,"completed":true,"mood":"sad","content":"rough"}}}"#,
        );
        let loaded = Persistence::new(store).load();

        assert_eq!(loaded.source, LoadSource::Legacy);
        assert_eq!(loaded.planners.len(), 1);
        let planner = &loaded.planners[0];
        assert_eq!(planner.title, MIGRATED_PLANNER_TITLE);
        assert_eq!(planner.start_date, "2024-01-01");
        assert_eq!(planner.goal, "G");
        assert_eq!(planner.entries.len(), 1);
        assert_eq!(planner.entry(1).mood, Some(Mood::Sad));
        assert!(!planner.id.is_empty());
        assert_eq!(loaded.active_id, "");
    }

    #[test]
    fn legacy_record_with_missing_fields_uses_defaults() {
        let store = MemoryStore::new().with(LEGACY_STATE_KEY, r#"{"goal":null}"#);
        let loaded = Persistence::new(store).load();
        assert_eq!(loaded.source, LoadSource::Legacy);
        assert_eq!(loaded.planners[0].start_date, "");
        assert_eq!(loaded.planners[0].goal, "");
        assert!(loaded.planners[0].entries.is_empty());
    }

    #[test]
    fn corrupt_current_value_falls_back_to_legacy() {
        let store = MemoryStore::new()
            .with(PLANNERS_KEY, "not json at all")
            .with(LEGACY_STATE_KEY, r#"{"startDate":"2024-03-01","goal":"","entries":{}}"#);
        let loaded = Persistence::new(store).load();
        assert_eq!(loaded.source, LoadSource::Legacy);
        assert_eq!(loaded.planners[0].start_date, "2024-03-01");
    }

    #[test]
    fn corrupt_everything_yields_fresh_planner() {
        let store = MemoryStore::new()
            .with(PLANNERS_KEY, "{broken")
            .with(LEGACY_STATE_KEY, "[1,2");
        let loaded = Persistence::new(store).load();
        assert_eq!(loaded.source, LoadSource::Fresh);
        assert_eq!(loaded.planners.len(), 1);
        assert_eq!(loaded.planners[0].title, DEFAULT_PLANNER_TITLE);
    }

    #[test]
    fn empty_storage_yields_fresh_planner() {
        let loaded = Persistence::new(MemoryStore::new()).load();
        assert_eq!(loaded.source, LoadSource::Fresh);
        assert_eq!(loaded.planners.len(), 1);
        assert!(loaded.planners[0].entries.is_empty());
    }

    #[test]
    fn current_format_wins_over_legacy() {
        let planners = sample_planners();
        let store = MemoryStore::new()
            .with(PLANNERS_KEY, &serde_json::to_string(&planners).unwrap())
            .with(LEGACY_STATE_KEY, r#"{"startDate":"1999-01-01"}"#);
        let loaded = Persistence::new(store).load();
        assert_eq!(loaded.source, LoadSource::Current);
        assert_eq!(loaded.planners.len(), 2);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let planners = sample_planners();
        {
            let store = FileStore::open_in(dir.path()).unwrap();
            assert_eq!(store.path(), dir.path().join(STORAGE_FILE_NAME));
            let mut persistence = Persistence::new(store);
            persistence.save(&planners, &planners[0].id).unwrap();
        }

        let reopened = FileStore::open_in(dir.path()).unwrap();
        let loaded = Persistence::new(reopened).load();
        assert_eq!(loaded.source, LoadSource::Current);
        assert_eq!(loaded.planners, planners);
        assert_eq!(loaded.active_id, planners[0].id);
        assert!(!dir.path().join("storage.tmp").exists());
    }

    #[test]
    fn corrupt_storage_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORAGE_FILE_NAME), "%%% garbage").unwrap();
        let store = FileStore::open_in(dir.path()).unwrap();
        assert_eq!(store.get(PLANNERS_KEY).unwrap(), None);
        assert_eq!(Persistence::new(store).load().source, LoadSource::Fresh);
    }

    #[test]
    fn non_utf8_storage_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORAGE_FILE_NAME), [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        let store = FileStore::open_in(dir.path()).unwrap();
        assert_eq!(store.get(PLANNERS_KEY).unwrap(), None);
        assert_eq!(Persistence::new(store).load().source, LoadSource::Fresh);

        let reopened = FileStore::open_in(dir.path()).unwrap();
        let planners = crate::store::PlannerStore::open(reopened).unwrap();
        assert_eq!(planners.planners().len(), 1);
    }
}
