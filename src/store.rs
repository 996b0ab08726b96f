use thiserror::Error;
use tracing::{debug, info};

use crate::model::{DEFAULT_PLANNER_TITLE, DayEntry, Planner, PlannerPatch, is_valid_day};
use crate::persistence::{KeyValueStore, LoadSource, Persistence, StorageError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("At least one planner must remain; the last planner cannot be deleted")]
    LastPlanner,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Resolve the active pointer against the planner list: a candidate that
/// names an existing planner is kept, anything else falls back to the first
/// planner (or empty when the list itself is empty).
pub fn repair_active(planners: &[Planner], candidate: &str) -> String {
    if planners.iter().any(|p| p.id == candidate) {
        return candidate.to_string();
    }
    planners.first().map(|p| p.id.clone()).unwrap_or_default()
}

/// In-memory planner state with write-through persistence.
///
/// Every successful mutation repairs the active pointer and mirrors the full
/// list to storage before returning.
pub struct PlannerStore<S> {
    planners: Vec<Planner>,
    active_id: String,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> PlannerStore<S> {
    /// Load the best available prior state and persist the repaired result,
    /// so a migrated or freshly created planner keeps its id across runs.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let persistence = Persistence::new(store);
        let loaded = persistence.load();

        let mut planners = loaded.planners;
        if planners.is_empty() {
            debug!("stored planner list was empty");
            planners.push(Planner::new(DEFAULT_PLANNER_TITLE));
        }

        let mut store = Self {
            planners,
            active_id: loaded.active_id,
            persistence,
        };
        if loaded.source != LoadSource::Current {
            info!(source = ?loaded.source, "initializing planner storage");
        }
        store.commit()?;
        Ok(store)
    }

    pub fn planners(&self) -> &[Planner] {
        &self.planners
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &Planner {
        self.get(&self.active_id).unwrap_or(&self.planners[0])
    }

    pub fn get(&self, id: &str) -> Option<&Planner> {
        self.planners.iter().find(|p| p.id == id)
    }

    /// Entry for `day`, defaulted when nothing was saved. `None` when the
    /// planner or the day does not exist.
    pub fn entry(&self, planner_id: &str, day: u32) -> Option<DayEntry> {
        if !is_valid_day(day) {
            return None;
        }
        self.get(planner_id).map(|p| p.entry(day))
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Append a new empty planner and make it active.
    pub fn create(&mut self, title_hint: Option<&str>) -> Result<&Planner, StoreError> {
        let title = match title_hint {
            Some(hint) if !hint.trim().is_empty() => hint.to_string(),
            _ => format!("Planner {}", self.planners.len() + 1),
        };
        let planner = Planner::new(title);
        info!(id = %planner.id, title = %planner.title, "planner created");
        self.active_id = planner.id.clone();
        self.planners.push(planner);
        self.commit()?;
        Ok(&self.planners[self.planners.len() - 1])
    }

    /// Remove a planner. Refused while it is the only one left; an unknown id
    /// is a no-op.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        if self.planners.len() <= 1 {
            return Err(StoreError::LastPlanner);
        }
        let before = self.planners.len();
        self.planners.retain(|p| p.id != id);
        if self.planners.len() == before {
            debug!(id, "delete ignored, no such planner");
            return Ok(());
        }
        info!(id, "planner deleted");
        self.commit()
    }

    pub fn update(&mut self, id: &str, patch: PlannerPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let Some(planner) = self.planners.iter_mut().find(|p| p.id == id) else {
            debug!(id, "update ignored, no such planner");
            return Ok(());
        };
        patch.apply(planner);
        self.commit()
    }

    /// Replace or insert the entry at `entry.day_number`.
    pub fn upsert_entry(&mut self, planner_id: &str, entry: DayEntry) -> Result<(), StoreError> {
        if !is_valid_day(entry.day_number) {
            debug!(day = entry.day_number, "upsert ignored, day out of range");
            return Ok(());
        }
        let Some(planner) = self.planners.iter_mut().find(|p| p.id == planner_id) else {
            debug!(planner_id, "upsert ignored, no such planner");
            return Ok(());
        };
        planner.entries.insert(entry.day_number, entry);
        self.commit()
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), StoreError> {
        self.active_id = id.to_string();
        self.commit()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.active_id = repair_active(&self.planners, &self.active_id);
        self.persistence.save(&self.planners, &self.active_id)?;
        Ok(())
    }
}
