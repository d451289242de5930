//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the storage traits, intended
//! for embedded usage, tests, and as a reference implementation of the
//! consistency contract.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::Utc;

use crate::progress::{NewProgress, ProgressId, ProgressRecord, UserId};
use crate::scenario::{Scenario, ScenarioId};
use crate::storage::traits::{
    CompletionStore, ProgressStore, ScenarioStore, StorageError,
};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct ScenarioState {
    by_id: HashMap<ScenarioId, Scenario>,
    order: Vec<ScenarioId>,
}

/// In-memory [`ScenarioStore`].
#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    state: RwLock<ScenarioState>,
}

impl ScenarioStore for InMemoryScenarioStore {
    fn insert(&self, scenario: Scenario) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("scenario insert"))?;
        if state.by_id.contains_key(&scenario.id) {
            return Err(StorageError::DuplicateKey(scenario.id.to_string()));
        }
        state.order.push(scenario.id);
        state.by_id.insert(scenario.id, scenario);
        Ok(())
    }

    fn get(&self, id: ScenarioId) -> Result<Option<Scenario>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("scenario get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Scenario>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("scenario list"))?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    by_id: HashMap<ProgressId, ProgressRecord>,
    by_pair: HashMap<(UserId, ScenarioId), Vec<ProgressId>>,
}

impl ProgressState {
    fn active_for(&self, pair: (UserId, ScenarioId)) -> Option<&ProgressRecord> {
        self.by_pair
            .get(&pair)?
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .find(|r| !r.completed)
    }
}

/// In-memory [`ProgressStore`].
///
/// Enforces the one-active-record-per-(user, scenario) contract on
/// `create`; `update` is a plain replace, so racing writers resolve
/// last-write-wins exactly like the production store.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    state: RwLock<ProgressState>,
}

impl ProgressStore for InMemoryProgressStore {
    fn create(&self, new: NewProgress) -> Result<ProgressRecord, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("progress create"))?;
        let pair = (new.user_id, new.scenario_id);
        if state.active_for(pair).is_some() {
            return Err(StorageError::DuplicateKey(format!(
                "active progress for user {} scenario {}",
                new.user_id, new.scenario_id
            )));
        }

        let record = ProgressRecord::from_new(ProgressId::new(), new, Utc::now());
        state.by_pair.entry(pair).or_default().push(record.id);
        state.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: ProgressId) -> Result<Option<ProgressRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("progress get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn find_active(
        &self,
        user_id: UserId,
        scenario_id: ScenarioId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("progress find"))?;
        Ok(state.active_for((user_id, scenario_id)).cloned())
    }

    fn update(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("progress update"))?;
        if !state.by_id.contains_key(&record.id) {
            return Err(StorageError::ProgressNotFound(record.id));
        }
        state.by_id.insert(record.id, record.clone());
        Ok(())
    }
}

impl InMemoryProgressStore {
    /// All records for a (user, scenario) pair in creation order,
    /// completed ones included. Useful for history views and tests.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BackendError`] if the lock was poisoned.
    pub fn history(
        &self,
        user_id: UserId,
        scenario_id: ScenarioId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("progress history"))?;
        Ok(state
            .by_pair
            .get(&(user_id, scenario_id))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// In-memory [`CompletionStore`].
#[derive(Debug, Default)]
pub struct InMemoryCompletionStore {
    state: RwLock<HashMap<UserId, BTreeSet<String>>>,
}

impl CompletionStore for InMemoryCompletionStore {
    fn mark_complete(&self, user_id: UserId, module_id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("completion mark"))?;
        state
            .entry(user_id)
            .or_default()
            .insert(module_id.to_string());
        Ok(())
    }

    fn is_complete(&self, user_id: UserId, module_id: &str) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("completion check"))?;
        Ok(state
            .get(&user_id)
            .is_some_and(|modules| modules.contains(module_id)))
    }

    fn completed_modules(&self, user_id: UserId) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("completion list"))?;
        Ok(state
            .get(&user_id)
            .map(|modules| modules.iter().cloned().collect())
            .unwrap_or_default())
    }
}

/// Bundle of all in-memory stores for convenient embedded setup.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// Scenario definitions.
    pub scenarios: InMemoryScenarioStore,
    /// Progress records.
    pub progress: InMemoryProgressStore,
    /// Module completion flags.
    pub completions: InMemoryCompletionStore,
}
