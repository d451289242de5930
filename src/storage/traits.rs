//! Abstract storage traits.
//!
//! These traits define the contract that storage backends must implement.
//! The production backing store is a managed relational service reached
//! over a request/response API; reproducing that engine is out of scope,
//! only its access pattern is modelled here.

use thiserror::Error;

use crate::progress::{NewProgress, ProgressId, ProgressRecord, UserId};
use crate::scenario::{Scenario, ScenarioId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Scenario not found.
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),

    /// Progress record not found.
    #[error("Progress record not found: {0}")]
    ProgressNotFound(ProgressId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Storage trait for scenario definitions.
///
/// Scenarios are immutable content: written by authoring tools, read by
/// the engine. There is no update operation.
pub trait ScenarioStore: Send + Sync {
    /// Insert a new scenario. Returns an error if the ID already exists.
    fn insert(&self, scenario: Scenario) -> Result<(), StorageError>;

    /// Get a scenario by ID.
    fn get(&self, id: ScenarioId) -> Result<Option<Scenario>, StorageError>;

    /// List all scenarios in insertion order.
    fn list(&self) -> Result<Vec<Scenario>, StorageError>;
}

/// Storage trait for progress records.
///
/// # Consistency contract
/// - At most one *active* (non-completed) record exists per
///   (user, scenario) pair; `create` must reject a second one.
/// - `update` is a full-record replace. Two sessions racing updates on the
///   same record id resolve last-write-wins; no version token is used.
pub trait ProgressStore: Send + Sync {
    /// Insert a new record; the store assigns the id and `started_at`.
    fn create(&self, new: NewProgress) -> Result<ProgressRecord, StorageError>;

    /// Get a record by ID.
    fn get(&self, id: ProgressId) -> Result<Option<ProgressRecord>, StorageError>;

    /// Find the active (non-completed) record for a (user, scenario) pair.
    fn find_active(
        &self,
        user_id: UserId,
        scenario_id: ScenarioId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Replace an existing record. Returns an error if it does not exist.
    fn update(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}

/// Key-value port for learning-module completion flags.
///
/// Module pages mark themselves complete per user; this is deliberately a
/// narrow key-value contract rather than ambient global state.
pub trait CompletionStore: Send + Sync {
    /// Mark a module complete for a user. Idempotent.
    fn mark_complete(&self, user_id: UserId, module_id: &str) -> Result<(), StorageError>;

    /// Has the user completed the module?
    fn is_complete(&self, user_id: UserId, module_id: &str) -> Result<bool, StorageError>;

    /// All module ids the user has completed, sorted.
    fn completed_modules(&self, user_id: UserId) -> Result<Vec<String>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_scenario_store_object_safe(_: &dyn ScenarioStore) {}
    fn _assert_progress_store_object_safe(_: &dyn ProgressStore) {}
    fn _assert_completion_store_object_safe(_: &dyn CompletionStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::ScenarioNotFound(ScenarioId::new());
        assert!(err.to_string().contains("Scenario not found"));

        let err = StorageError::BackendError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
