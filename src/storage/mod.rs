//! Storage ports and backends.
//!
//! Traits define the contract the engine needs from its backing store; the
//! in-memory implementations serve embedded use and tests. The deferred
//! writer provides best-effort background persistence for UI teardown.

mod memory;
mod traits;

/// Best-effort background progress writes.
pub mod deferred;

pub use memory::{
    InMemoryCompletionStore, InMemoryProgressStore, InMemoryScenarioStore, InMemoryStores,
};
pub use traits::{CompletionStore, ProgressStore, ScenarioStore, StorageError};
