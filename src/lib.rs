//! # prepdrill - Disaster-Preparedness Simulation Engine
//!
//! prepdrill drives users through authored branching disaster scenarios:
//! a directed graph of steps and choices with externally persisted,
//! resumable progress, scoring, and idempotent completion. Around the
//! engine it carries the small satellite pieces a preparedness platform
//! needs: quiz scoring, alert geofencing, leaderboard aggregation, a
//! voice keyword matcher, and module-completion tracking.
//!
//! ## Core Concepts
//!
//! - **Scenario**: an immutable authored step graph for one disaster type
//! - **ProgressRecord**: the persisted, resumable state of one user's walk
//! - **SimulationSession**: the live state machine over both of the above
//! - **Storage ports**: traits the engine needs from its backing store
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use prepdrill::identity::StaticIdentity;
//! use prepdrill::progress::UserId;
//! use prepdrill::scenario::{Choice, ChoiceId, DisasterType, Scenario, Step};
//! use prepdrill::storage::{InMemoryProgressStore, InMemoryScenarioStore, ScenarioStore};
//! use prepdrill::SimulationEngine;
//!
//! let scenario = Scenario::new(
//!     "Flash flood",
//!     "Water is rising fast",
//!     DisasterType::Flood,
//!     "s1",
//!     vec![
//!         Step::choicepoint("s1", "Water rising", "What do you do?", vec![Choice {
//!             id: ChoiceId::new("c1"),
//!             text: "Move to higher ground".to_string(),
//!             next_step_id: "s2".into(),
//!             points: 10,
//!             feedback: "Good call.".to_string(),
//!         }]),
//!         Step::terminal("s2", "Safe", "You reached safety."),
//!     ],
//! );
//!
//! let scenarios = Arc::new(InMemoryScenarioStore::default());
//! scenarios.insert(scenario.clone()).unwrap();
//! let progress = Arc::new(InMemoryProgressStore::default());
//! let identity = Arc::new(StaticIdentity::signed_in(UserId::new()));
//!
//! let engine = SimulationEngine::new(scenarios, progress, identity);
//! let mut session = engine.load_scenario(scenario.id).unwrap();
//! let outcome = session.apply_choice(&ChoiceId::new("c1")).unwrap();
//! assert_eq!(outcome.feedback.points, 10);
//! session.finish_feedback().unwrap();
//! assert_eq!(session.score(), 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod engine;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod progress;
pub mod quiz;
pub mod scenario;
pub mod storage;
pub mod voice;

// Re-export primary types at crate root for convenience
pub use engine::{
    ChoiceOutcome, EngineConfig, FeedbackView, SessionPhase, SessionSnapshot, SimulationEngine,
    SimulationSession, StepView,
};
pub use error::{ContentError, PrepError, PrepResult, SessionError};
pub use progress::{ChoiceRecord, NewProgress, ProgressId, ProgressRecord, UserId};
pub use scenario::{
    Choice, ChoiceId, DisasterType, Scenario, ScenarioId, Step, StepBody, StepId,
};
pub use storage::{
    CompletionStore, InMemoryStores, ProgressStore, ScenarioStore, StorageError,
};
