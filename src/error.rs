//! Error types for prepdrill.
//!
//! All errors are strongly typed using thiserror so callers can pattern
//! match on specific conditions. Content defects, session-state misuse, and
//! storage failures each get their own taxonomy, wrapped by [`PrepError`].

use thiserror::Error;

use crate::scenario::{ChoiceId, ScenarioId, StepId};
use crate::storage::StorageError;

/// Content-integrity defects in an authored scenario.
///
/// These are authoring bugs, not user errors; they surface as load
/// failures rather than being silently skipped, since masking them would
/// strand users on steps with no choices rendered.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The scenario has an empty step list.
    #[error("Scenario declares no steps")]
    EmptyScenario,

    /// Two steps share an id.
    #[error("Duplicate step id '{step}'")]
    DuplicateStepId {
        /// The repeated step id.
        step: StepId,
    },

    /// The declared start step is absent from the step list.
    #[error("Start step '{step}' is not declared in the scenario")]
    MissingStartStep {
        /// The missing start step id.
        step: StepId,
    },

    /// A non-terminal step has an empty choice list.
    #[error("Step '{step}' is a choice point but declares no choices")]
    ChoicelessStep {
        /// The offending step.
        step: StepId,
    },

    /// Two choices on one step share an id.
    #[error("Duplicate choice id '{choice}' in step '{step}'")]
    DuplicateChoiceId {
        /// The owning step.
        step: StepId,
        /// The repeated choice id.
        choice: ChoiceId,
    },

    /// A choice points at a step that does not exist.
    #[error("Choice '{choice}' in step '{step}' targets unknown step '{target}'")]
    DanglingChoiceTarget {
        /// The owning step.
        step: StepId,
        /// The offending choice.
        choice: ChoiceId,
        /// The undeclared target step id.
        target: StepId,
    },
}

/// Misuse of the session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A choice arrived while feedback was still showing.
    #[error("A feedback pause is showing; no new choice can be applied yet")]
    FeedbackPending,

    /// A choice arrived after the walk reached a terminal step.
    #[error("The simulation has ended; restart to play again")]
    AlreadyCompleted,

    /// The choice id is not on the current step.
    #[error("Step '{step}' has no choice '{choice}'")]
    UnknownChoice {
        /// The current step.
        step: StepId,
        /// The unknown choice id.
        choice: ChoiceId,
    },

    /// `finish_feedback` was called with no pause in progress.
    #[error("No feedback is pending")]
    NoFeedbackPending,
}

/// Top-level error type for prepdrill.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Requested scenario is absent from the scenario store.
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),

    /// A current or target step id does not resolve in the scenario.
    #[error("Invalid step reference: '{0}'")]
    InvalidStep(StepId),

    /// No authenticated user is available.
    #[error("No authenticated user; refusing to open a simulation session")]
    Unauthenticated,

    /// Scenario content failed validation.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// The session was driven out of order.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A storage call failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PrepError {
    /// Returns true if this is a content-integrity error.
    #[must_use]
    pub const fn is_content(&self) -> bool {
        matches!(self, Self::Content(_) | Self::InvalidStep(_))
    }

    /// Returns true if this is a session state-machine error.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if retrying the whole operation could succeed.
    ///
    /// Nothing in this crate retries automatically; callers may retry
    /// `load_scenario` wholesale on transient storage failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::BackendError(_) | StorageError::ConnectionError(_))
        )
    }
}

/// Result type alias for prepdrill operations.
pub type PrepResult<T> = Result<T, PrepError>;
