//! Persisted, resumable progress through a scenario.
//!
//! One [`ProgressRecord`] exists per (user, scenario) pair that has been
//! started; at most one of them is *active* (not completed) at a time. The
//! record is the engine's durable counterpart: every choice appends to the
//! log, and the score invariant — `score` equals the sum of logged points —
//! must hold after every mutation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scenario::{ChoiceId, ScenarioId, StepId};

/// Identifier of an authenticated user, supplied by the identity provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identifier of a progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressId(Uuid);

impl ProgressId {
    /// Creates a new random progress ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a progress ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProgressId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProgressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the append-only choice log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    /// Step the user was at when choosing.
    pub step_id: StepId,

    /// The selected choice.
    pub choice_id: ChoiceId,

    /// Point delta the choice carried at the time.
    pub points: i32,

    /// When the choice was made.
    pub timestamp: DateTime<Utc>,
}

/// Fields of a progress record to be inserted; the store assigns the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgress {
    /// Owning user.
    pub user_id: UserId,

    /// Scenario being played.
    pub scenario_id: ScenarioId,

    /// Initial step, normally the scenario's start step.
    pub current_step_id: StepId,

    /// Content digest of the scenario at creation time.
    pub scenario_digest: String,
}

/// The persisted, resumable state of one user's walk through one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Store-assigned identifier.
    pub id: ProgressId,

    /// Owning user; immutable after creation.
    pub user_id: UserId,

    /// Scenario being played; immutable after creation.
    pub scenario_id: ScenarioId,

    /// Step the user is currently at.
    pub current_step_id: StepId,

    /// Append-only log, one entry per choice made.
    #[serde(default)]
    pub choice_log: Vec<ChoiceRecord>,

    /// Running score; equals the sum of logged points at all times.
    pub score: i64,

    /// Monotonic false-to-true completion flag.
    pub completed: bool,

    /// Set once when `completed` first becomes true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Content digest of the scenario when this walk started.
    pub scenario_digest: String,

    /// When this walk was started.
    pub started_at: DateTime<Utc>,

    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Materializes a record from its insert shape; used by stores.
    #[must_use]
    pub fn from_new(id: ProgressId, new: NewProgress, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            scenario_id: new.scenario_id,
            current_step_id: new.current_step_id,
            choice_log: Vec::new(),
            score: 0,
            completed: false,
            completed_at: None,
            scenario_digest: new.scenario_digest,
            started_at: now,
            updated_at: now,
        }
    }

    /// Sum of points over the choice log.
    #[must_use]
    pub fn logged_score(&self) -> i64 {
        self.choice_log.iter().map(|c| i64::from(c.points)).sum()
    }

    /// Applies one choice: appends to the log, adjusts the score, moves the
    /// current step, and marks completion when the target is terminal.
    ///
    /// `completed_at` is set exactly once; callers must not invoke this on
    /// an already-completed record (the session state machine enforces it).
    pub fn record_choice(&mut self, entry: ChoiceRecord, next_step_id: StepId, completes: bool) {
        self.score += i64::from(entry.points);
        let at = entry.timestamp;
        self.choice_log.push(entry);
        self.current_step_id = next_step_id;
        if completes && !self.completed {
            self.completed = true;
            self.completed_at = Some(at);
        }
        self.touch();
    }

    /// Resets the record to a fresh walk from `start_step_id`.
    ///
    /// Only meaningful for records that are being reused as a new logical
    /// session; completed records are superseded by new ones instead.
    pub fn reset(&mut self, start_step_id: StepId) {
        self.current_step_id = start_step_id;
        self.choice_log.clear();
        self.score = 0;
        self.completed = false;
        self.completed_at = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
