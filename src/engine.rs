//! Simulation engine and session state machine.
//!
//! [`SimulationEngine`] bootstraps a session for one user and one scenario:
//! it fetches the scenario, resolves or creates the progress record, and
//! hands back a [`SimulationSession`] that walks the step graph.
//!
//! The session is a small state machine
//! (`AwaitingChoice -> ShowingFeedback -> AwaitingChoice | Terminal`) and is
//! deliberately synchronous: the feedback pause is cooperative. The shell
//! shows the feedback for [`EngineConfig::feedback_delay`] and then calls
//! [`SimulationSession::finish_feedback`]; while feedback is showing, new
//! choices are rejected, since nothing is rendered to pick from.
//!
//! Persistence is client-authoritative and best-effort: a failed store
//! update never rolls back the visible step, it rides along in the
//! [`ChoiceOutcome`] for the shell to report.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::{PrepError, PrepResult, SessionError};
use crate::identity::IdentityProvider;
use crate::progress::{ChoiceRecord, NewProgress, ProgressRecord};
use crate::scenario::{ChoiceId, Scenario, ScenarioId, Step, StepId};
use crate::storage::{ProgressStore, ScenarioStore, StorageError};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the shell should display choice feedback before calling
    /// [`SimulationSession::finish_feedback`]. Advisory; the engine itself
    /// never sleeps.
    pub feedback_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feedback_delay: Duration::from_secs(2),
        }
    }
}

/// Phase of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Choices are rendered; `apply_choice` is accepted.
    AwaitingChoice,
    /// Feedback for the last choice is showing; choices are rejected.
    ShowingFeedback,
    /// The walk reached a terminal step; only `restart` is accepted.
    Terminal,
}

/// One selectable choice, as rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceView {
    /// Choice identifier to pass back to `apply_choice`.
    pub id: ChoiceId,
    /// Prompt text.
    pub text: String,
}

/// The current step, as rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    /// Step identifier.
    pub id: StepId,
    /// Display title.
    pub title: String,
    /// Narrative text.
    pub description: String,
    /// True when this step ends the simulation.
    pub is_terminal: bool,
    /// Selectable choices; empty for terminal steps.
    pub choices: Vec<ChoiceView>,
}

/// Feedback emitted right after a choice, before the visible transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackView {
    /// The choice this feedback belongs to.
    pub choice_id: ChoiceId,
    /// Feedback text to display.
    pub text: String,
    /// Point delta the choice carried.
    pub points: i32,
}

/// Read-only snapshot of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Scenario being played.
    pub scenario_id: ScenarioId,
    /// The visible step.
    pub step: StepView,
    /// Running score; may be negative.
    pub score: i64,
    /// Current phase.
    pub phase: SessionPhase,
    /// True while feedback is showing and choices are rejected.
    pub feedback_pending: bool,
    /// Most recent feedback, if any choice has been made.
    pub last_feedback: Option<FeedbackView>,
    /// Approximate progress fraction in `[0, 1]`: position of the visible
    /// step in authoring order over the declared step count.
    pub progress: f32,
    /// True when the scenario definition changed since this walk started.
    pub stale_content: bool,
}

/// Result of applying a choice.
#[derive(Debug)]
pub struct ChoiceOutcome {
    /// Feedback to display during the pause.
    pub feedback: FeedbackView,
    /// True when the choice led to a terminal step.
    pub completed: bool,
    /// Set when the store update failed; the in-memory walk has advanced
    /// regardless and the user may continue.
    pub persist_failure: Option<StorageError>,
}

struct PendingTransition {
    next_index: usize,
    feedback: FeedbackView,
}

/// Bootstrapper for simulation sessions.
#[derive(Clone)]
pub struct SimulationEngine {
    scenarios: Arc<dyn ScenarioStore>,
    progress: Arc<dyn ProgressStore>,
    identity: Arc<dyn IdentityProvider>,
    config: EngineConfig,
}

impl SimulationEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(
        scenarios: Arc<dyn ScenarioStore>,
        progress: Arc<dyn ProgressStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::with_config(scenarios, progress, identity, EngineConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(
        scenarios: Arc<dyn ScenarioStore>,
        progress: Arc<dyn ProgressStore>,
        identity: Arc<dyn IdentityProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            scenarios,
            progress,
            identity,
            config,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Opens a session for the current user on `scenario_id`.
    ///
    /// Resumes the active progress record if one exists; otherwise inserts
    /// a fresh one (the only insert this operation ever performs, so
    /// loading twice in a row creates at most one record).
    ///
    /// # Errors
    ///
    /// - [`PrepError::Unauthenticated`] when nobody is signed in.
    /// - [`PrepError::ScenarioNotFound`] when the id is unknown.
    /// - [`PrepError::Content`] when the scenario fails validation.
    /// - [`PrepError::InvalidStep`] when the resumed current step does not
    ///   resolve in the step graph.
    /// - [`PrepError::Storage`] when a store call fails.
    pub fn load_scenario(&self, scenario_id: ScenarioId) -> PrepResult<SimulationSession> {
        let user_id = self
            .identity
            .current_user()
            .ok_or(PrepError::Unauthenticated)?;

        let scenario = self
            .scenarios
            .get(scenario_id)?
            .ok_or(PrepError::ScenarioNotFound(scenario_id))?;
        scenario.validate()?;

        let digest = scenario.content_digest();
        let record = match self.progress.find_active(user_id, scenario_id)? {
            Some(existing) => existing,
            None => self.progress.create(NewProgress {
                user_id,
                scenario_id,
                current_step_id: scenario.start_step_id.clone(),
                scenario_digest: digest.clone(),
            })?,
        };

        SimulationSession::resume(
            scenario,
            record,
            Arc::clone(&self.progress),
            digest,
            self.config.feedback_delay,
        )
    }
}

/// One user's live walk through one scenario.
pub struct SimulationSession {
    scenario: Scenario,
    record: ProgressRecord,
    store: Arc<dyn ProgressStore>,
    content_digest: String,
    feedback_delay: Duration,

    start_index: usize,
    visible_index: usize,
    phase: SessionPhase,
    pending: Option<PendingTransition>,
    last_feedback: Option<FeedbackView>,

    // Set when a restart could not obtain a persistable record; while
    // detached, store updates are skipped so a completed record is never
    // overwritten.
    detached: bool,
}

impl std::fmt::Debug for SimulationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationSession")
            .field("scenario", &self.scenario)
            .field("record", &self.record)
            .field("content_digest", &self.content_digest)
            .field("feedback_delay", &self.feedback_delay)
            .field("start_index", &self.start_index)
            .field("visible_index", &self.visible_index)
            .field("phase", &self.phase)
            .field("last_feedback", &self.last_feedback)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

impl SimulationSession {
    fn resume(
        scenario: Scenario,
        record: ProgressRecord,
        store: Arc<dyn ProgressStore>,
        content_digest: String,
        feedback_delay: Duration,
    ) -> PrepResult<Self> {
        let start_index = scenario
            .step_index(&scenario.start_step_id)
            .ok_or_else(|| PrepError::InvalidStep(scenario.start_step_id.clone()))?;
        let visible_index = scenario
            .step_index(&record.current_step_id)
            .ok_or_else(|| PrepError::InvalidStep(record.current_step_id.clone()))?;

        // A resumed record can already sit on an end state (crash before the
        // completion write landed); land in Terminal instead of crashing.
        let phase = if record.completed || scenario.steps[visible_index].is_terminal() {
            SessionPhase::Terminal
        } else {
            SessionPhase::AwaitingChoice
        };

        Ok(Self {
            scenario,
            record,
            store,
            content_digest,
            feedback_delay,
            start_index,
            visible_index,
            phase,
            pending: None,
            last_feedback: None,
            detached: false,
        })
    }

    /// The scenario being played.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// The backing progress record as the session sees it.
    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Running score.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.record.score
    }

    /// The step currently visible to the user.
    ///
    /// During the feedback pause this is still the step the choice was made
    /// on; it advances when [`Self::finish_feedback`] is called.
    #[must_use]
    pub fn current_step(&self) -> &Step {
        // visible_index is validated at construction and on every transition.
        &self.scenario.steps[self.visible_index]
    }

    /// How long the shell should display feedback before advancing.
    #[must_use]
    pub const fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    /// Read-only snapshot for rendering.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let step = self.current_step();
        let view = StepView {
            id: step.id.clone(),
            title: step.title.clone(),
            description: step.description.clone(),
            is_terminal: step.is_terminal(),
            choices: step
                .choices()
                .iter()
                .map(|c| ChoiceView {
                    id: c.id.clone(),
                    text: c.text.clone(),
                })
                .collect(),
        };

        let last_feedback = self
            .pending
            .as_ref()
            .map(|p| p.feedback.clone())
            .or_else(|| self.last_feedback.clone());

        #[allow(clippy::cast_precision_loss)]
        let progress = (self.visible_index + 1) as f32 / self.scenario.step_count() as f32;

        SessionSnapshot {
            scenario_id: self.scenario.id,
            step: view,
            score: self.record.score,
            phase: self.phase,
            feedback_pending: self.phase == SessionPhase::ShowingFeedback,
            last_feedback,
            progress,
            stale_content: self.record.scenario_digest != self.content_digest,
        }
    }

    /// Applies one of the current step's choices.
    ///
    /// On success the choice is logged, the score adjusted, the record
    /// persisted (full replace, best effort), and feedback emitted; the
    /// visible step advances only on [`Self::finish_feedback`].
    ///
    /// # Errors
    ///
    /// - [`SessionError::FeedbackPending`] while feedback is showing.
    /// - [`SessionError::AlreadyCompleted`] in the terminal phase.
    /// - [`SessionError::UnknownChoice`] when the id is not on this step.
    /// - [`PrepError::InvalidStep`] when the choice targets a step missing
    ///   from the graph; nothing is mutated in that case.
    pub fn apply_choice(&mut self, choice_id: &ChoiceId) -> PrepResult<ChoiceOutcome> {
        match self.phase {
            SessionPhase::ShowingFeedback => {
                return Err(SessionError::FeedbackPending.into());
            }
            SessionPhase::Terminal => {
                return Err(SessionError::AlreadyCompleted.into());
            }
            SessionPhase::AwaitingChoice => {}
        }

        let step = self.current_step();
        let choice = step
            .choice(choice_id)
            .ok_or_else(|| SessionError::UnknownChoice {
                step: step.id.clone(),
                choice: choice_id.clone(),
            })?
            .clone();

        // Resolve the target before mutating anything; a dangling target
        // must leave score and step untouched.
        let next_index = self
            .scenario
            .step_index(&choice.next_step_id)
            .ok_or_else(|| PrepError::InvalidStep(choice.next_step_id.clone()))?;
        let completes = self.scenario.steps[next_index].is_terminal();

        let entry = ChoiceRecord {
            step_id: step.id.clone(),
            choice_id: choice.id.clone(),
            points: choice.points,
            timestamp: Utc::now(),
        };
        self.record
            .record_choice(entry, choice.next_step_id.clone(), completes);

        let persist_failure = if self.detached {
            Some(StorageError::BackendError(
                "session detached from storage".to_string(),
            ))
        } else {
            self.store.update(&self.record).err()
        };

        let feedback = FeedbackView {
            choice_id: choice.id,
            text: choice.feedback,
            points: choice.points,
        };
        self.pending = Some(PendingTransition {
            next_index,
            feedback: feedback.clone(),
        });
        self.phase = SessionPhase::ShowingFeedback;

        Ok(ChoiceOutcome {
            feedback,
            completed: completes,
            persist_failure,
        })
    }

    /// Completes the feedback pause: advances the visible step and returns
    /// it. The shell calls this after displaying feedback for
    /// [`Self::feedback_delay`].
    ///
    /// # Errors
    ///
    /// [`SessionError::NoFeedbackPending`] when no choice is awaiting its
    /// transition.
    pub fn finish_feedback(&mut self) -> PrepResult<&Step> {
        let pending = self
            .pending
            .take()
            .ok_or(SessionError::NoFeedbackPending)?;

        self.visible_index = pending.next_index;
        self.last_feedback = Some(pending.feedback);
        self.phase = if self.current_step().is_terminal() {
            SessionPhase::Terminal
        } else {
            SessionPhase::AwaitingChoice
        };

        Ok(self.current_step())
    }

    /// Starts a fresh logical walk from the scenario's start step.
    ///
    /// The in-memory state (step, score, log, feedback) is always reset.
    /// Persistence is best-effort: a completed record is superseded by a
    /// newly created one so history is preserved, while a still-active
    /// record is reset in place. On a storage failure the session detaches
    /// — subsequent choice writes report `persist_failure` instead of ever
    /// writing into a completed record — and the next successful restart
    /// re-attaches.
    ///
    /// # Errors
    ///
    /// Returns the storage error when the supersede/reset write failed;
    /// the in-memory restart has happened regardless.
    pub fn restart(&mut self) -> Result<(), StorageError> {
        self.pending = None;
        self.last_feedback = None;

        let start = self.scenario.start_step_id.clone();
        let outcome = if self.detached || self.record.completed {
            match self.store.create(NewProgress {
                user_id: self.record.user_id,
                scenario_id: self.record.scenario_id,
                current_step_id: start.clone(),
                scenario_digest: self.content_digest.clone(),
            }) {
                Ok(fresh) => {
                    self.record = fresh;
                    self.detached = false;
                    Ok(())
                }
                Err(err) => {
                    // Keep playing in memory only; the stale record id is
                    // never written while detached.
                    self.record.reset(start);
                    self.detached = true;
                    Err(err)
                }
            }
        } else {
            self.record.reset(start);
            self.store.update(&self.record)
        };

        self.visible_index = self.start_index;
        self.phase = if self.current_step().is_terminal() {
            SessionPhase::Terminal
        } else {
            SessionPhase::AwaitingChoice
        };

        outcome
    }
}
