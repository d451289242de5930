//! Scenario content model.
//!
//! A scenario is an authored branching narrative for one disaster type:
//! a directed graph of steps, each either a choice point or a terminal end.
//! Scenarios are immutable at runtime; the engine only ever reads them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContentError;

/// Globally unique scenario identifier.
///
/// Assigned when a scenario is authored and never changed afterwards;
/// progress records reference scenarios by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(Uuid);

impl ScenarioId {
    /// Creates a new random scenario ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a scenario ID from an existing UUID.
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

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ScenarioId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Author-chosen identifier of a step within a scenario.
///
/// Step ids are plain strings ("s1", "evacuate") because scenario content
/// references them by name; they are only unique within one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Creates a step id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Author-chosen identifier of a choice, unique within its owning step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(String);

impl ChoiceId {
    /// Creates a choice id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Classification of the hazard a scenario trains for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterType {
    /// Riverine or flash flooding
    Flood,
    /// Seismic events
    Earthquake,
    /// Cyclones, hurricanes, typhoons
    Cyclone,
    /// Structural or wildland fire
    Fire,
    /// Any hazard not covered by the built-in types
    Other(String),
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flood => write!(f, "flood"),
            Self::Earthquake => write!(f, "earthquake"),
            Self::Cyclone => write!(f, "cyclone"),
            Self::Fire => write!(f, "fire"),
            Self::Other(name) => write!(f, "other:{name}"),
        }
    }
}

/// An edge in the scenario graph: one selectable answer at a choice point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Identifier, unique within the owning step.
    pub id: ChoiceId,

    /// Prompt shown to the user.
    pub text: String,

    /// Step to transition to when this choice is selected.
    pub next_step_id: StepId,

    /// Signed point delta applied to the running score.
    pub points: i32,

    /// Text shown after selection, before the transition completes.
    pub feedback: String,
}

/// The branching structure of a step.
///
/// Modelled as a tagged variant so a "terminal step with choices" cannot
/// be represented at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepBody {
    /// A decision point with at least one selectable choice.
    Choicepoint {
        /// Ordered choices presented to the user.
        choices: Vec<Choice>,
    },
    /// An end state; the simulation completes on arrival.
    Terminal,
}

/// A node in the scenario graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, unique within the scenario.
    pub id: StepId,

    /// Display title.
    pub title: String,

    /// Narrative text describing the situation.
    pub description: String,

    /// Choice point or terminal end.
    #[serde(flatten)]
    pub body: StepBody,
}

impl Step {
    /// Creates a choice-point step.
    #[must_use]
    pub fn choicepoint(
        id: impl Into<StepId>,
        title: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            body: StepBody::Choicepoint { choices },
        }
    }

    /// Creates a terminal step.
    #[must_use]
    pub fn terminal(
        id: impl Into<StepId>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            body: StepBody::Terminal,
        }
    }

    /// Returns true if this step ends the simulation.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.body, StepBody::Terminal)
    }

    /// Returns the step's choices; empty for terminal steps.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match &self.body {
            StepBody::Choicepoint { choices } => choices,
            StepBody::Terminal => &[],
        }
    }

    /// Looks up a choice by id.
    #[must_use]
    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices().iter().find(|c| &c.id == id)
    }
}

/// An authored branching narrative for one disaster type.
///
/// `steps` keeps the authoring order, which feeds the approximate progress
/// fraction shown while playing; graph traversal ignores it. Lookups go
/// through [`Scenario::step`], which enforces the unique-id invariant
/// established by [`Scenario::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Globally unique identifier.
    pub id: ScenarioId,

    /// Display title.
    pub title: String,

    /// Short description shown on scenario cards.
    pub description: String,

    /// Hazard this scenario trains for.
    pub disaster_type: DisasterType,

    /// Identifier of the initial step; must be declared in `steps`.
    pub start_step_id: StepId,

    /// Step graph in authoring order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Creates a scenario with a fresh random id.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        disaster_type: DisasterType,
        start_step_id: impl Into<StepId>,
        steps: Vec<Step>,
    ) -> Self {
        Self::with_id(
            ScenarioId::new(),
            title,
            description,
            disaster_type,
            start_step_id,
            steps,
        )
    }

    /// Creates a scenario with a specific id (migration, tests).
    #[must_use]
    pub fn with_id(
        id: ScenarioId,
        title: impl Into<String>,
        description: impl Into<String>,
        disaster_type: DisasterType,
        start_step_id: impl Into<StepId>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            disaster_type,
            start_step_id: start_step_id.into(),
            steps,
        }
    }

    /// Number of declared steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Looks up a step by id.
    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Position of a step in authoring order.
    #[must_use]
    pub fn step_index(&self, id: &StepId) -> Option<usize> {
        self.steps.iter().position(|s| &s.id == id)
    }

    /// Checks the content-integrity invariants of the step graph.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContentError`] found: empty scenario, duplicate
    /// step ids, missing start step, choice points without choices,
    /// duplicate choice ids within a step, or choices targeting steps that
    /// do not exist.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.steps.is_empty() {
            return Err(ContentError::EmptyScenario);
        }

        let mut ids: HashSet<&StepId> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !ids.insert(&step.id) {
                return Err(ContentError::DuplicateStepId {
                    step: step.id.clone(),
                });
            }
        }

        if !ids.contains(&self.start_step_id) {
            return Err(ContentError::MissingStartStep {
                step: self.start_step_id.clone(),
            });
        }

        for step in &self.steps {
            let choices = step.choices();
            if !step.is_terminal() && choices.is_empty() {
                return Err(ContentError::ChoicelessStep {
                    step: step.id.clone(),
                });
            }

            let mut seen: HashMap<&ChoiceId, ()> = HashMap::with_capacity(choices.len());
            for choice in choices {
                if seen.insert(&choice.id, ()).is_some() {
                    return Err(ContentError::DuplicateChoiceId {
                        step: step.id.clone(),
                        choice: choice.id.clone(),
                    });
                }
                if !ids.contains(&choice.next_step_id) {
                    return Err(ContentError::DanglingChoiceTarget {
                        step: step.id.clone(),
                        choice: choice.id.clone(),
                        target: choice.next_step_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Stable digest of the step graph.
    ///
    /// Recorded on a progress record at creation so a resume can tell when
    /// the scenario definition changed underneath a half-finished walk.
    /// Covers the start step and every step/choice field that affects play;
    /// scenario title and description are deliberately excluded.
    #[must_use]
    pub fn content_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        // Length-prefixed fields so concatenations cannot collide.
        fn feed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        feed(&mut hasher, self.start_step_id.as_str().as_bytes());
        for step in &self.steps {
            feed(&mut hasher, step.id.as_str().as_bytes());
            feed(&mut hasher, step.title.as_bytes());
            feed(&mut hasher, step.description.as_bytes());
            hasher.update(&[u8::from(step.is_terminal())]);
            for choice in step.choices() {
                feed(&mut hasher, choice.id.as_str().as_bytes());
                feed(&mut hasher, choice.text.as_bytes());
                feed(&mut hasher, choice.next_step_id.as_str().as_bytes());
                hasher.update(&choice.points.to_le_bytes());
                feed(&mut hasher, choice.feedback.as_bytes());
            }
        }

        hasher.finalize().to_hex().to_string()
    }
}
