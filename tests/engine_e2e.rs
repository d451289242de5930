use std::sync::Arc;

use prepdrill::identity::StaticIdentity;
use prepdrill::storage::deferred::ProgressWriteQueue;
use prepdrill::storage::{InMemoryProgressStore, InMemoryScenarioStore};
use prepdrill::{
    Choice, ChoiceId, DisasterType, PrepError, ProgressStore, Scenario, ScenarioId, ScenarioStore,
    SessionError, SessionPhase, SimulationEngine, Step, UserId,
};

fn choice(id: &str, next: &str, points: i32, feedback: &str) -> Choice {
    Choice {
        id: ChoiceId::new(id),
        text: format!("option {id}"),
        next_step_id: next.into(),
        points,
        feedback: feedback.to_string(),
    }
}

/// A small cyclone drill: shelter (good) or beach (bad), then a follow-up
/// decision on the good path.
fn cyclone_drill() -> Scenario {
    Scenario::new(
        "Cyclone drill",
        "A cyclone warning was just issued for your district.",
        DisasterType::Cyclone,
        "warning",
        vec![
            Step::choicepoint(
                "warning",
                "Cyclone warning",
                "Sirens are sounding. What do you do first?",
                vec![
                    choice("shelter", "indoors", 10, "Right, get inside early."),
                    choice("beach", "end-hurt", -10, "Never go near the shore."),
                ],
            ),
            Step::choicepoint(
                "indoors",
                "Indoors",
                "You are inside. The wind is picking up.",
                vec![
                    choice("windows", "end-hurt", -5, "Stay away from glass."),
                    choice("interior", "end-safe", 10, "An interior room is safest."),
                ],
            ),
            Step::terminal("end-safe", "Safe", "You rode out the storm safely."),
            Step::terminal("end-hurt", "Injured", "You were caught in the open."),
        ],
    )
}

struct Platform {
    scenarios: Arc<InMemoryScenarioStore>,
    progress: Arc<InMemoryProgressStore>,
    user: UserId,
    scenario_id: ScenarioId,
}

impl Platform {
    fn new() -> Self {
        let drill = cyclone_drill();
        let scenario_id = drill.id;
        let scenarios = Arc::new(InMemoryScenarioStore::default());
        scenarios.insert(drill).unwrap();
        Self {
            scenarios,
            progress: Arc::new(InMemoryProgressStore::default()),
            user: UserId::new(),
            scenario_id,
        }
    }

    /// A fresh engine over the shared stores, as a new app launch would
    /// build one.
    fn engine_for(&self, user: UserId) -> SimulationEngine {
        SimulationEngine::new(
            self.scenarios.clone(),
            self.progress.clone(),
            Arc::new(StaticIdentity::signed_in(user)),
        )
    }

    fn engine(&self) -> SimulationEngine {
        self.engine_for(self.user)
    }
}

#[test]
fn full_drill_crash_resume_and_completion() {
    let platform = Platform::new();

    // First visit: take the good first choice, then "crash" (drop the
    // session) while feedback is still showing.
    {
        let engine = platform.engine();
        let mut session = engine.load_scenario(platform.scenario_id).unwrap();
        assert_eq!(session.phase(), SessionPhase::AwaitingChoice);

        let outcome = session.apply_choice(&ChoiceId::new("shelter")).unwrap();
        assert_eq!(outcome.feedback.points, 10);
        assert!(!outcome.completed);
        // Session dropped here without finish_feedback.
    }

    // Next launch: the persisted record already points at the next step, so
    // the walk continues from "indoors" with the score intact.
    let engine = platform.engine();
    let mut session = engine.load_scenario(platform.scenario_id).unwrap();
    assert_eq!(session.current_step().id.as_str(), "indoors");
    assert_eq!(session.score(), 10);
    assert_eq!(session.record().choice_log.len(), 1);

    let outcome = session.apply_choice(&ChoiceId::new("interior")).unwrap();
    assert!(outcome.completed);
    session.finish_feedback().unwrap();
    assert_eq!(session.phase(), SessionPhase::Terminal);
    assert_eq!(session.score(), 20);

    let stored = platform
        .progress
        .get(session.record().id)
        .unwrap()
        .unwrap();
    assert!(stored.completed);
    assert_eq!(stored.score, stored.logged_score());
}

#[test]
fn completed_drill_refuses_choices_until_restart() {
    let platform = Platform::new();
    let engine = platform.engine();
    let mut session = engine.load_scenario(platform.scenario_id).unwrap();

    session.apply_choice(&ChoiceId::new("beach")).unwrap();
    session.finish_feedback().unwrap();
    assert_eq!(session.phase(), SessionPhase::Terminal);
    assert_eq!(session.score(), -10);

    let err = session.apply_choice(&ChoiceId::new("beach")).unwrap_err();
    assert!(matches!(
        err,
        PrepError::Session(SessionError::AlreadyCompleted)
    ));

    let finished_id = session.record().id;
    session.restart().unwrap();
    assert_eq!(session.phase(), SessionPhase::AwaitingChoice);
    assert_eq!(session.score(), 0);
    assert_ne!(session.record().id, finished_id);

    // The finished walk survives for history.
    let history = platform
        .progress
        .history(platform.user, platform.scenario_id)
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].completed);
    assert!(!history[1].completed);
}

#[test]
fn two_users_walk_independently() {
    let platform = Platform::new();
    let other_user = UserId::new();

    let mut a = platform
        .engine()
        .load_scenario(platform.scenario_id)
        .unwrap();
    let mut b = platform
        .engine_for(other_user)
        .load_scenario(platform.scenario_id)
        .unwrap();
    assert_ne!(a.record().id, b.record().id);

    a.apply_choice(&ChoiceId::new("shelter")).unwrap();
    a.finish_feedback().unwrap();
    b.apply_choice(&ChoiceId::new("beach")).unwrap();
    b.finish_feedback().unwrap();

    assert_eq!(a.score(), 10);
    assert_eq!(b.score(), -10);
    assert_eq!(a.phase(), SessionPhase::AwaitingChoice);
    assert_eq!(b.phase(), SessionPhase::Terminal);
}

#[test]
fn exit_write_goes_through_the_background_queue() {
    let platform = Platform::new();
    let engine = platform.engine();
    let mut session = engine.load_scenario(platform.scenario_id).unwrap();

    session.apply_choice(&ChoiceId::new("shelter")).unwrap();
    session.finish_feedback().unwrap();

    // The shell tears down: hand the final record to the writer and leave
    // without waiting on the ticket.
    let queue = ProgressWriteQueue::new(platform.progress.clone(), 8);
    let record = session.record().clone();
    drop(session);
    drop(queue.enqueue(record.clone()));
    drop(queue); // drains before returning

    let stored = platform.progress.get(record.id).unwrap().unwrap();
    assert_eq!(stored.score, 10);
    assert_eq!(stored.current_step_id.as_str(), "indoors");
}
