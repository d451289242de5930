use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use prepdrill::identity::StaticIdentity;
use prepdrill::storage::{InMemoryProgressStore, InMemoryScenarioStore};
use prepdrill::{
    Choice, ChoiceId, DisasterType, Scenario, ScenarioStore, SessionPhase, SimulationEngine, Step,
    UserId,
};

/// A linear scenario of `len` choicepoints ending in a terminal step, each
/// step offering one correct and one dead-end choice.
fn chain_scenario(len: usize) -> Scenario {
    let mut steps = Vec::with_capacity(len + 2);
    for i in 0..len {
        let next = if i + 1 == len {
            "end".to_string()
        } else {
            format!("s{}", i + 1)
        };
        steps.push(Step::choicepoint(
            format!("s{i}"),
            format!("Step {i}"),
            "pick",
            vec![
                Choice {
                    id: ChoiceId::new("on"),
                    text: "keep going".to_string(),
                    next_step_id: next.into(),
                    points: 5,
                    feedback: "good".to_string(),
                },
                Choice {
                    id: ChoiceId::new("off"),
                    text: "give up".to_string(),
                    next_step_id: "bail".into(),
                    points: -5,
                    feedback: "bad".to_string(),
                },
            ],
        ));
    }
    steps.push(Step::terminal("end", "Done", "made it"));
    steps.push(Step::terminal("bail", "Bailed", "gave up"));

    Scenario::new("chain", "linear drill", DisasterType::Flood, "s0", steps)
}

fn engine_over(scenario: &Scenario) -> SimulationEngine {
    let scenarios = Arc::new(InMemoryScenarioStore::default());
    scenarios.insert(scenario.clone()).unwrap();
    SimulationEngine::new(
        scenarios,
        Arc::new(InMemoryProgressStore::default()),
        Arc::new(StaticIdentity::signed_in(UserId::new())),
    )
}

fn bench_validate_and_digest(c: &mut Criterion) {
    let scenario = chain_scenario(50);

    c.bench_function("scenario_validate_50_steps", |b| {
        b.iter(|| black_box(&scenario).validate().unwrap());
    });

    c.bench_function("scenario_digest_50_steps", |b| {
        b.iter(|| black_box(&scenario).content_digest());
    });
}

fn bench_full_walkthrough(c: &mut Criterion) {
    let scenario = chain_scenario(20);
    let on = ChoiceId::new("on");

    c.bench_function("walkthrough_20_steps", |b| {
        b.iter_batched(
            || engine_over(&scenario).load_scenario(scenario.id).unwrap(),
            |mut session| {
                while session.phase() == SessionPhase::AwaitingChoice {
                    session.apply_choice(&on).unwrap();
                    session.finish_feedback().unwrap();
                }
                session
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_single_choice(c: &mut Criterion) {
    let scenario = chain_scenario(20);

    c.bench_function("apply_one_choice", |b| {
        b.iter_batched(
            || engine_over(&scenario).load_scenario(scenario.id).unwrap(),
            |mut session| {
                session.apply_choice(&ChoiceId::new("on")).unwrap();
                session
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_validate_and_digest,
    bench_full_walkthrough,
    bench_single_choice
);
criterion_main!(benches);
