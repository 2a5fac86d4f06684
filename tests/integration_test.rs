// tests/integration_test.rs
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use quiz_race::*;

/// Everything the sink saw for one round, in emission order.
#[derive(Default)]
struct RoundTrace {
    round_id: RoundId,
    problem_text: String,
    /// Responses the arbiter counted toward this round
    counted: Vec<(WorkerId, RoundId, bool)>,
    /// Late responses observed while this round was open or being drained
    late: Vec<(WorkerId, RoundId)>,
    won_by: Option<WorkerId>,
    exhausted: Option<ExhaustReason>,
}

/// Split the event stream at every `RoundStarted`.
fn collect_traces(rx: &mut mpsc::UnboundedReceiver<RoundEvent>) -> Vec<RoundTrace> {
    let mut traces: Vec<RoundTrace> = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            RoundEvent::WarmingUp { .. } => {}
            RoundEvent::RoundStarted {
                round_id,
                problem_text,
            } => traces.push(RoundTrace {
                round_id,
                problem_text,
                ..Default::default()
            }),
            RoundEvent::ResponseObserved {
                round_id,
                worker_id,
                is_correct,
                late,
                ..
            } => {
                let trace = traces.last_mut().expect("response before any round");
                if late {
                    trace.late.push((worker_id, round_id));
                } else {
                    trace.counted.push((worker_id, round_id, is_correct));
                }
            }
            RoundEvent::RoundWon {
                round_id,
                worker_id,
                ..
            } => {
                let trace = traces.last_mut().expect("outcome before any round");
                assert_eq!(trace.round_id, round_id);
                trace.won_by = Some(worker_id);
            }
            RoundEvent::RoundExhausted {
                round_id, reason, ..
            } => {
                let trace = traces.last_mut().expect("outcome before any round");
                assert_eq!(trace.round_id, round_id);
                trace.exhausted = Some(reason);
            }
        }
    }
    traces
}

fn classroom(workers: usize, wrong_budget: u32, wrong_probability: f64, seed: u64) -> QuizConfig {
    QuizConfig {
        worker_count: workers,
        wrong_budget,
        wrong_probability,
        think_time_min_ms: 100,
        think_time_max_ms: 300,
        inter_round_pause_ms: 300,
        seed: Some(seed),
        ..Default::default()
    }
}

fn supervisor(config: QuizConfig) -> (RoundSupervisor, mpsc::UnboundedReceiver<RoundEvent>) {
    let (sink, events) = ChannelSink::new();
    let supervisor = RoundSupervisor::new(config, Arc::new(sink)).unwrap();
    (supervisor, events)
}

#[tokio::test(start_paused = true)]
async fn test_everyone_right_first_consumed_wins() {
    println!("\n=== 5 workers, budget 5, never wrong ===\n");

    let (mut supervisor, mut events) = supervisor(classroom(5, 5, 0.0, 1));

    for _ in 0..10 {
        let report = supervisor.run_round().await.unwrap();
        assert!(matches!(report.outcome, Outcome::Won(_)));
    }

    let traces = collect_traces(&mut events);
    assert_eq!(traces.len(), 10);
    for trace in traces {
        // The arbiter decides on the very first response it consumes.
        assert_eq!(trace.counted.len(), 1);
        let (first, round_id, correct) = &trace.counted[0];
        assert_eq!(*round_id, trace.round_id);
        assert!(correct);
        assert_eq!(trace.won_by.as_ref(), Some(first));
        assert!(trace.exhausted.is_none());
    }

    println!("✓ Every round won by the first consumed response");
}

#[tokio::test(start_paused = true)]
async fn test_everyone_wrong_exhausts_after_budget() {
    println!("\n=== 3 workers, budget 3, always wrong ===\n");

    let (mut supervisor, mut events) = supervisor(classroom(3, 3, 1.0, 2));

    for _ in 0..5 {
        let report = supervisor.run_round().await.unwrap();
        assert_eq!(report.outcome, Outcome::Exhausted(ExhaustReason::WrongBudget));
    }

    for trace in collect_traces(&mut events) {
        assert_eq!(trace.counted.len(), 3);
        assert!(trace.counted.iter().all(|(_, round, correct)| !correct && *round == trace.round_id));
        assert!(trace.won_by.is_none());
    }

    println!("✓ Exhausted after exactly three wrong answers");
}

#[tokio::test(start_paused = true)]
async fn test_zero_budget_ends_on_first_wrong() {
    let (mut supervisor, mut events) = supervisor(classroom(5, 0, 1.0, 3));

    for _ in 0..5 {
        let report = supervisor.run_round().await.unwrap();
        assert_eq!(report.outcome, Outcome::Exhausted(ExhaustReason::WrongBudget));
    }

    for trace in collect_traces(&mut events) {
        assert_eq!(trace.counted.len(), 1);
    }

    println!("✓ Zero budget exhausts on the first wrong answer");
}

#[tokio::test(start_paused = true)]
async fn test_late_responses_never_decide_a_round() {
    println!("\n=== Overlapping rounds: no pause, wide think times ===\n");

    let config = QuizConfig {
        worker_count: 6,
        wrong_budget: 2,
        wrong_probability: 0.5,
        think_time_min_ms: 1,
        think_time_max_ms: 1000,
        inter_round_pause_ms: 0,
        seed: Some(4),
        ..Default::default()
    };
    let (mut supervisor, mut events) = supervisor(config);

    for _ in 0..30 {
        supervisor.run_round().await.unwrap();
    }

    let traces = collect_traces(&mut events);
    assert_eq!(traces.len(), 30);

    let mut late_seen = 0;
    for trace in &traces {
        // Only this round's responses are counted.
        assert!(trace.counted.iter().all(|(_, round, _)| *round == trace.round_id));
        // Late responses belong to this round (drained) or an earlier one.
        assert!(trace.late.iter().all(|(_, round)| *round <= trace.round_id));
        late_seen += trace.late.len();

        match (&trace.won_by, &trace.exhausted) {
            (Some(winner), None) => {
                let (last, _, correct) = trace.counted.last().unwrap();
                assert_eq!(last, winner);
                assert!(correct);
                assert!(trace.counted[..trace.counted.len() - 1].iter().all(|(_, _, c)| !c));
            }
            (None, Some(ExhaustReason::WrongBudget)) => {
                assert_eq!(trace.counted.len(), 2);
                assert!(trace.counted.iter().all(|(_, _, c)| !c));
            }
            other => panic!("round {} ended as {:?}", trace.round_id, other),
        }
    }

    assert!(late_seen > 0, "expected overlapping rounds to produce late responses");
    let stats = supervisor.arbiter_stats();
    assert_eq!(stats.violations, 0);
    println!("✓ {} late responses drained without touching an outcome", late_seen);
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_after_max_rounds() {
    let config = QuizConfig {
        max_rounds: Some(4),
        ..classroom(4, 2, 0.3, 5)
    };
    let (supervisor, mut events) = supervisor(config);
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let stats = supervisor.run(shutdown_rx).await.unwrap();
    assert_eq!(stats.rounds, 4);
    assert_eq!(stats.won + stats.exhausted, 4);
    assert_eq!(collect_traces(&mut events).len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_shutdown() {
    let (supervisor, _events) = supervisor(classroom(5, 5, 0.3, 6));
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let handle = tokio::spawn(supervisor.run(shutdown_rx));

    sleep(Duration::from_secs(5)).await;
    shutdown_tx.send(()).await.unwrap();

    let stats = handle.await.unwrap().unwrap();
    assert!(stats.rounds >= 1, "expected at least one round in 5s");
    println!("✓ Shut down cleanly after {} rounds", stats.rounds);
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_same_problems() {
    let (mut first, mut first_events) = supervisor(classroom(3, 3, 0.3, 77));
    let (mut second, mut second_events) = supervisor(classroom(3, 3, 0.3, 77));

    for _ in 0..5 {
        first.run_round().await.unwrap();
        second.run_round().await.unwrap();
    }

    let a: Vec<String> = collect_traces(&mut first_events).into_iter().map(|t| t.problem_text).collect();
    let b: Vec<String> = collect_traces(&mut second_events).into_iter().map(|t| t.problem_text).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_division_by_zero_scenario() {
    let problem = Problem::new(10, Operator::Div, 0);
    assert_eq!(problem.correct_answer, 0.0);
    println!("✓ 10 / 0 answers 0");
}
