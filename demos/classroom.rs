// demos/classroom.rs
use quiz_race::*;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    println!("🏫 Classroom quiz");
    println!("=================");
    println!("5 students race to answer; 3 wrong answers and the teacher gives up.\n");

    let config = QuizConfig {
        worker_count: 5,
        wrong_budget: 3,
        wrong_probability: 0.3,
        think_time_min_ms: 200,
        think_time_max_ms: 800,
        inter_round_pause_ms: 800,
        max_rounds: Some(5),
        ..Default::default()
    };

    let supervisor = match RoundSupervisor::new(config, Arc::new(ConsoleSink::new())) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return;
        }
    };

    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    match supervisor.run(shutdown_rx).await {
        Ok(stats) => {
            println!("\n📊 {} rounds: {} won, {} exhausted", stats.rounds, stats.won, stats.exhausted);
            for (student, wins) in stats.wins_by_worker {
                println!("  Student {}: {}", student, wins);
            }
        }
        Err(e) => eprintln!("Quiz failed: {}", e),
    }
}
