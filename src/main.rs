//! Bubble Pop entry point
//!
//! Headless demo: runs a few sessions with a scripted auto-player at the
//! fixed timestep, logs round events, and prints each session report as
//! JSON plus the best score at the end.

use bubble_pop::consts::*;
use bubble_pop::sim::{GameEvent, GameState, RoundPhase, SessionStatus, TickInput, tick};
use bubble_pop::{Difficulty, Scoreboard, SessionConfig};

/// Scripted player: taps the correct bubble once it drifts onto screen.
/// Every third round it fumbles instead, tapping a distractor and letting
/// the answer get away, so escapes and penalties show up in the demo.
struct AutoPlayer {
    acted_round: Option<u32>,
}

impl AutoPlayer {
    fn new() -> Self {
        Self { acted_round: None }
    }

    fn choose(&mut self, state: &GameState) -> Option<u32> {
        if state.round.phase != RoundPhase::Live {
            return None;
        }
        let round = state.question_count;
        if self.acted_round == Some(round) {
            return None;
        }

        let fumble = round % 3 == 2;
        let target = state.round.bubbles.iter().find(|b| {
            b.is_live()
                && b.is_correct != fumble
                && b.pos.y > 0.0
                && b.pos.y < FIELD_HEIGHT * 0.6
        })?;
        self.acted_round = Some(round);
        Some(target.id)
    }
}

fn run_session(difficulty: Difficulty, seed: u64) -> Option<bubble_pop::sim::SessionReport> {
    let config = SessionConfig::for_difficulty(difficulty);
    let mut state = match GameState::new(config, seed) {
        Ok(state) => state,
        Err(err) => {
            log::error!("refusing to start session: {err}");
            return None;
        }
    };

    let mut player = AutoPlayer::new();
    let mut input = TickInput::default();
    while state.status == SessionStatus::Active {
        tick(&mut state, &input, SIM_DT);
        input = TickInput::default();

        for event in state.drain_events() {
            match event {
                GameEvent::RoundStarted { question } => log::info!("Q: {question} = ?"),
                GameEvent::Popped { id, correct } => {
                    log::debug!("popped bubble {id} (correct: {correct})");
                }
                GameEvent::Escaped { id } => log::info!("bubble {id} got away"),
                GameEvent::RoundResolved { outcome } => {
                    log::debug!("round resolved: {outcome:?}");
                }
                GameEvent::SessionEnded { report } => {
                    log::info!(
                        "session over: score {}, {}/{} correct",
                        report.final_score,
                        report.correct_count,
                        report.question_count
                    );
                }
            }
        }

        input.pop = player.choose(&state);
    }

    Some(state.report())
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();
    let base_seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xB0BB1E);

    let mut board = Scoreboard::new();
    for session in 0..3u64 {
        let seed = base_seed.wrapping_add(session);
        log::info!(
            "session {}/3: {} difficulty, seed {seed:#x}",
            session + 1,
            difficulty.as_str()
        );

        let Some(report) = run_session(difficulty, seed) else {
            std::process::exit(1);
        };

        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("report serialization failed: {err}"),
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0);
        board.record(&report, timestamp);
    }

    if let Some(top) = board.top_score() {
        log::info!("best of {} sessions: {top}", board.entries.len());
    }
}
