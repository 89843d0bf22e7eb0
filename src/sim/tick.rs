//! Fixed timestep simulation tick
//!
//! Advances one session deterministically: the physics pass over the
//! field, input resolution, the round state machine and the countdown all
//! run from here. Ticks never overlap and taps land between them, so a
//! pass always sees a consistent field.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::collision::{circle_contact, resolve_pair, wall_bounce};
use super::question::{QuestionError, generate_distractors, generate_equation};
use super::state::{
    Bubble, BubbleState, GameEvent, GameState, RoundOutcome, RoundPhase, RoundState,
    SessionStatus,
};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Bubble the player tapped this tick, if any
    pub pop: Option<u32>,
    /// End the session immediately
    pub quit: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.status == SessionStatus::Ended {
        return;
    }

    if input.quit {
        end_session(state);
        return;
    }

    state.time_ticks += 1;

    // Countdown runs at 1 Hz off the physics clock
    if state.time_ticks.is_multiple_of(TICKS_PER_SECOND as u64) {
        state.time_remaining = state.time_remaining.saturating_sub(1);
        if state.time_remaining == 0 {
            close_open_round(state);
            end_session(state);
            return;
        }
    }

    // Taps are applied between passes, never mid-pass
    if let Some(id) = input.pop {
        handle_pop(state, id);
    }

    match state.round.phase {
        RoundPhase::Spawning => {
            if let Err(err) = spawn_round(state) {
                // Unreachable with a validated config; stop loudly if not.
                log::error!("round generation failed: {err}");
                end_session(state);
            }
        }
        RoundPhase::Live => {
            physics_pass(state, dt);
            detect_escape(state);
        }
        RoundPhase::Resolving => {
            // Leftover bubbles keep drifting while feedback is shown
            physics_pass(state, dt);
            state.round.resolve_ticks = state.round.resolve_ticks.saturating_sub(1);
            if state.round.resolve_ticks == 0 {
                state.round.phase = RoundPhase::Advancing;
            }
        }
        RoundPhase::Advancing => {
            advance_round(state);
        }
    }
}

/// Seed the field for the next question
///
/// One slot gets the correct answer, the rest get distractors; slots are
/// staggered below the bottom edge so nothing starts overlapped.
pub(crate) fn spawn_round(state: &mut GameState) -> Result<(), QuestionError> {
    let round_index = state.question_count;
    let mut rng = state.rng_state.round_rng(round_index);

    let equation = generate_equation(&mut rng, &state.config);
    let distractors = generate_distractors(
        &mut rng,
        equation.answer,
        state.config.bubble_count - 1,
        state.config.distractor_range,
    )?;

    let correct_slot = rng.random_range(0..state.config.bubble_count);
    let mut values: Vec<(i64, bool)> = distractors.into_iter().map(|v| (v, false)).collect();
    values.insert(correct_slot, (equation.answer, true));

    let min_x = BUBBLE_RADIUS + WALL_PADDING;
    let max_x = FIELD_WIDTH - BUBBLE_RADIUS - WALL_PADDING;

    let mut bubbles = Vec::with_capacity(values.len());
    for (order, (value, is_correct)) in values.into_iter().enumerate() {
        let id = state.next_entity_id();
        let mut bubble = Bubble::new(id, order as u32, value, is_correct);
        bubble.pos = Vec2::new(
            rng.random_range(min_x..=max_x),
            FIELD_HEIGHT + BUBBLE_RADIUS + order as f32 * SPAWN_STAGGER
                + rng.random_range(0.0..=24.0),
        );
        bubble.vel = Vec2::new(rng.random_range(-20.0..=20.0), SPAWN_RISE_SPEED);
        bubbles.push(bubble);
    }

    let question = equation.text.clone();
    log::info!("round {}: {}", round_index + 1, question);
    log::debug!("round {} answer: {}", round_index + 1, equation.answer);

    state.round = RoundState {
        equation,
        bubbles,
        phase: RoundPhase::Live,
        outcome: None,
        resolve_ticks: 0,
        escaped_ids: HashSet::new(),
    };
    state.push_event(GameEvent::RoundStarted { question });
    Ok(())
}

/// Resolve a tap against the field
///
/// Stale taps are absorbed silently: already-popped or escaped bubbles,
/// unknown ids, and anything arriving during the feedback pause are
/// no-ops, since double-taps are expected under real-time input.
fn handle_pop(state: &mut GameState, id: u32) {
    if state.round.phase != RoundPhase::Live {
        return;
    }
    let Some(bubble) = state.round.bubbles.iter_mut().find(|b| b.id == id) else {
        return;
    };
    if bubble.state != BubbleState::Live {
        return;
    }

    bubble.state = BubbleState::Popped;
    let correct = bubble.is_correct;
    state.push_event(GameEvent::Popped { id, correct });

    if correct {
        state.score += CORRECT_POINTS;
        begin_resolving(state, RoundOutcome::Correct);
    } else {
        // Wrong pops cost points but the round stays open for retries
        state.score = state.score.saturating_sub(WRONG_POP_PENALTY);
    }
}

/// One integration pass over the live field, in spawn order
fn physics_pass(state: &mut GameState, dt: f32) {
    let seed = state.seed;
    let tick_no = state.time_ticks;

    for bubble in state.round.bubbles.iter_mut().filter(|b| b.is_live()) {
        // Lift plus a little sideways wobble
        bubble.vel.y += LIFT_ACCEL * dt;
        bubble.vel.x += jitter(seed, tick_no, bubble.id) * JITTER_ACCEL * dt;

        bubble.vel.x *= DAMPING_X;
        bubble.vel.y *= DAMPING_Y;

        bubble.vel.x = bubble.vel.x.clamp(-MAX_SPEED, MAX_SPEED);
        bubble.vel.y = bubble.vel.y.clamp(-MAX_SPEED, MAX_SPEED);

        bubble.pos += bubble.vel * dt;

        wall_bounce(bubble);
    }

    // Pairwise contacts. O(n²), fine for a field capped at MAX_BUBBLES.
    let bubbles = &mut state.round.bubbles;
    for i in 0..bubbles.len() {
        for j in (i + 1)..bubbles.len() {
            let (head, tail) = bubbles.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if !a.is_live() || !b.is_live() {
                continue;
            }
            if let Some(contact) = circle_contact(a.pos, a.radius, b.pos, b.radius) {
                resolve_pair(a, b, contact);
            }
        }
    }
}

/// Deterministic wobble in [-1, 1] keyed on (seed, tick, bubble), so the
/// state stays plain data and a seed replays the exact same flight paths
fn jitter(seed: u64, tick: u64, id: u32) -> f32 {
    let hash = seed
        .wrapping_add(tick.wrapping_mul(2654435761))
        .wrapping_add((id as u64).wrapping_mul(104729))
        .wrapping_mul(2654435761);
    ((hash >> 32) % 2000) as f32 / 1000.0 - 1.0
}

/// Retire bubbles that cleared the top of the screen
///
/// Only the correct bubble's escape is an event (fired once, guarded by
/// `escaped_ids`); distractors leave quietly. Nothing fires while the
/// round is already resolving.
fn detect_escape(state: &mut GameState) {
    let mut escaped_correct = None;
    for bubble in state.round.bubbles.iter_mut() {
        if bubble.is_live() && bubble.pos.y < ESCAPE_Y {
            bubble.state = BubbleState::Escaped;
            if bubble.is_correct && !state.round.escaped_ids.contains(&bubble.id) {
                escaped_correct = Some(bubble.id);
            }
        }
    }

    if let Some(id) = escaped_correct {
        state.round.escaped_ids.insert(id);
        state.push_event(GameEvent::Escaped { id });
        state.score = state.score.saturating_sub(ESCAPE_PENALTY);
        begin_resolving(state, RoundOutcome::Incorrect);
    }
}

/// Lock out input and start the feedback pause
fn begin_resolving(state: &mut GameState, outcome: RoundOutcome) {
    state.round.outcome = Some(outcome);
    state.round.phase = RoundPhase::Resolving;
    state.round.resolve_ticks = RESOLVE_DELAY_TICKS;
    state.push_event(GameEvent::RoundResolved { outcome });
}

/// Close out the resolved round and stage the next one
///
/// The round state is replaced wholesale; bubbles, escape guards and the
/// outcome never carry across the boundary.
fn advance_round(state: &mut GameState) {
    state.question_count += 1;
    if state.round.outcome == Some(RoundOutcome::Correct) {
        state.correct_count += 1;
    }
    log::debug!(
        "advancing: {}/{} correct, score {}",
        state.correct_count,
        state.question_count,
        state.score
    );
    state.round = RoundState::default();
}

/// Charge a round cut short by the countdown
///
/// A live round is treated as an escape without the score penalty; a
/// round already resolving keeps the outcome it earned.
fn close_open_round(state: &mut GameState) {
    match state.round.phase {
        RoundPhase::Live => {
            state.question_count += 1;
        }
        RoundPhase::Resolving | RoundPhase::Advancing => {
            state.question_count += 1;
            if state.round.outcome == Some(RoundOutcome::Correct) {
                state.correct_count += 1;
            }
        }
        RoundPhase::Spawning => {}
    }
}

/// Stop the session and emit the final report exactly once
///
/// All delays in this sim are tick counters, so ending the session here
/// also discards the pending feedback pause; nothing can fire late.
fn end_session(state: &mut GameState) {
    if state.status == SessionStatus::Ended {
        return;
    }
    state.status = SessionStatus::Ended;
    let report = state.report();
    log::info!(
        "session over: score {}, {}/{} correct",
        report.final_score,
        report.correct_count,
        report.question_count
    );
    state.push_event(GameEvent::SessionEnded { report });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, SessionConfig};

    fn new_state() -> GameState {
        GameState::new(SessionConfig::for_difficulty(Difficulty::Easy), 12345).unwrap()
    }

    fn correct_id(state: &GameState) -> u32 {
        state
            .round
            .bubbles
            .iter()
            .find(|b| b.is_correct)
            .map(|b| b.id)
            .unwrap()
    }

    fn wrong_id(state: &GameState) -> u32 {
        state
            .round
            .bubbles
            .iter()
            .find(|b| !b.is_correct)
            .map(|b| b.id)
            .unwrap()
    }

    fn pop(id: u32) -> TickInput {
        TickInput {
            pop: Some(id),
            ..Default::default()
        }
    }

    #[test]
    fn test_pop_correct_awards_and_resolves() {
        let mut state = new_state();
        let id = correct_id(&state);
        state.drain_events();

        tick(&mut state, &pop(id), SIM_DT);

        assert_eq!(state.score, CORRECT_POINTS);
        assert_eq!(state.round.phase, RoundPhase::Resolving);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Popped { id, correct: true }));
        assert!(events.contains(&GameEvent::RoundResolved {
            outcome: RoundOutcome::Correct
        }));
    }

    #[test]
    fn test_pop_wrong_deducts_floored_and_stays_live() {
        let mut state = new_state();
        let id = wrong_id(&state);

        // Score starts at zero; the deduction must floor, not underflow.
        tick(&mut state, &pop(id), SIM_DT);

        assert_eq!(state.score, 0);
        assert_eq!(state.round.phase, RoundPhase::Live);
        assert_eq!(
            state
                .round
                .bubbles
                .iter()
                .find(|b| b.id == id)
                .unwrap()
                .state,
            BubbleState::Popped
        );
    }

    #[test]
    fn test_double_pop_is_one_event_one_deduction() {
        let mut state = new_state();
        let id = wrong_id(&state);
        state.score = 20;
        state.drain_events();

        tick(&mut state, &pop(id), SIM_DT);
        tick(&mut state, &pop(id), SIM_DT);

        assert_eq!(state.score, 20 - WRONG_POP_PENALTY);
        let pops = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Popped { .. }))
            .count();
        assert_eq!(pops, 1);
    }

    #[test]
    fn test_pop_unknown_id_is_noop() {
        let mut state = new_state();
        state.drain_events();
        tick(&mut state, &pop(9999), SIM_DT);
        assert_eq!(state.round.phase, RoundPhase::Live);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Popped { .. }))
        );
    }

    #[test]
    fn test_pop_ignored_while_resolving() {
        let mut state = new_state();
        let first = correct_id(&state);
        tick(&mut state, &pop(first), SIM_DT);
        assert_eq!(state.round.phase, RoundPhase::Resolving);
        state.drain_events();

        let other = wrong_id(&state);
        let score_before = state.score;
        tick(&mut state, &pop(other), SIM_DT);

        assert_eq!(state.score, score_before);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_escape_fires_once_and_resolves() {
        let mut state = new_state();
        state.score = 3;
        state.drain_events();

        let id = correct_id(&state);
        let bubble = state
            .round
            .bubbles
            .iter_mut()
            .find(|b| b.id == id)
            .unwrap();
        bubble.pos.y = ESCAPE_Y - 50.0;

        tick(&mut state, &TickInput::default(), SIM_DT);

        // Penalty of 5 against a score of 3: floored at zero.
        assert_eq!(state.score, 0);
        assert_eq!(state.round.phase, RoundPhase::Resolving);
        assert_eq!(state.round.outcome, Some(RoundOutcome::Incorrect));
        let escapes = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Escaped { .. }))
            .count();
        assert_eq!(escapes, 1);

        // Further ticks must not re-fire for the same bubble.
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Escaped { .. }))
        );
    }

    #[test]
    fn test_distractor_escape_is_silent() {
        let mut state = new_state();
        state.drain_events();

        let id = wrong_id(&state);
        let bubble = state
            .round
            .bubbles
            .iter_mut()
            .find(|b| b.id == id)
            .unwrap();
        bubble.pos.y = ESCAPE_Y - 50.0;

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.round.phase, RoundPhase::Live);
        assert_eq!(state.score, 0);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Escaped { .. }))
        );
        assert_eq!(
            state
                .round
                .bubbles
                .iter()
                .find(|b| b.id == id)
                .unwrap()
                .state,
            BubbleState::Escaped
        );
    }

    #[test]
    fn test_resolving_delay_then_next_round() {
        let mut state = new_state();
        let max_old_id = state.round.bubbles.iter().map(|b| b.id).max().unwrap();
        let id = correct_id(&state);
        tick(&mut state, &pop(id), SIM_DT);

        // Run out the feedback pause, the advance tick, and the respawn.
        for _ in 0..(RESOLVE_DELAY_TICKS + 2) {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        assert_eq!(state.question_count, 1);
        assert_eq!(state.correct_count, 1);
        assert_eq!(state.round.phase, RoundPhase::Live);
        assert_eq!(state.round.bubbles.len(), state.config.bubble_count);
        assert_eq!(
            state.round.bubbles.iter().filter(|b| b.is_correct).count(),
            1
        );
        // Fresh bookkeeping: nothing carries over, all-new entities.
        assert!(state.round.escaped_ids.is_empty());
        assert!(state.round.bubbles.iter().all(|b| b.id > max_old_id));
    }

    #[test]
    fn test_countdown_ends_session_once() {
        let config = SessionConfig {
            time_limit_secs: 1,
            ..SessionConfig::for_difficulty(Difficulty::Easy)
        };
        let mut state = GameState::new(config, 12345).unwrap();
        state.drain_events();

        for _ in 0..TICKS_PER_SECOND {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        assert_eq!(state.status, SessionStatus::Ended);
        let ended: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::SessionEnded { report } => Some(report),
                _ => None,
            })
            .collect();
        assert_eq!(ended.len(), 1);
        // Timed out mid-round: charged as a question, no correct answers.
        assert_eq!(ended[0].question_count, 1);
        assert_eq!(ended[0].accuracy, 0.0);
        assert_eq!(ended[0].final_score, 0);

        // Ticking a dead session is a no-op.
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_quit_ends_immediately() {
        let mut state = new_state();
        state.drain_events();
        let ticks_before = state.time_ticks;

        let input = TickInput {
            quit: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);

        assert_eq!(state.status, SessionStatus::Ended);
        assert_eq!(state.time_ticks, ticks_before);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::SessionEnded { .. }))
        );
    }

    #[test]
    fn test_bubbles_rise_over_time() {
        let mut state = new_state();
        let start_y: Vec<f32> = state.round.bubbles.iter().map(|b| b.pos.y).collect();

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        for (bubble, y0) in state.round.bubbles.iter().zip(start_y) {
            assert!(bubble.pos.y < y0, "bubble {} did not rise", bubble.id);
        }
    }

    #[test]
    fn test_no_lingering_overlap_and_walls_hold() {
        let mut state = new_state();

        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            let live: Vec<&Bubble> =
                state.round.bubbles.iter().filter(|b| b.is_live()).collect();
            for (i, a) in live.iter().enumerate() {
                // Collision pushes run after the wall clamp, so allow a
                // few units of slack at the bounds.
                let min_x = a.radius + WALL_PADDING - 10.0;
                let max_x = FIELD_WIDTH - a.radius - WALL_PADDING + 10.0;
                assert!(a.pos.x >= min_x && a.pos.x <= max_x);
                for b in &live[i + 1..] {
                    let dist = (b.pos - a.pos).length();
                    assert!(
                        dist >= a.radius + b.radius - 5.0,
                        "tick {}: bubbles {} and {} overlap at distance {}",
                        state.time_ticks,
                        a.id,
                        b.id,
                        dist
                    );
                }
            }
        }
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed and inputs must match exactly.
        let config = SessionConfig::for_difficulty(Difficulty::Medium);
        let mut state1 = GameState::new(config.clone(), 99999).unwrap();
        let mut state2 = GameState::new(config, 99999).unwrap();

        let target = correct_id(&state1);
        for step in 0..400u32 {
            let input = if step == 250 {
                pop(target)
            } else {
                TickInput::default()
            };
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.question_count, state2.question_count);
        assert_eq!(state1.round.equation, state2.round.equation);
        assert_eq!(state1.drain_events(), state2.drain_events());
        for (a, b) in state1.round.bubbles.iter().zip(&state2.round.bubbles) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.vel, b.vel);
            assert_eq!(a.state, b.state);
        }
    }
}
