//! Game state and core simulation types
//!
//! All state that must be persisted for replay/determinism lives here.

use std::collections::HashSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::question::Equation;
use crate::config::{ConfigError, SessionConfig};
use crate::consts::*;

/// Per-bubble lifecycle. Popped and Escaped are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BubbleState {
    /// In flight, advanced by the tick pass, poppable
    Live,
    /// Tapped by the player
    Popped,
    /// Drifted past the top of the screen
    Escaped,
}

/// A floating answer target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: u32,
    /// Candidate answer shown on the bubble
    pub value: i64,
    pub is_correct: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Index within the round's spawn sequence (stable iteration order)
    pub spawn_order: u32,
    pub state: BubbleState,
}

impl Bubble {
    pub fn new(id: u32, spawn_order: u32, value: i64, is_correct: bool) -> Self {
        Self {
            id,
            value,
            is_correct,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BUBBLE_RADIUS,
            spawn_order,
            state: BubbleState::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        self.state == BubbleState::Live
    }
}

/// Phase of the round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Next question not yet seeded into the field
    #[default]
    Spawning,
    /// Bubbles in flight, input accepted
    Live,
    /// Answer locked in, feedback delay running, input ignored
    Resolving,
    /// Counter bookkeeping before the next round starts
    Advancing,
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Correct,
    Incorrect,
}

/// Transient per-question bookkeeping
///
/// Replaced wholesale at round advance; bubbles never survive a round
/// boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundState {
    pub equation: Equation,
    pub bubbles: Vec<Bubble>,
    pub phase: RoundPhase,
    /// Set when the round enters Resolving
    pub outcome: Option<RoundOutcome>,
    /// Feedback delay remaining, counted down while Resolving
    pub resolve_ticks: u32,
    /// Bubbles whose escape has already been reported this round
    pub escaped_ids: HashSet<u32>,
}

/// Session status, transitions Active -> Ended exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Ended,
}

/// Events staged for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoundStarted { question: String },
    Popped { id: u32, correct: bool },
    Escaped { id: u32 },
    /// Correct/incorrect feedback hook, fired on entry to Resolving
    RoundResolved { outcome: RoundOutcome },
    SessionEnded { report: SessionReport },
}

/// Hand-off summary for the persistence/reward collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub final_score: u32,
    pub question_count: u32,
    pub correct_count: u32,
    /// correct_count / question_count, 0 when no question finished
    pub accuracy: f32,
    pub elapsed_secs: f32,
}

/// Draw data for one bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub value: i64,
    /// Palette index for the renderer (spawn slot)
    pub color_hint: u32,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generator for one round's content, keyed off the session seed so a
    /// given seed replays the same questions run after run
    pub fn round_rng(&self, round_index: u32) -> Pcg32 {
        let stream = (round_index as u64).wrapping_mul(2654435761);
        Pcg32::seed_from_u64(self.seed.wrapping_add(stream))
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// RNG state
    pub rng_state: RngState,
    /// Countdown seconds remaining
    pub time_remaining: u32,
    /// Difficulty parameters, validated at construction
    pub config: SessionConfig,
    /// Score, floored at zero by saturating arithmetic
    pub score: u32,
    /// Rounds finished (correct or not)
    pub question_count: u32,
    /// Rounds finished by popping the right bubble
    pub correct_count: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub status: SessionStatus,
    /// The one round in flight; replaced wholesale on advance
    pub round: RoundState,
    /// Staged events (not gameplay-affecting, skipped by serde)
    #[serde(skip)]
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a session. Validates the config and seeds the first round,
    /// so any generation failure surfaces here rather than mid-game.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut state = Self {
            seed,
            rng_state: RngState::new(seed),
            time_remaining: config.time_limit_secs,
            config,
            score: 0,
            question_count: 0,
            correct_count: 0,
            time_ticks: 0,
            status: SessionStatus::Active,
            round: RoundState::default(),
            events: Vec::new(),
            next_id: 1,
        };
        super::tick::spawn_round(&mut state)?;
        Ok(state)
    }

    /// Allocate a new entity ID
    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take everything staged since the last drain, in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ordered draw list for the rendering layer (live bubbles only,
    /// spawn order preserved)
    pub fn snapshot(&self) -> Vec<BubbleSnapshot> {
        self.round
            .bubbles
            .iter()
            .filter(|b| b.is_live())
            .map(|b| BubbleSnapshot {
                id: b.id,
                x: b.pos.x,
                y: b.pos.y,
                radius: b.radius,
                value: b.value,
                color_hint: b.spawn_order,
            })
            .collect()
    }

    /// Summary of the session so far
    pub fn report(&self) -> SessionReport {
        let accuracy = if self.question_count == 0 {
            0.0
        } else {
            self.correct_count as f32 / self.question_count as f32
        };
        SessionReport {
            final_score: self.score,
            question_count: self.question_count,
            correct_count: self.correct_count,
            accuracy,
            elapsed_secs: self.time_ticks as f32 * SIM_DT,
        }
    }
}
