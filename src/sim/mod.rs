//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG and seed-keyed hashing only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod question;
pub mod state;
pub mod tick;

pub use collision::{Contact, circle_contact, resolve_pair, wall_bounce};
pub use question::{
    Equation, Operator, QuestionError, generate_distractors, generate_equation,
};
pub use state::{
    Bubble, BubbleSnapshot, BubbleState, GameEvent, GameState, RngState, RoundOutcome,
    RoundPhase, RoundState, SessionReport, SessionStatus,
};
pub use tick::{TickInput, tick};
