//! Bubble Pop - an arcade arithmetic game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, rounds, scoring)
//! - `config`: Difficulty tiers and session configuration
//! - `scoreboard`: In-memory leaderboard of finished sessions
//!
//! Rendering, audio and persistence are external collaborators: they
//! consume the per-tick snapshot and the drained event stream, and never
//! reach into simulation state directly.

pub mod config;
pub mod scoreboard;
pub mod sim;

pub use config::{ConfigError, Difficulty, SessionConfig};
pub use scoreboard::Scoreboard;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Physics ticks per countdown second
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Field dimensions in screen-space units (y grows downward)
    pub const FIELD_WIDTH: f32 = 360.0;
    pub const FIELD_HEIGHT: f32 = 640.0;
    /// Extra clearance between a bubble edge and the side walls
    pub const WALL_PADDING: f32 = 4.0;
    /// A bubble has escaped once its center rises above this y
    pub const ESCAPE_Y: f32 = -80.0;

    /// Bubble defaults
    pub const BUBBLE_RADIUS: f32 = 40.0;
    /// Vertical gap between consecutive spawn slots below the screen
    pub const SPAWN_STAGGER: f32 = 90.0;
    /// Initial upward drift at spawn
    pub const SPAWN_RISE_SPEED: f32 = -40.0;

    /// Constant lift acceleration (negative y is up)
    pub const LIFT_ACCEL: f32 = -18.0;
    /// Amplitude of the per-tick horizontal wobble
    pub const JITTER_ACCEL: f32 = 30.0;
    /// Per-tick damping, horizontal jitter dies faster than vertical drift
    pub const DAMPING_X: f32 = 0.98;
    pub const DAMPING_Y: f32 = 0.995;
    /// Per-component speed clamp
    pub const MAX_SPEED: f32 = 140.0;
    /// Energy kept after a side-wall bounce
    pub const WALL_RESTITUTION: f32 = 0.8;
    /// Bubble-bubble restitution. Deliberately above 1: the source game
    /// was tuned super-elastic to keep the field visibly bouncy.
    pub const BOUNCE_RESTITUTION: f32 = 1.05;
    /// Contact slack added to the sum of radii when testing pairs
    pub const CONTACT_BUFFER: f32 = 2.0;

    /// Hard cap on bubbles per round
    pub const MAX_BUBBLES: usize = 8;

    /// Scoring
    pub const CORRECT_POINTS: u32 = 10;
    pub const WRONG_POP_PENALTY: u32 = 5;
    pub const ESCAPE_PENALTY: u32 = 5;

    /// Feedback pause after a round resolves, in ticks (0.75 s)
    pub const RESOLVE_DELAY_TICKS: u32 = 45;
}
