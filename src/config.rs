//! Difficulty tiers and session configuration
//!
//! Validated once at session construction; the simulation never starts
//! from a config that could fail mid-round.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_BUBBLES;
use crate::sim::{Operator, QuestionError};

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Inclusive operand range for generated equations
    pub fn operand_range(&self) -> (i64, i64) {
        match self {
            Difficulty::Easy => (1, 10),
            Difficulty::Medium => (1, 20),
            Difficulty::Hard => (1, 50),
        }
    }

    pub fn operators(&self) -> &'static [Operator] {
        match self {
            Difficulty::Easy => &[Operator::Add, Operator::Subtract],
            Difficulty::Medium | Difficulty::Hard => {
                &[Operator::Add, Operator::Subtract, Operator::Multiply]
            }
        }
    }

    /// Targets on screen per round (one carries the answer)
    pub fn bubble_count(&self) -> usize {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Medium => 5,
            Difficulty::Hard => 6,
        }
    }

    pub fn time_limit_secs(&self) -> u32 {
        match self {
            Difficulty::Easy => 90,
            Difficulty::Medium => 75,
            Difficulty::Hard => 60,
        }
    }

    /// Half-width of the offset window distractors are sampled from
    pub fn distractor_range(&self) -> i64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 30,
        }
    }
}

/// Everything a session needs to generate questions and pace itself
///
/// Supplied externally per tier; custom combinations are allowed as long
/// as `validate` accepts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub min_operand: i64,
    pub max_operand: i64,
    /// Allowed operator set, drawn from uniformly
    pub operators: Vec<Operator>,
    pub bubble_count: usize,
    pub time_limit_secs: u32,
    pub distractor_range: i64,
}

impl SessionConfig {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (min_operand, max_operand) = difficulty.operand_range();
        Self {
            min_operand,
            max_operand,
            operators: difficulty.operators().to_vec(),
            bubble_count: difficulty.bubble_count(),
            time_limit_secs: difficulty.time_limit_secs(),
            distractor_range: difficulty.distractor_range(),
        }
    }

    /// Reject configurations the simulation could not run to completion.
    ///
    /// The distractor check is a pigeonhole bound: the offset window must
    /// seat the needed distinct values with plenty of room, keeping the
    /// rejection-sampling loop's failure odds negligible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_operand < 1 || self.max_operand < self.min_operand {
            return Err(ConfigError::OperandRange {
                min: self.min_operand,
                max: self.max_operand,
            });
        }
        if self.operators.is_empty() {
            return Err(ConfigError::NoOperators);
        }
        if self.bubble_count < 2 || self.bubble_count > MAX_BUBBLES {
            return Err(ConfigError::BubbleCount(self.bubble_count));
        }
        if self.time_limit_secs == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        let needed = self.bubble_count - 1;
        if self.distractor_range < 2 * needed as i64 {
            return Err(ConfigError::DistractorRange {
                range: self.distractor_range,
                needed,
            });
        }
        Ok(())
    }
}

/// Rejected at session construction, before anything is scheduled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid operand range {min}..={max}")]
    OperandRange { min: i64, max: i64 },

    #[error("no operators enabled")]
    NoOperators,

    #[error("unsupported bubble count: {0}")]
    BubbleCount(usize),

    #[error("time limit must be at least one second")]
    ZeroTimeLimit,

    #[error("distractor range {range} too narrow to seat {needed} distinct wrong answers")]
    DistractorRange { range: i64, needed: usize },

    /// First-round generation failed at session start
    #[error("question generation failed: {0}")]
    Question(#[from] QuestionError),
}
