//! Question generation: equations and the wrong answers around them
//!
//! Each round draws from a `Pcg32` seeded off the session seed and round
//! index, so a fixed seed reproduces the same questions run after run.

use std::collections::HashSet;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;

/// Sampling attempts allowed per requested distractor before the loop is
/// declared stuck
const ATTEMPTS_PER_DISTRACTOR: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
        }
    }

    /// Apply to already-ordered operands
    pub fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
        }
    }
}

/// The question for one round, immutable once generated
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equation {
    /// Display form, e.g. "7 - 3"
    pub text: String,
    pub answer: i64,
    pub operands: (i64, i64),
    pub operator: Operator,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error(
        "distractor sampling stalled after {attempts} attempts \
         (answer {answer}, range {range})"
    )]
    DistractorStarvation {
        answer: i64,
        range: i64,
        attempts: u32,
    },
}

/// Generate one equation for the configured difficulty
///
/// The operator is drawn uniformly from the tier's allowed set, operands
/// uniformly from the tier's range. Subtraction operands are reordered so
/// the answer is never negative.
pub fn generate_equation(rng: &mut Pcg32, config: &SessionConfig) -> Equation {
    let operator = config.operators[rng.random_range(0..config.operators.len())];
    let mut a = rng.random_range(config.min_operand..=config.max_operand);
    let mut b = rng.random_range(config.min_operand..=config.max_operand);
    if operator == Operator::Subtract && b > a {
        std::mem::swap(&mut a, &mut b);
    }
    Equation {
        text: format!("{a} {} {b}", operator.symbol()),
        answer: operator.apply(a, b),
        operands: (a, b),
        operator,
    }
}

/// Sample `count` wrong answers near `correct`
///
/// Rejection sampling over a window of offsets around the correct answer.
/// The window's low end is pulled up to `-correct` so small answers don't
/// waste most draws on candidates that would clamp negative. Candidates
/// are rounded to integers, clamped to `>= 0`, and kept only if distinct
/// from everything picked so far and from the correct answer.
pub fn generate_distractors(
    rng: &mut Pcg32,
    correct: i64,
    count: usize,
    range: i64,
) -> Result<Vec<i64>, QuestionError> {
    let mut picked = Vec::with_capacity(count);
    let mut seen: HashSet<i64> = HashSet::with_capacity(count + 1);
    seen.insert(correct);

    let low = -(range.min(correct)) as f64;
    let high = range as f64;
    let max_attempts = count as u32 * ATTEMPTS_PER_DISTRACTOR;

    let mut attempts = 0;
    while picked.len() < count {
        if attempts >= max_attempts {
            return Err(QuestionError::DistractorStarvation {
                answer: correct,
                range,
                attempts,
            });
        }
        attempts += 1;

        let offset = rng.random_range(low..=high);
        let candidate = ((correct as f64 + offset).round() as i64).max(0);
        if seen.insert(candidate) {
            picked.push(candidate);
        }
    }
    Ok(picked)
}
