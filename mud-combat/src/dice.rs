//! Dice rolling.
//!
//! Supports standard dice notation (`XdY+Z`, `2d4+1d6-1`, flat numbers),
//! inclusive integer ranges and uniform fractional draws. All randomness in
//! the combat pipeline flows through the [`DiceRoller`] trait so rounds can
//! be replayed with a seeded or scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing and rolling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Invalid range: {min}..={max}")]
    InvalidRange { min: i32, max: i32 },
    #[error("Dice expression out of range: {0}")]
    OutOfRange(String),
}

/// A group of identical dice, e.g. the `3d6` in `3d6+2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub count: u32,
    pub sides: u32,
    /// `-1` when the group is subtracted (`1d8-1d4`).
    pub sign: i32,
}

/// A complete dice expression (e.g., 2d6+3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub terms: Vec<DiceTerm>,
    pub modifier: i32,
    pub original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut terms = Vec::new();
        let mut modifier: i64 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;
        let mut saw_operand = false;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_term(&current, sign, &mut terms, &mut modifier)?;
                        current.clear();
                        saw_operand = true;
                    } else if saw_operand {
                        // "1d6+-2" and friends
                        return Err(DiceError::InvalidNotation(notation.clone()));
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if current.is_empty() {
            // Trailing operator or nothing but signs.
            return Err(DiceError::InvalidNotation(notation));
        }
        Self::parse_term(&current, sign, &mut terms, &mut modifier)?;

        // Every partial sum of a roll stays within i32 as long as the total
        // magnitude does.
        let magnitude = terms
            .iter()
            .try_fold(modifier.unsigned_abs(), |acc, t| {
                (t.count as u64)
                    .checked_mul(t.sides as u64)
                    .and_then(|m| acc.checked_add(m))
            })
            .filter(|&m| m <= i32::MAX as u64);
        if magnitude.is_none() {
            return Err(DiceError::OutOfRange(notation));
        }

        Ok(DiceExpression {
            terms,
            modifier: modifier as i32,
            original: notation,
        })
    }

    fn parse_term(
        s: &str,
        sign: i32,
        terms: &mut Vec<DiceTerm>,
        modifier: &mut i64,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            let count_str = &s[..d_pos];
            let sides_str = &s[d_pos + 1..];

            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };
            let sides: u32 = sides_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            if sides == 0 {
                return Err(DiceError::InvalidDieSize(sides));
            }

            terms.push(DiceTerm { count, sides, sign });
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier = modifier
                .checked_add(sign as i64 * value as i64)
                .ok_or_else(|| DiceError::OutOfRange(s.to_string()))?;
        }

        Ok(())
    }

    /// Smallest total this expression can produce.
    pub fn min_total(&self) -> i32 {
        self.terms
            .iter()
            .map(|t| {
                let n = t.count as i32;
                if t.sign > 0 { n } else { -n * t.sides as i32 }
            })
            .sum::<i32>()
            + self.modifier
    }

    /// Largest total this expression can produce.
    pub fn max_total(&self) -> i32 {
        self.terms
            .iter()
            .map(|t| {
                let n = t.count as i32;
                if t.sign > 0 { n * t.sides as i32 } else { -n }
            })
            .sum::<i32>()
            + self.modifier
    }

    /// Roll with a specific RNG.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> i32 {
        let dice: i32 = self
            .terms
            .iter()
            .map(|t| {
                let subtotal: u32 = (0..t.count).map(|_| rng.gen_range(1..=t.sides)).sum();
                t.sign * subtotal as i32
            })
            .sum();
        dice + self.modifier
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Source of every random draw the combat engine makes.
pub trait DiceRoller {
    /// Roll a parsed dice expression.
    fn roll(&mut self, expression: &DiceExpression) -> i32;

    /// Uniform integer in `min..=max`.
    fn roll_range(&mut self, min: i32, max: i32) -> i32;

    /// Uniform value in `[0, 1)`.
    fn chance(&mut self) -> f64;

    /// Parse and roll a notation string such as `"1d8+3"`.
    fn roll_notation(&mut self, notation: &str) -> Result<i32, DiceError> {
        let expression = DiceExpression::parse(notation)?;
        Ok(self.roll(&expression))
    }

    /// A single d20.
    fn d20(&mut self) -> i32 {
        self.roll_range(1, 20)
    }
}

/// [`DiceRoller`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R = StdRng> {
    rng: R,
}

impl RngDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible rolls for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DiceRoller for RngDice<R> {
    fn roll(&mut self, expression: &DiceExpression) -> i32 {
        expression.roll_with_rng(&mut self.rng)
    }

    fn roll_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn chance(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll(notation: &str) -> Result<i32, DiceError> {
    let expr = DiceExpression::parse(notation)?;
    Ok(expr.roll_with_rng(&mut rand::thread_rng()))
}

/// Roll an inclusive range, rejecting inverted bounds.
pub fn roll_range(min: i32, max: i32) -> Result<i32, DiceError> {
    if max < min {
        return Err(DiceError::InvalidRange { min, max });
    }
    Ok(rand::thread_rng().gen_range(min..=max))
}
