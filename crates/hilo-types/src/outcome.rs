//! The revealed three-dice result of a round.
//!
//! The engine never generates outcomes: an operator supplies them with the
//! resolve command, and [`Outcome`] only guarantees the shape is valid
//! (exactly three faces, each 1–6).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{HiloError, Result, constants};

/// Three dice faces in the order they were announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Outcome([u8; constants::DICE_PER_OUTCOME]);

impl Outcome {
    /// Build an outcome from three faces.
    ///
    /// # Errors
    /// Returns `InvalidOutcome` if any face is outside 1–6.
    pub fn new(dice: [u8; 3]) -> Result<Self> {
        if let Some(bad) = dice
            .iter()
            .find(|d| !(constants::DIE_MIN..=constants::DIE_MAX).contains(d))
        {
            return Err(HiloError::InvalidOutcome {
                reason: format!("die face {bad} is not in 1-6"),
            });
        }
        Ok(Self(dice))
    }

    /// Random outcome for tests and simulations.
    #[cfg(feature = "test-helpers")]
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self([
            rng.gen_range(constants::DIE_MIN..=constants::DIE_MAX),
            rng.gen_range(constants::DIE_MIN..=constants::DIE_MAX),
            rng.gen_range(constants::DIE_MIN..=constants::DIE_MAX),
        ])
    }

    #[must_use]
    pub fn dice(&self) -> [u8; 3] {
        self.0
    }

    /// Faces in ascending order.
    #[must_use]
    pub fn sorted(&self) -> [u8; 3] {
        let mut dice = self.0;
        dice.sort_unstable();
        dice
    }

    #[must_use]
    pub fn sum(&self) -> u8 {
        self.0.iter().sum()
    }

    #[must_use]
    pub fn is_triple(&self) -> bool {
        self.0[0] == self.0[1] && self.0[1] == self.0[2]
    }

    /// How many dice show `face`.
    #[must_use]
    pub fn count(&self, face: u8) -> usize {
        self.0.iter().filter(|&&d| d == face).count()
    }

    #[must_use]
    pub fn contains(&self, face: u8) -> bool {
        self.0.contains(&face)
    }

    /// Fan-tan style "bean": the sum modulo 4, with 0 shown as 4.
    #[must_use]
    pub fn bean(&self) -> u8 {
        match self.sum() % 4 {
            0 => 4,
            rem => rem,
        }
    }

    /// Table score: 4 when any die shows the red one, otherwise 3.
    #[must_use]
    pub fn score(&self) -> u8 {
        if self.contains(1) { 4 } else { 3 }
    }
}

impl FromStr for Outcome {
    type Err = HiloError;

    fn from_str(s: &str) -> Result<Self> {
        let faces: Vec<u8> = s
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .and_then(|d| u8::try_from(d).ok())
                    .ok_or_else(|| HiloError::InvalidOutcome {
                        reason: format!("{s:?} contains a non-digit"),
                    })
            })
            .collect::<Result<_>>()?;
        let dice: [u8; 3] = faces.try_into().map_err(|_| HiloError::InvalidOutcome {
            reason: format!("{s:?} is not exactly three dice"),
        })?;
        Self::new(dice)
    }
}

impl TryFrom<String> for Outcome {
    type Error = HiloError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}
