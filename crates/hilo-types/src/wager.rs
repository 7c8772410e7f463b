//! Wager codes.
//!
//! A wager code is the bettor's chosen outcome class, written the way
//! players type it: `H` / `L`, or one to three die faces. Parsing here is
//! purely structural; whether a three-digit non-triple is actually offered
//! depends on the table's special combination and is checked by the payout
//! rules at intake.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{HiloError, Result, constants};

/// A parsed wager code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Wager {
    /// `H`: sum 11–17, triples lose.
    High,
    /// `L`: sum 4–10, triples lose.
    Low,
    /// One face ("teng"); pays by how many dice show it.
    Single(u8),
    /// Two distinct faces ("toad"); both must appear.
    Pair(u8, u8),
    /// Three equal faces ("blow"); the outcome must be that triple.
    Triple(u8),
    /// Three faces that are not all equal, matched irrespective of order.
    Combination([u8; 3]),
}

impl Wager {
    /// Short family name used in logs and summaries.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Single(_) => "single",
            Self::Pair(..) => "pair",
            Self::Triple(_) => "triple",
            Self::Combination(_) => "combination",
        }
    }
}

fn invalid(code: &str) -> HiloError {
    HiloError::InvalidWagerCode {
        code: code.to_string(),
    }
}

impl FromStr for Wager {
    type Err = HiloError;

    fn from_str(code: &str) -> Result<Self> {
        match code {
            "H" => return Ok(Self::High),
            "L" => return Ok(Self::Low),
            _ => {}
        }

        let mut faces = [0u8; 3];
        let mut len = 0;
        for c in code.chars() {
            let face = c
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .filter(|d| (constants::DIE_MIN..=constants::DIE_MAX).contains(d))
                .ok_or_else(|| invalid(code))?;
            if len == faces.len() {
                return Err(invalid(code));
            }
            faces[len] = face;
            len += 1;
        }

        match (len, faces) {
            (1, [a, ..]) => Ok(Self::Single(a)),
            (2, [a, b, _]) if a != b => Ok(Self::Pair(a, b)),
            (3, [a, b, c]) if a == b && b == c => Ok(Self::Triple(a)),
            (3, digits) => Ok(Self::Combination(digits)),
            _ => Err(invalid(code)),
        }
    }
}

impl TryFrom<String> for Wager {
    type Error = HiloError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Wager> for String {
    fn from(wager: Wager) -> Self {
        wager.to_string()
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "H"),
            Self::Low => write!(f, "L"),
            Self::Single(a) => write!(f, "{a}"),
            Self::Pair(a, b) => write!(f, "{a}{b}"),
            Self::Triple(a) => write!(f, "{a}{a}{a}"),
            Self::Combination([a, b, c]) => write!(f, "{a}{b}{c}"),
        }
    }
}
