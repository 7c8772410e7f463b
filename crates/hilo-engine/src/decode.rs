//! Chat text → [`Command`].
//!
//! This is the outer decoding layer: it turns the short texts players and
//! admins type into typed commands and nothing else. Role discovery is the
//! caller's job.
//!
//! ```text
//! player   C               balance
//!          DL | X          cancel all my bets
//!          <code>/<amt>    bet, e.g. "H/100", "3/50", "12/20", "555/10"
//! admin    O | X           open / close
//!          RESET REFUND BACK
//!          S<ddd>          resolve with the given dice
//!          N/<pct>         loss-side water      NC/<pct>  win-side water
//!          MIN/<n> MAX/<n> FULL/<n>
//!          FREE/<round>    UNFREE/<round>
//!          BLOCK/<id>      toggle block
//!          NM/<id>/<name>  set name
//!          <id>+<n>        <id>-<n>
//!          <id> CR         <id> LL | <id> CX
//! ```
//!
//! Admins fall through to the player commands when no admin command
//! matches, except that an admin "X" always means close.

use hilo_types::{AccountId, Credits, HiloError, Outcome, Result, RoundId};
use rust_decimal::Decimal;

use crate::command::Command;

/// Who sent the text, as established by the messaging layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Admin,
}

/// Decode one chat message.
///
/// Returns `Ok(None)` for text that is not a command at all (ordinary chat).
///
/// # Errors
/// A recognised command with a bad argument: `InvalidOutcome` for `S<ddd>`
/// and `InvalidConfig` for setting values that do not parse.
pub fn decode_text(sender: &AccountId, text: &str, role: Role) -> Result<Option<Command>> {
    let text = text.trim();
    if role == Role::Admin {
        if let Some(command) = decode_admin(text)? {
            return Ok(Some(command));
        }
    }
    Ok(decode_player(sender, text))
}

fn decode_player(sender: &AccountId, text: &str) -> Option<Command> {
    let account = sender.clone();
    match text {
        "C" => return Some(Command::QueryBalance { account }),
        "DL" | "X" => return Some(Command::CancelAll { account }),
        _ => {}
    }
    let (code, amount) = text.split_once('/')?;
    let looks_like_code =
        matches!(code, "H" | "L") || (!code.is_empty() && code.len() <= 3 && is_digits(code));
    if !looks_like_code || !is_digits(amount) {
        return None;
    }
    // An amount too large for Credits cannot be within any stake bound.
    let stake = amount.parse::<Credits>().unwrap_or(Credits::MAX);
    Some(Command::Place {
        account,
        code: code.to_string(),
        stake,
    })
}

fn decode_admin(text: &str) -> Result<Option<Command>> {
    let command = match text {
        "O" => Command::Open,
        "X" => Command::Close,
        "RESET" => Command::Reset,
        "REFUND" => Command::Refund,
        "BACK" => Command::RollbackLast,
        _ => return decode_admin_args(text),
    };
    Ok(Some(command))
}

fn decode_admin_args(text: &str) -> Result<Option<Command>> {
    if let Some(dice) = text.strip_prefix('S') {
        if dice.len() == 3 && is_digits(dice) {
            let outcome: Outcome = dice.parse()?;
            return Ok(Some(Command::Resolve { outcome }));
        }
    }

    if let Some((key, value)) = text.split_once('/') {
        let command = match key {
            "N" => Command::SetWaterLose {
                percent: percent(value)?,
            },
            "NC" => Command::SetWaterWin {
                percent: percent(value)?,
            },
            "MIN" => Command::SetMinStake {
                amount: amount(key, value)?,
            },
            "MAX" => Command::SetMaxStake {
                amount: amount(key, value)?,
            },
            "FULL" => Command::SetPerPersonCap {
                amount: amount(key, value)?,
            },
            "FREE" => Command::AddFreeCommissionRound {
                round: round(value)?,
            },
            "UNFREE" => Command::RemoveFreeCommissionRound {
                round: round(value)?,
            },
            "BLOCK" if is_word(value) => Command::ToggleBlocked {
                account: AccountId::from(value),
            },
            "NM" => match value.split_once('/') {
                Some((id, name)) if !id.is_empty() && !name.is_empty() => Command::SetName {
                    account: AccountId::from(id),
                    name: name.to_string(),
                },
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        return Ok(Some(command));
    }

    for (sign, op) in [(1, '+'), (-1, '-')] {
        if let Some((id, n)) = text.split_once(op) {
            if is_word(id) && is_digits(n) {
                let magnitude = amount("adjustment", n)?;
                return Ok(Some(Command::AdjustCredit {
                    account: AccountId::from(id),
                    delta: sign * magnitude,
                }));
            }
        }
    }

    if let Some((id, suffix)) = text.rsplit_once(' ') {
        let account = AccountId::from(id.trim());
        if !account.as_str().is_empty() {
            match suffix {
                "CR" => return Ok(Some(Command::QueryBalance { account })),
                "LL" | "CX" => return Ok(Some(Command::AccountInfo { account })),
                _ => {}
            }
        }
    }

    Ok(None)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn percent(value: &str) -> Result<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|_| HiloError::InvalidConfig {
            reason: format!("{value:?} is not a percentage"),
        })
}

fn amount(name: &str, value: &str) -> Result<Credits> {
    if !is_digits(value) {
        return Err(HiloError::InvalidConfig {
            reason: format!("{name} value {value:?} is not a whole number"),
        });
    }
    value.parse().map_err(|_| HiloError::InvalidConfig {
        reason: format!("{name} value {value} is too large"),
    })
}

fn round(value: &str) -> Result<RoundId> {
    value
        .parse::<u64>()
        .map(RoundId)
        .map_err(|_| HiloError::InvalidConfig {
            reason: format!("{value:?} is not a round number"),
        })
}
