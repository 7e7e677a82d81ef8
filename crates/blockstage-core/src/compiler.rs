//! Block token compiler.
//!
//! Block tokens are `_`-delimited strings produced by the palette, e.g.
//! `X_10`, `XY_3_4`, `SAY_hello_world_2`. [`compile`] turns an actor's token
//! list into an [`ActionQueue`]. Compilation never fails:
//!
//! - malformed numeric arguments become `0`,
//! - malformed, non-positive or non-finite durations become 1 second,
//! - unknown token types are dropped.
//!
//! | token                 | instruction                     |
//! |-----------------------|---------------------------------|
//! | `X_<n>`, `RIGHT_<n>`  | `Move { dx: n, dy: 0 }`         |
//! | `LEFT_<n>`            | `Move { dx: -n, dy: 0 }`        |
//! | `Y_<n>`               | `Move { dx: 0, dy: n }`         |
//! | `XY_<n1>_<n2>`        | `Move { dx: n1, dy: n2 }`       |
//! | `ROT_<n>`             | `Rotate { d_angle: n }`         |
//! | `ROTLEFT_<n>`         | `Rotate { d_angle: -n }`        |
//! | `REP`                 | `RepeatMarker`                  |
//! | `SAY_<text>_<secs>`   | `Say { text, duration_seconds }`|
//! | `THINK_<text>_<secs>` | `Think { .. }`                  |
//!
//! # Example
//!
//! ```
//! use blockstage_core::compiler::compile;
//! use blockstage_core::instruction::Instruction;
//!
//! let queue = compile(["XY_3_4", "BOGUS_1", "REP"]);
//! assert_eq!(queue.len(), 2);
//! assert_eq!(queue.get(0), Some(&Instruction::Move { dx: 3.0, dy: 4.0 }));
//! assert_eq!(queue.get(1), Some(&Instruction::RepeatMarker));
//! ```

use tracing::debug;

use crate::instruction::{ActionQueue, Instruction};

/// Duration used when a speech token carries no usable duration.
pub const DEFAULT_SPEECH_SECONDS: f64 = 1.0;

/// Compile an ordered token list into a fresh queue.
pub fn compile<I, S>(tokens: I) -> ActionQueue
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let instructions: Vec<Instruction> = tokens
        .into_iter()
        .filter_map(|token| parse_token(token.as_ref()))
        .collect();
    ActionQueue::new(instructions)
}

/// Parse a single token. Returns `None` for unknown token types.
pub fn parse_token(token: &str) -> Option<Instruction> {
    let segments: Vec<&str> = token.trim().split('_').collect();
    let (head, args) = segments.split_first()?;

    let instruction = match *head {
        "X" | "RIGHT" => Instruction::Move {
            dx: number(args, 0),
            dy: 0.0,
        },
        "LEFT" => Instruction::Move {
            dx: -number(args, 0),
            dy: 0.0,
        },
        "Y" => Instruction::Move {
            dx: 0.0,
            dy: number(args, 0),
        },
        "XY" => Instruction::Move {
            dx: number(args, 0),
            dy: number(args, 1),
        },
        "ROT" => Instruction::Rotate {
            d_angle: number(args, 0),
        },
        "ROTLEFT" => Instruction::Rotate {
            d_angle: -number(args, 0),
        },
        "REP" => Instruction::RepeatMarker,
        "SAY" => {
            let (text, duration_seconds) = speech(args);
            Instruction::Say {
                text,
                duration_seconds,
            }
        }
        "THINK" => {
            let (text, duration_seconds) = speech(args);
            Instruction::Think {
                text,
                duration_seconds,
            }
        }
        other => {
            debug!(token, kind = other, "dropping unknown block token");
            return None;
        }
    };
    Some(instruction)
}

/// Describe a raw token the way the palette labels it.
///
/// Unknown tokens are echoed back unchanged.
pub fn describe_token(token: &str) -> String {
    match parse_token(token) {
        Some(instruction) => instruction.to_string(),
        None => token.to_owned(),
    }
}

/// Parse `args[index]` as a finite float, coercing anything else to `0`.
fn number(args: &[&str], index: usize) -> f64 {
    match args.get(index) {
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                debug!(argument = *raw, "non-numeric block argument coerced to 0");
                0.0
            }
        },
        None => 0.0,
    }
}

/// Split speech arguments into `(text, duration)`.
///
/// The last segment is the duration and everything between the head and the
/// duration is the text, re-joined with `_`. A lone argument is taken as text.
fn speech(args: &[&str]) -> (String, f64) {
    match args {
        [] => (String::new(), DEFAULT_SPEECH_SECONDS),
        [text] => ((*text).to_owned(), DEFAULT_SPEECH_SECONDS),
        [text @ .., duration] => (text.join("_"), duration_seconds(duration)),
    }
}

/// Parse a duration, defaulting to [`DEFAULT_SPEECH_SECONDS`].
pub fn duration_seconds(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => {
            debug!(duration = raw, "unusable speech duration, using default");
            DEFAULT_SPEECH_SECONDS
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
