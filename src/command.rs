//! Typed input commands and their text-record wire grammar.
//!
//! The input channel carries UTF-8 records of the form
//! `TYPE|field|field...`. Records are parsed into [`InputCommand`]
//! at the channel boundary so the rest of the system never handles
//! raw text. Field count and types must exactly match the command's
//! arity; anything else is a malformed-command error, which drops
//! the record without ending the channel.
//!
//! | Record                        | Variant       |
//! |-------------------------------|---------------|
//! | `MOUSE_MOVE\|x\|y`            | `MouseMove`   |
//! | `MOUSE_DOWN\|button\|x\|y`    | `MouseDown`   |
//! | `MOUSE_UP\|button\|x\|y`      | `MouseUp`     |
//! | `MOUSE_CLICK\|button\|x\|y`   | `MouseClick`  |
//! | `MOUSE_SCROLL\|clicks`        | `MouseScroll` |
//! | `KEY_DOWN\|keyname`           | `KeyDown`     |
//! | `KEY_UP\|keyname`             | `KeyUp`       |

use crate::error::SpyglassError;

// ── MouseButton ──────────────────────────────────────────────────

/// Mouse button named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Wire name of the button.
    pub const fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }

    fn parse(s: &str) -> Result<Self, SpyglassError> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(SpyglassError::MalformedCommand(format!(
                "unknown mouse button {other:?}"
            ))),
        }
    }
}

// ── InputCommand ─────────────────────────────────────────────────

/// A single remote-control input command.
///
/// Coordinates are absolute positions in the *server* screen space.
/// Positive scroll clicks move away from the user. Key names are
/// canonical lowercase identifiers (`a`, `enter`, `f5`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    MouseMove { x: i32, y: i32 },
    MouseDown { button: MouseButton, x: i32, y: i32 },
    MouseUp { button: MouseButton, x: i32, y: i32 },
    MouseClick { button: MouseButton, x: i32, y: i32 },
    MouseScroll { clicks: i32 },
    KeyDown { key: String },
    KeyUp { key: String },
}

impl InputCommand {
    /// Parse a wire record from raw channel bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, SpyglassError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SpyglassError::MalformedCommand(format!("invalid utf-8: {e}")))?;
        Self::parse(text)
    }

    /// Parse a `TYPE|field|field...` record.
    pub fn parse(record: &str) -> Result<Self, SpyglassError> {
        let parts: Vec<&str> = record.split('|').collect();
        match (parts[0], parts.len()) {
            ("MOUSE_MOVE", 3) => Ok(InputCommand::MouseMove {
                x: parse_int(parts[1])?,
                y: parse_int(parts[2])?,
            }),
            ("MOUSE_DOWN", 4) => Ok(InputCommand::MouseDown {
                button: MouseButton::parse(parts[1])?,
                x: parse_int(parts[2])?,
                y: parse_int(parts[3])?,
            }),
            ("MOUSE_UP", 4) => Ok(InputCommand::MouseUp {
                button: MouseButton::parse(parts[1])?,
                x: parse_int(parts[2])?,
                y: parse_int(parts[3])?,
            }),
            ("MOUSE_CLICK", 4) => Ok(InputCommand::MouseClick {
                button: MouseButton::parse(parts[1])?,
                x: parse_int(parts[2])?,
                y: parse_int(parts[3])?,
            }),
            ("MOUSE_SCROLL", 2) => Ok(InputCommand::MouseScroll {
                clicks: parse_int(parts[1])?,
            }),
            ("KEY_DOWN", 2) => Ok(InputCommand::KeyDown {
                key: parts[1].to_string(),
            }),
            ("KEY_UP", 2) => Ok(InputCommand::KeyUp {
                key: parts[1].to_string(),
            }),
            (kind, arity) => Err(SpyglassError::MalformedCommand(format!(
                "unrecognised record {kind:?} with {arity} fields"
            ))),
        }
    }

    /// Encode back to the wire record grammar.
    pub fn encode(&self) -> String {
        match self {
            InputCommand::MouseMove { x, y } => format!("MOUSE_MOVE|{x}|{y}"),
            InputCommand::MouseDown { button, x, y } => {
                format!("MOUSE_DOWN|{}|{x}|{y}", button.as_str())
            }
            InputCommand::MouseUp { button, x, y } => {
                format!("MOUSE_UP|{}|{x}|{y}", button.as_str())
            }
            InputCommand::MouseClick { button, x, y } => {
                format!("MOUSE_CLICK|{}|{x}|{y}", button.as_str())
            }
            InputCommand::MouseScroll { clicks } => format!("MOUSE_SCROLL|{clicks}"),
            InputCommand::KeyDown { key } => format!("KEY_DOWN|{key}"),
            InputCommand::KeyUp { key } => format!("KEY_UP|{key}"),
        }
    }
}

fn parse_int(field: &str) -> Result<i32, SpyglassError> {
    field
        .parse::<i32>()
        .map_err(|_| SpyglassError::MalformedCommand(format!("non-integer field {field:?}")))
}

// ── Tests ────────────────────────────────────────────────────────
