// Wire protocol shared between the kart host driver and the vehicle firmware.
//
// Everything on the UDP control channel is a single ASCII byte: one of the
// five command codes, or the telemetry request. Telemetry replies are ASCII
// percentage text. Commands and the telemetry request never overlap, so the
// two packet kinds are unambiguous on the wire.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Battery telemetry request byte. The vehicle answers with an ASCII
/// percentage, optionally suffixed with `%`.
pub const TELEMETRY_REQUEST: u8 = b'V';

/// Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("telemetry reply is not valid UTF-8")]
    NotUtf8,
    #[error("empty telemetry reply")]
    EmptyReply,
    #[error("malformed battery percentage {reply:?}")]
    MalformedPercentage { reply: String },
}

/// Drive commands understood by the vehicle.
///
/// Commands are level-triggered: each one names the motion state the vehicle
/// should hold, so re-sending the current command is harmless.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Command {
    /// Single-byte code sent over the control channel.
    pub const fn wire_code(self) -> u8 {
        match self {
            Command::Forward => b'F',
            Command::Backward => b'B',
            Command::Left => b'L',
            Command::Right => b'R',
            Command::Stop => b'S',
        }
    }

    /// Inverse of [`Command::wire_code`].
    pub const fn from_wire(byte: u8) -> Option<Command> {
        match byte {
            b'F' => Some(Command::Forward),
            b'B' => Some(Command::Backward),
            b'L' => Some(Command::Left),
            b'R' => Some(Command::Right),
            b'S' => Some(Command::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Forward => "FORWARD",
            Command::Backward => "BACKWARD",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
            Command::Stop => "STOP",
        })
    }
}

/// Validate a telemetry reply and normalize it to a bare percentage string.
///
/// Accepts surrounding whitespace and an optional trailing `%`. The
/// remainder must be an unsigned integer; anything else is rejected so a
/// garbled datagram cannot overwrite a good reading.
pub fn parse_battery_reply(payload: &[u8]) -> Result<String, ProtocolError> {
    let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyReply);
    }
    let percent = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if percent.is_empty() || percent.parse::<u32>().is_err() {
        return Err(ProtocolError::MalformedPercentage {
            reply: trimmed.to_owned(),
        });
    }
    Ok(percent.to_owned())
}
