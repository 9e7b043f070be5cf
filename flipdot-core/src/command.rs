//! Wire command codes.
//!
//! The command byte carries both the payload length class and the
//! refresh flag. Uses a proper enum with `TryFrom`, so unknown codes
//! come back as errors rather than panics.

use std::fmt;

use crate::error::FrameError;

// ── Command ──────────────────────────────────────────────────────

/// The six command codes understood by the panels.
///
/// | Code   | Payload | Refresh |
/// |--------|---------|---------|
/// | `0x81` | 112     | no      |
/// | `0x82` | 112     | yes     |
/// | `0x83` | 28      | no      |
/// | `0x84` | 28      | yes     |
/// | `0x85` | 56      | no      |
/// | `0x86` | 56      | yes     |
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// 112 columns, incremental update.
    Write112 = 0x81,
    /// 112 columns, forced refresh.
    Write112Refresh = 0x82,
    /// 28 columns, incremental update.
    Write28 = 0x83,
    /// 28 columns, forced refresh.
    Write28Refresh = 0x84,
    /// 56 columns, incremental update.
    Write56 = 0x85,
    /// 56 columns, forced refresh.
    Write56Refresh = 0x86,
}

/// Payload lengths with a matching command.
pub const PAYLOAD_LENGTHS: [usize; 3] = [112, 28, 56];

impl Command {
    /// All commands, in code order.
    pub const ALL: [Command; 6] = [
        Command::Write112,
        Command::Write112Refresh,
        Command::Write28,
        Command::Write28Refresh,
        Command::Write56,
        Command::Write56Refresh,
    ];

    /// Select the command for a payload of `len` bytes.
    ///
    /// Returns `None` when no payload class has that length.
    pub fn for_payload(len: usize, refresh: bool) -> Option<Self> {
        let cmd = match (len, refresh) {
            (112, false) => Command::Write112,
            (112, true) => Command::Write112Refresh,
            (28, false) => Command::Write28,
            (28, true) => Command::Write28Refresh,
            (56, false) => Command::Write56,
            (56, true) => Command::Write56Refresh,
            _ => return None,
        };
        Some(cmd)
    }

    /// Number of payload bytes that follow the address byte.
    pub fn payload_len(&self) -> usize {
        match self {
            Command::Write112 | Command::Write112Refresh => 112,
            Command::Write28 | Command::Write28Refresh => 28,
            Command::Write56 | Command::Write56Refresh => 56,
        }
    }

    /// Whether the receiving panel is asked to redraw everything.
    pub fn refresh(&self) -> bool {
        matches!(
            self,
            Command::Write112Refresh | Command::Write28Refresh | Command::Write56Refresh
        )
    }

    /// The raw code.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x81 => Ok(Command::Write112),
            0x82 => Ok(Command::Write112Refresh),
            0x83 => Ok(Command::Write28),
            0x84 => Ok(Command::Write28Refresh),
            0x85 => Ok(Command::Write56),
            0x86 => Ok(Command::Write56Refresh),
            other => Err(FrameError::UnknownCommand(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_roundtrip() {
        for cmd in Command::ALL {
            assert_eq!(Command::try_from(cmd.code()).unwrap(), cmd);
        }
    }

    #[test]
    fn command_invalid() {
        assert_eq!(Command::try_from(0x80), Err(FrameError::UnknownCommand(0x80)));
        assert_eq!(Command::try_from(0x87), Err(FrameError::UnknownCommand(0x87)));
        assert!(Command::try_from(0x00).is_err());
    }

    #[test]
    fn payload_class_table() {
        let table = [
            (0x81, 112, false),
            (0x82, 112, true),
            (0x83, 28, false),
            (0x84, 28, true),
            (0x85, 56, false),
            (0x86, 56, true),
        ];
        for (code, len, refresh) in table {
            let cmd = Command::try_from(code).unwrap();
            assert_eq!(cmd.payload_len(), len);
            assert_eq!(cmd.refresh(), refresh);
            assert_eq!(Command::for_payload(len, refresh), Some(cmd));
        }
    }

    #[test]
    fn no_command_for_odd_lengths() {
        assert_eq!(Command::for_payload(0, true), None);
        assert_eq!(Command::for_payload(27, false), None);
        assert_eq!(Command::for_payload(113, true), None);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Command::Write28Refresh.to_string(), "0x84");
    }
}
