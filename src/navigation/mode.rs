//! Robot mission mode

use crate::error::{Error, Result};

/// Mission mode.
///
/// Stored as a raw byte in the shared tick state; decoding a byte outside
/// this set is a fatal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RobotMode {
    /// Sweeping for the beacon
    Search = 0,
    /// Driving toward the beacon
    Approach = 1,
    /// Replaying the move log in reverse
    Return = 2,
    /// Home; waiting for operator reset
    Done = 3,
}

impl RobotMode {
    /// Decode a raw mode byte
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(RobotMode::Search),
            1 => Ok(RobotMode::Approach),
            2 => Ok(RobotMode::Return),
            3 => Ok(RobotMode::Done),
            other => Err(Error::InvalidMode(other)),
        }
    }

    #[inline]
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Modes in which ticks add to the active segment
    #[inline]
    pub fn is_recording(self) -> bool {
        matches!(self, RobotMode::Search | RobotMode::Approach)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotMode::Search => "SEARCH",
            RobotMode::Approach => "APPROACH",
            RobotMode::Return => "RETURN",
            RobotMode::Done => "DONE",
        }
    }

    /// Text shown on the status display
    pub fn status_text(&self) -> &'static str {
        match self {
            RobotMode::Search => "SEARCHING",
            RobotMode::Approach => "APPROACHING",
            RobotMode::Return => "RETURNING",
            RobotMode::Done => "DONE",
        }
    }
}

impl TryFrom<u8> for RobotMode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl std::fmt::Display for RobotMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
