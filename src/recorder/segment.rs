//! Timed motion primitives

use crate::drivers::motor::{DriveCommand, Rotation};

/// Kind of motion primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveKind {
    /// Stationary (sensor settling)
    #[default]
    Idle,
    /// Turning in the given sense
    Turn(Rotation),
    /// Straight forward creep
    Forward,
}

impl MoveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveKind::Idle => "idle",
            MoveKind::Turn(Rotation::Clockwise) => "turn-cw",
            MoveKind::Turn(Rotation::CounterClockwise) => "turn-ccw",
            MoveKind::Forward => "forward",
        }
    }
}

/// One uninterrupted motion primitive and how long it ran
///
/// `duration` counts ticks up while the segment is recorded and back down
/// toward zero while it is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveSegment {
    pub kind: MoveKind,
    /// Wheel command issued while recording; replay drives its inverse
    pub drive: DriveCommand,
    /// Signed tick count
    pub duration: i32,
}

impl MoveSegment {
    /// Fresh zero-duration segment
    pub fn new(kind: MoveKind, drive: DriveCommand) -> Self {
        Self {
            kind,
            drive,
            duration: 0,
        }
    }

    /// Command that retraces this segment
    pub fn undo_command(&self) -> DriveCommand {
        self.drive.inverted()
    }
}
