//! Motor capability
//!
//! The navigator speaks in [`DriveCommand`]s: a direction and a 0-100 speed
//! for each side of the differential drive. Hardware or simulation sits
//! behind [`MotorDriver`].

use crate::error::Result;

/// Maximum wheel speed value
pub const MAX_WHEEL_SPEED: u8 = 100;

/// Wheel rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Opposite direction
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// +1 for forward, -1 for reverse
    #[inline]
    pub fn sign(self) -> i16 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Rotational sense seen from above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// One side of the drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelCommand {
    pub direction: Direction,
    /// 0-100
    pub speed: u8,
}

impl WheelCommand {
    pub const STOPPED: Self = Self {
        direction: Direction::Forward,
        speed: 0,
    };

    /// Speed is clamped to 100; a stopped wheel always reads as forward
    pub fn new(direction: Direction, speed: u8) -> Self {
        match speed.min(MAX_WHEEL_SPEED) {
            0 => Self::STOPPED,
            speed => Self { direction, speed },
        }
    }

    /// Speed with the direction folded into the sign (-100..=100)
    #[inline]
    pub fn signed_speed(&self) -> i16 {
        self.direction.sign() * self.speed as i16
    }
}

/// Command for both sides of the differential drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    pub left: WheelCommand,
    pub right: WheelCommand,
}

impl DriveCommand {
    pub const STOP: Self = Self {
        left: WheelCommand::STOPPED,
        right: WheelCommand::STOPPED,
    };

    /// Both wheels forward at the same speed
    pub fn forward(speed: u8) -> Self {
        Self {
            left: WheelCommand::new(Direction::Forward, speed),
            right: WheelCommand::new(Direction::Forward, speed),
        }
    }

    /// Spin in place
    pub fn spin(rotation: Rotation, speed: u8) -> Self {
        Self::arc(rotation, speed, speed)
    }

    /// Counter-rotating wheels at different speeds.
    ///
    /// With `outer > inner` the robot turns while creeping forward.
    pub fn arc(rotation: Rotation, outer: u8, inner: u8) -> Self {
        match rotation {
            Rotation::Clockwise => Self {
                left: WheelCommand::new(Direction::Forward, outer),
                right: WheelCommand::new(Direction::Reverse, inner),
            },
            Rotation::CounterClockwise => Self {
                left: WheelCommand::new(Direction::Reverse, inner),
                right: WheelCommand::new(Direction::Forward, outer),
            },
        }
    }

    /// Kinematic inverse: every wheel runs backwards at the same speed.
    ///
    /// Driving the inverse for the same time retraces the motion, undoing
    /// translation and rotation together.
    pub fn inverted(&self) -> Self {
        Self {
            left: WheelCommand::new(self.left.direction.flipped(), self.left.speed),
            right: WheelCommand::new(self.right.direction.flipped(), self.right.speed),
        }
    }

    /// True when neither wheel turns
    pub fn is_stopped(&self) -> bool {
        self.left.speed == 0 && self.right.speed == 0
    }

    /// Net rotational sense, `None` for straight motion or stop
    pub fn rotation(&self) -> Option<Rotation> {
        let left = self.left.signed_speed();
        let right = self.right.signed_speed();
        match left.cmp(&right) {
            std::cmp::Ordering::Greater => Some(Rotation::Clockwise),
            std::cmp::Ordering::Less => Some(Rotation::CounterClockwise),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Motor controller driver trait
pub trait MotorDriver: Send {
    /// Apply a command to both sides
    fn drive(&mut self, command: DriveCommand) -> Result<()>;

    /// Stop both sides
    fn stop(&mut self) -> Result<()> {
        self.drive(DriveCommand::STOP)
    }
}

impl<M: MotorDriver + ?Sized> MotorDriver for Box<M> {
    fn drive(&mut self, command: DriveCommand) -> Result<()> {
        (**self).drive(command)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}
