//! Differential drive kinematics for the simulated chassis

use crate::drivers::motor::{DriveCommand, WheelCommand, MAX_WHEEL_SPEED};
use std::f32::consts::{PI, TAU};

/// Robot pose in the world frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Meters
    pub x: f32,
    /// Meters
    pub y: f32,
    /// Radians, CCW from +X, in [-π, π)
    pub theta: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (x - self.x).hypot(y - self.y)
    }

    /// Angle of the point relative to the heading; positive means to the left
    pub fn bearing_to(&self, x: f32, y: f32) -> f32 {
        normalize_angle((y - self.y).atan2(x - self.x) - self.theta)
    }

    /// Advance by `dt` seconds at the given wheel surface speeds (m/s).
    ///
    /// v = (v_r + v_l) / 2, ω = (v_r - v_l) / wheel_base
    pub fn integrate(&mut self, left: f32, right: f32, wheel_base: f32, dt: f32) {
        let linear = (right + left) / 2.0;
        let angular = (right - left) / wheel_base;

        if angular.abs() < 1e-6 {
            self.x += linear * self.theta.cos() * dt;
            self.y += linear * self.theta.sin() * dt;
        } else {
            let r = linear / angular;
            let theta = self.theta + angular * dt;
            self.x += r * (theta.sin() - self.theta.sin());
            self.y += r * (self.theta.cos() - theta.cos());
            self.theta = normalize_angle(theta);
        }
    }
}

/// Surface speed of one wheel (m/s)
fn wheel_speed(wheel: WheelCommand, max_speed: f32) -> f32 {
    f32::from(wheel.signed_speed()) / f32::from(MAX_WHEEL_SPEED) * max_speed
}

/// Left and right surface speeds for a drive command
pub fn wheel_speeds(command: DriveCommand, max_speed: f32) -> (f32, f32) {
    (
        wheel_speed(command.left, max_speed),
        wheel_speed(command.right, max_speed),
    )
}

/// Normalize angle to [-π, π)
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a >= PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}
