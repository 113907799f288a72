//! Simulated world: one robot, one beacon
//!
//! Time advances lazily. Every device access first integrates the pose over
//! the wall-clock time since the last access, at the wheel command that was
//! in force during that interval.

use super::config::SimulationConfig;
use super::noise::NoiseGenerator;
use super::physics::{wheel_speeds, Pose};
use crate::beacon::{RfidFrame, TagId};
use crate::drivers::motor::DriveCommand;
use std::time::Instant;

pub struct SimWorld {
    config: SimulationConfig,
    pose: Pose,
    drive: DriveCommand,
    last_update: Instant,
    noise: NoiseGenerator,
    /// Meters covered by the wheels' midpoint since start
    odometer: f32,
}

impl SimWorld {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            pose: Pose::new(config.start_x, config.start_y, config.start_theta),
            drive: DriveCommand::STOP,
            last_update: Instant::now(),
            noise: NoiseGenerator::new(config.random_seed),
            odometer: 0.0,
            config,
        }
    }

    /// Integrate up to now
    pub fn sync(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;
        self.advance(dt);
    }

    /// Integrate `dt` seconds at the current command
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 || self.drive.is_stopped() {
            return;
        }
        let (left, right) = wheel_speeds(self.drive, self.config.max_wheel_speed);
        self.pose
            .integrate(left, right, self.config.wheel_base, dt);
        self.odometer += ((left + right) / 2.0).abs() * dt;
    }

    /// Switch wheel command, closing out the previous one first
    pub fn set_drive(&mut self, drive: DriveCommand) {
        self.sync();
        self.drive = drive;
    }

    pub fn drive(&self) -> DriveCommand {
        self.drive
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn odometer(&self) -> f32 {
        self.odometer
    }

    pub fn beacon_distance(&self) -> f32 {
        self.pose
            .distance_to(self.config.beacon_x, self.config.beacon_y)
    }

    /// True while the tag is inside the RFID read zone
    pub fn in_read_zone(&self) -> bool {
        self.beacon_distance() <= self.config.detect_radius
    }

    /// Noise-free receiver duty for the current pose.
    ///
    /// Bearing maps linearly onto the duty: dead ahead reads `center`, the
    /// left edge of the field of view `center - swing`, the right edge
    /// `center + swing`. No carrier (out of range or out of view) reads 0.
    pub fn ideal_duty(&self, center: f32, swing: f32) -> f32 {
        let c = &self.config;
        if self.beacon_distance() > c.sensor_range {
            return 0.0;
        }
        let bearing = self.pose.bearing_to(c.beacon_x, c.beacon_y);
        if bearing.abs() > c.sensor_half_fov {
            return 0.0;
        }
        center - bearing / c.sensor_half_fov * swing
    }

    /// Receiver sample with noise, in `0..=max`
    pub fn sample_duty(&mut self, center: f32, swing: f32, max: u32) -> u32 {
        let ideal = self.ideal_duty(center, swing);
        let stddev = self.config.sensor_noise_stddev;
        let noisy = ideal + self.noise.gaussian(stddev);
        noisy.round().clamp(0.0, max as f32) as u32
    }

    /// The beacon's frame, corrupted at the configured rate
    pub fn tag_frame(&mut self) -> RfidFrame {
        let frame = RfidFrame::for_tag(TagId(self.config.tag_id));
        if !self.noise.chance(self.config.corrupt_rate) {
            return frame;
        }
        let mut chars = *frame.as_chars();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == b'0' { b'1' } else { b'0' };
        RfidFrame::from_chars(chars)
    }
}
