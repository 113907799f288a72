//! Simulated world configuration
//!
//! ```text
//! SimulationConfig
//! ├── random_seed                     # 0 = fresh entropy each run
//! ├── start_x/y/theta                 # Robot start pose
//! ├── beacon_x/y, tag_id              # Where the beacon sits, what it says
//! ├── wheel_base, max_wheel_speed     # Chassis
//! ├── sensor_range, sensor_half_fov   # Receiver geometry
//! ├── sensor_noise_stddev             # Duty-cycle jitter
//! ├── detect_radius, rfid_repeat_ms   # RFID read zone
//! ├── corrupt_rate                    # Fraction of frames with a bad checksum
//! └── missions, reset_delay_ms        # Scripted operator
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Simulated world and device parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Noise seed (0 = non-deterministic)
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Start X position (meters)
    #[serde(default)]
    pub start_x: f32,

    /// Start Y position (meters)
    #[serde(default)]
    pub start_y: f32,

    /// Start heading (radians, CCW from +X)
    #[serde(default)]
    pub start_theta: f32,

    /// Beacon X position (meters)
    #[serde(default = "default_beacon_x")]
    pub beacon_x: f32,

    /// Beacon Y position (meters)
    #[serde(default = "default_beacon_y")]
    pub beacon_y: f32,

    /// Tag ID carried by the beacon (40 bits)
    #[serde(default = "default_tag_id")]
    pub tag_id: u64,

    /// Distance between wheel contact points (meters)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// Wheel surface speed at command speed 100 (m/s)
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed: f32,

    /// Beyond this distance the receiver sees no carrier (meters)
    #[serde(default = "default_sensor_range")]
    pub sensor_range: f32,

    /// Half-width of the receiver's field of view (radians)
    #[serde(default = "default_sensor_half_fov")]
    pub sensor_half_fov: f32,

    /// Duty-cycle noise standard deviation (sample units)
    #[serde(default = "default_sensor_noise_stddev")]
    pub sensor_noise_stddev: f32,

    /// RFID read zone radius around the beacon (meters)
    #[serde(default = "default_detect_radius")]
    pub detect_radius: f32,

    /// Frame repeat interval while the tag stays in the read zone
    #[serde(default = "default_rfid_repeat_ms")]
    pub rfid_repeat_ms: u64,

    /// Probability that an emitted frame carries a bad checksum (0.0-1.0)
    #[serde(default = "default_corrupt_rate")]
    pub corrupt_rate: f32,

    /// Missions to run before the daemon exits (0 = until interrupted)
    #[serde(default = "default_missions")]
    pub missions: u32,

    /// Operator delay between DONE and pressing reset
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
}

fn default_random_seed() -> u64 {
    42
}
fn default_beacon_x() -> f32 {
    1.5
}
fn default_beacon_y() -> f32 {
    0.8
}
fn default_tag_id() -> u64 {
    0x04_15AB_3C9D
}
fn default_wheel_base() -> f32 {
    0.233
}
fn default_max_wheel_speed() -> f32 {
    0.3
}
fn default_sensor_range() -> f32 {
    4.0
}
fn default_sensor_half_fov() -> f32 {
    0.6
}
fn default_sensor_noise_stddev() -> f32 {
    6.0
}
fn default_detect_radius() -> f32 {
    0.2
}
fn default_rfid_repeat_ms() -> u64 {
    250
}
fn default_corrupt_rate() -> f32 {
    0.1
}
fn default_missions() -> u32 {
    1
}
fn default_reset_delay_ms() -> u64 {
    1500
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            random_seed: default_random_seed(),
            start_x: 0.0,
            start_y: 0.0,
            start_theta: 0.0,
            beacon_x: default_beacon_x(),
            beacon_y: default_beacon_y(),
            tag_id: default_tag_id(),
            wheel_base: default_wheel_base(),
            max_wheel_speed: default_max_wheel_speed(),
            sensor_range: default_sensor_range(),
            sensor_half_fov: default_sensor_half_fov(),
            sensor_noise_stddev: default_sensor_noise_stddev(),
            detect_radius: default_detect_radius(),
            rfid_repeat_ms: default_rfid_repeat_ms(),
            corrupt_rate: default_corrupt_rate(),
            missions: default_missions(),
            reset_delay_ms: default_reset_delay_ms(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wheel_base <= 0.0 {
            return Err(Error::Config("simulation.wheel_base must be > 0".into()));
        }
        if self.max_wheel_speed <= 0.0 {
            return Err(Error::Config("simulation.max_wheel_speed must be > 0".into()));
        }
        if self.sensor_half_fov <= 0.0 || self.sensor_half_fov >= std::f32::consts::PI {
            return Err(Error::Config(
                "simulation.sensor_half_fov must be in (0, π)".into(),
            ));
        }
        if self.detect_radius <= 0.0 {
            return Err(Error::Config("simulation.detect_radius must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.corrupt_rate) {
            return Err(Error::Config(
                "simulation.corrupt_rate must be within 0.0-1.0".into(),
            ));
        }
        if self.tag_id >> 40 != 0 {
            return Err(Error::Config("simulation.tag_id must fit in 40 bits".into()));
        }
        Ok(())
    }
}
