//! Simulated robot for running missions without hardware
//!
//! | Device            | Trait          | Model                                  |
//! |-------------------|----------------|----------------------------------------|
//! | [`SimMotor`]      | `MotorDriver`  | Differential drive kinematics          |
//! | [`SimBeaconSensor`] | `BeaconSensor` | Bearing-encoded duty + Gaussian noise |
//! | [`SimRfid`]       | `Transport`    | RDM6300 frames inside the read zone    |
//! | [`SimOperator`]   | `ResetInput`   | Presses reset a while after DONE       |
//!
//! All devices share one [`SimWorld`] behind a mutex.
//!
//! # Module Structure
//!
//! - [`config`]: world and device parameters
//! - [`physics`]: pose integration
//! - [`world`]: the shared world state
//! - [`noise`]: seeded noise source

pub mod config;
mod noise;
mod physics;
mod world;

pub use config::SimulationConfig;
pub use physics::{normalize_angle, Pose};
pub use world::SimWorld;

use crate::config::SensorConfig;
use crate::drivers::input::ResetInput;
use crate::drivers::motor::{DriveCommand, MotorDriver};
use crate::drivers::sensor::BeaconSensor;
use crate::drivers::transport::Transport;
use crate::error::Result;
use crate::navigation::RobotMode;
use crate::shared::NavShared;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long the RFID transport blocks when it has nothing to send
const RFID_READ_TIMEOUT_MS: u64 = 5;

type SharedWorld = Arc<Mutex<SimWorld>>;

/// Wheel motors of the simulated chassis
#[derive(Clone)]
pub struct SimMotor {
    world: SharedWorld,
}

impl MotorDriver for SimMotor {
    fn drive(&mut self, command: DriveCommand) -> Result<()> {
        let mut world = self.world.lock();
        if world.drive() != command {
            log::trace!("Sim motors: {:?}", command);
        }
        world.set_drive(command);
        Ok(())
    }
}

/// Beacon receiver of the simulated chassis
pub struct SimBeaconSensor {
    world: SharedWorld,
    center: f32,
    swing: f32,
    max: u32,
}

impl BeaconSensor for SimBeaconSensor {
    fn sample(&mut self) -> Result<u32> {
        let mut world = self.world.lock();
        world.sync();
        Ok(world.sample_duty(self.center, self.swing, self.max))
    }
}

/// RFID reader looking at the floor under the robot
pub struct SimRfid {
    world: SharedWorld,
    repeat: Duration,
    last_emit: Option<Instant>,
    was_inside: bool,
}

impl SimRfid {
    fn due(&mut self, inside: bool, now: Instant) -> bool {
        let entered = inside && !self.was_inside;
        self.was_inside = inside;
        if !inside {
            return false;
        }
        entered
            || self
                .last_emit
                .is_none_or(|t| now.duration_since(t) >= self.repeat)
    }
}

impl Transport for SimRfid {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let now = Instant::now();
        let world = Arc::clone(&self.world);
        let frame = {
            let mut world = world.lock();
            world.sync();
            let inside = world.in_read_zone();
            if self.due(inside, now) {
                Some(world.tag_frame())
            } else {
                None
            }
        };

        let Some(frame) = frame else {
            thread::sleep(Duration::from_millis(RFID_READ_TIMEOUT_MS));
            return Ok(0);
        };

        self.last_emit = Some(now);
        let wire = frame.to_wire();
        let n = wire.len().min(buffer.len());
        buffer[..n].copy_from_slice(&wire[..n]);
        Ok(n)
    }
}

/// Operator who reads the display and presses reset once the robot is home
pub struct SimOperator {
    shared: Arc<NavShared>,
    delay: Duration,
    /// Presses still to make
    remaining: u32,
    done_since: Option<Instant>,
}

impl SimOperator {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl ResetInput for SimOperator {
    fn is_asserted(&mut self) -> bool {
        let done = matches!(self.shared.mode(), Ok(RobotMode::Done));
        if !done {
            if self.done_since.take().is_some() {
                self.remaining = self.remaining.saturating_sub(1);
            }
            return false;
        }
        if self.remaining == 0 {
            return false;
        }
        let since = *self.done_since.get_or_insert_with(Instant::now);
        since.elapsed() >= self.delay
    }
}

/// Every simulated device, wired to one world
pub struct SimRig {
    pub world: SharedWorld,
    pub motor: SimMotor,
    pub sensor: SimBeaconSensor,
    pub rfid: SimRfid,
    pub operator: SimOperator,
}

impl SimRig {
    /// Build the world and its devices.
    ///
    /// The receiver model centres "dead ahead" in the classifier's ahead
    /// band and swings to the range edges at the field-of-view limits.
    pub fn new(config: &SimulationConfig, sensor: &SensorConfig, shared: Arc<NavShared>) -> Self {
        let world = Arc::new(Mutex::new(SimWorld::new(config.clone())));
        let center = (sensor.ahead_low + sensor.ahead_high) as f32 / 2.0;
        let swing = (center - sensor.signal_floor as f32).min(sensor.max_sample as f32 - center);

        // The last mission ends in DONE with nobody pressing reset
        let presses = match config.missions {
            0 => u32::MAX,
            n => n - 1,
        };

        log::info!(
            "Simulated world: start ({:.2}, {:.2}), beacon at ({:.2}, {:.2})",
            config.start_x,
            config.start_y,
            config.beacon_x,
            config.beacon_y
        );

        Self {
            motor: SimMotor {
                world: world.clone(),
            },
            sensor: SimBeaconSensor {
                world: world.clone(),
                center,
                swing,
                max: sensor.max_sample,
            },
            rfid: SimRfid {
                world: world.clone(),
                repeat: Duration::from_millis(config.rfid_repeat_ms),
                last_emit: None,
                was_inside: false,
            },
            operator: SimOperator {
                shared,
                delay: Duration::from_millis(config.reset_delay_ms),
                remaining: presses,
                done_since: None,
            },
            world,
        }
    }
}
