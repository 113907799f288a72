//! Daemon orchestration
//!
//! Wires the shared state, the two event-source threads, the devices and
//! the navigator, then runs the main loop until the configured number of
//! missions is complete, a fault halts the robot, or shutdown is requested.

use crate::beacon::spawn_beacon_reader;
use crate::config::Config;
use crate::devices::sim::SimRig;
use crate::drivers::display::LogDisplay;
use crate::drivers::input::Debounced;
use crate::drivers::motor::MotorDriver;
use crate::drivers::sensor::BeaconSensor;
use crate::drivers::transport::Transport;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::shared::NavShared;
use crate::timing::spawn_tick_source;
use log::{info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Main loop idle time between passes
const LOOP_SLEEP_MS: u64 = 1;

/// Interval between status log lines
const STATUS_INTERVAL_SECS: u64 = 5;

/// Summary of a daemon run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionReport {
    /// Missions that ended back at the start
    pub missions: u32,
    /// Ticks fired by the timing service
    pub ticks: u64,
    /// Valid beacon detections
    pub beacons: u32,
    /// Frames dropped on a bad checksum or bad characters
    pub rejected_frames: u32,
}

pub struct App {
    config: Config,
    shared: Arc<NavShared>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shared: Arc::new(NavShared::new()),
        }
    }

    /// Handle for requesting shutdown from outside the main loop
    pub fn shared(&self) -> Arc<NavShared> {
        Arc::clone(&self.shared)
    }

    /// Run missions until done, faulted, or shut down
    pub fn run(&self) -> Result<MissionReport> {
        let rig = SimRig::new(
            &self.config.simulation,
            &self.config.sensor,
            Arc::clone(&self.shared),
        );
        let SimRig {
            world,
            motor,
            mut sensor,
            rfid,
            operator,
        } = rig;

        let transport = self.rfid_transport(rfid)?;
        let reader = spawn_beacon_reader(transport, Arc::clone(&self.shared))?;
        let ticker = match spawn_tick_source(
            Arc::clone(&self.shared),
            Duration::from_millis(self.config.timing.tick_period_ms),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.signal_shutdown();
                join("beacon-reader", reader);
                return Err(e);
            }
        };

        let mut navigator = Navigator::new(
            Arc::clone(&self.shared),
            self.config.sensor.clone(),
            self.config.motion.clone(),
            motor,
            LogDisplay::new(self.config.display.columns),
        );
        let mut reset = Debounced::new(
            operator,
            Duration::from_millis(self.config.reset.debounce_ms),
        );

        let target = self.config.simulation.missions;
        let poll = Duration::from_millis(self.config.sensor.poll_interval_ms);
        let mut next_sample = Instant::now();
        let mut last_status = Instant::now();

        info!("Navigation running");

        let result = loop {
            if self.shared.should_shutdown() {
                info!("Shutdown requested");
                break Ok(());
            }

            let now = Instant::now();
            let sample = if now >= next_sample {
                next_sample += poll;
                if next_sample < now {
                    next_sample = now + poll;
                }
                match sensor.sample() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Beacon sensor read failed: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            if let Err(e) = navigator.step(sample, reset.poll()) {
                break Err(e);
            }

            if target > 0 && navigator.missions_completed() >= target {
                info!("{} mission(s) complete", target);
                break Ok(());
            }

            if last_status.elapsed() >= Duration::from_secs(STATUS_INTERVAL_SECS) {
                let pose = world.lock().pose();
                info!(
                    "Status: mode {}, {} ticks, pose ({:.2}, {:.2}, {:.2})",
                    self.shared
                        .mode()
                        .map(|m| m.as_str())
                        .unwrap_or("INVALID"),
                    self.shared.tick_count(),
                    pose.x,
                    pose.y,
                    pose.theta
                );
                last_status = Instant::now();
            }

            thread::sleep(Duration::from_millis(LOOP_SLEEP_MS));
        };

        self.shared.signal_shutdown();
        join("move-tick", ticker);
        join("beacon-reader", reader);

        if let Err(e) = navigator.motors_mut().stop() {
            warn!("Failed to stop motors on exit: {}", e);
        }

        let report = MissionReport {
            missions: navigator.missions_completed(),
            ticks: self.shared.tick_count(),
            beacons: navigator.gate().accepted(),
            rejected_frames: navigator.gate().rejected(),
        };
        info!(
            "Run finished: {} mission(s), {} ticks, {} beacon(s), {} rejected frame(s)",
            report.missions,
            report.ticks,
            report.beacons,
            report.rejected_frames
        );

        result.map(|_| report)
    }

    /// Serial reader when a port is configured, else the simulated one
    fn rfid_transport<T: Transport + 'static>(&self, sim: T) -> Result<Box<dyn Transport>> {
        match &self.config.rfid.port {
            #[cfg(feature = "serial")]
            Some(port) => {
                info!("RFID reader on {} @ {} baud", port, self.config.rfid.baud_rate);
                let serial =
                    crate::drivers::transport::SerialTransport::open(port, self.config.rfid.baud_rate)?;
                Ok(Box::new(serial))
            }
            #[cfg(not(feature = "serial"))]
            Some(port) => Err(crate::error::Error::Config(format!(
                "rfid.port = {} requires the `serial` feature",
                port
            ))),
            None => {
                info!("RFID reader: simulated");
                Ok(Box::new(sim))
            }
        }
    }
}

fn join(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("{} thread panicked", name);
    }
}
