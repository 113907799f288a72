//! Navigation state machine
//!
//! ```text
//!            BeaconAhead                 valid tag
//!  SEARCH ───────────────▶ APPROACH ──────────────▶ RETURN ──────▶ DONE
//!    │  sweep turn            │ forward / correct     ▲  log unwound  │
//!    │                        │                       │               │
//!    └────────────────────────┴───── valid tag ───────┘               │
//!    ▲                                                                │
//!    └──────────────────────── reset button ──────────────────────────┘
//! ```
//!
//! Every motion change opens a new segment in the move log, inside the same
//! critical section that sets the mode and drives the motors. RETURN replays
//! the log back to front with each segment's inverse command, advancing only
//! once the tick service has counted the active segment down to zero.

use crate::beacon::{BeaconGate, TagId};
use crate::config::{MotionConfig, SensorConfig};
use crate::drivers::display::StatusDisplay;
use crate::drivers::motor::{DriveCommand, MotorDriver, Rotation};
use crate::error::{Error, Result};
use crate::navigation::mode::RobotMode;
use crate::recorder::MoveKind;
use crate::sensor::{Classifier, SensorState, SteeringDirective};
use crate::shared::NavShared;
use std::sync::Arc;

/// Rotational sense of the search sweep
const SWEEP_ROTATION: Rotation = Rotation::Clockwise;

/// Whether classifier output can be trusted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Standing still until the moving average stops moving
    Settling,
    /// Acting on classifier output
    Active,
}

/// Navigation state machine driving the motors from the main loop
pub struct Navigator<M, D> {
    shared: Arc<NavShared>,
    classifier: Classifier,
    sensor: SensorState,
    gate: BeaconGate,
    motion: MotionConfig,
    motors: M,
    display: D,
    phase: Phase,
    /// Mode currently on the display
    shown: Option<RobotMode>,
    last_tag: Option<TagId>,
    missions: u32,
}

impl<M: MotorDriver, D: StatusDisplay> Navigator<M, D> {
    pub fn new(
        shared: Arc<NavShared>,
        sensor: SensorConfig,
        motion: MotionConfig,
        motors: M,
        display: D,
    ) -> Self {
        Self {
            shared,
            classifier: Classifier::new(sensor),
            sensor: SensorState::new(),
            gate: BeaconGate::new(),
            motion,
            motors,
            display,
            phase: Phase::Settling,
            shown: None,
            last_tag: None,
            missions: 0,
        }
    }

    /// One pass of the main loop.
    ///
    /// `sample` is a fresh receiver reading when the poll cadence is due,
    /// `reset` a debounced press of the reset button. Returns the mode after
    /// the pass. Any error has already stopped the motors and is fatal.
    pub fn step(&mut self, sample: Option<u32>, reset: bool) -> Result<RobotMode> {
        let result = self
            .shared
            .mode()
            .and_then(|mode| self.dispatch(mode, sample, reset));

        match result {
            Ok(mode) => {
                self.refresh_display(mode);
                Ok(mode)
            }
            Err(e) => {
                self.halt(&e);
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, mode: RobotMode, sample: Option<u32>, reset: bool) -> Result<RobotMode> {
        match mode {
            RobotMode::Search => self.search(sample),
            RobotMode::Approach => self.approach(sample),
            RobotMode::Return => self.unwind(),
            RobotMode::Done => self.done(reset),
        }
    }

    fn search(&mut self, sample: Option<u32>) -> Result<RobotMode> {
        if let Some(tag) = self.gate.poll(self.shared.beacon()) {
            return self.begin_return(tag);
        }

        if self.phase == Phase::Settling {
            self.ensure_segment(MoveKind::Idle, DriveCommand::STOP)?;
        }

        let Some(raw) = sample else {
            return Ok(RobotMode::Search);
        };
        let directive = self.classifier.classify(raw, &mut self.sensor);

        match self.phase {
            Phase::Settling => {
                if self.classifier.is_settled(&self.sensor) {
                    log::info!(
                        "Sensor settled at {} after {} samples; sweeping",
                        self.sensor.smoothed(),
                        self.sensor.samples()
                    );
                    self.phase = Phase::Active;
                    let (kind, drive) = self.sweep();
                    self.ensure_segment(kind, drive)?;
                }
                Ok(RobotMode::Search)
            }
            Phase::Active => {
                if directive == SteeringDirective::BeaconAhead {
                    log::info!("Beacon ahead (signal {}); approaching", self.sensor.smoothed());
                    let drive = DriveCommand::forward(self.motion.forward_speed);
                    self.open_segment(MoveKind::Forward, drive, Some(RobotMode::Approach))?;
                    Ok(RobotMode::Approach)
                } else {
                    let (kind, drive) = self.sweep();
                    self.ensure_segment(kind, drive)?;
                    Ok(RobotMode::Search)
                }
            }
        }
    }

    fn approach(&mut self, sample: Option<u32>) -> Result<RobotMode> {
        if let Some(tag) = self.gate.poll(self.shared.beacon()) {
            return self.begin_return(tag);
        }

        let Some(raw) = sample else {
            return Ok(RobotMode::Approach);
        };

        let directive = self.classifier.classify(raw, &mut self.sensor);
        log::trace!(
            "Approach steering: {} (signal {})",
            directive.as_str(),
            self.sensor.smoothed()
        );
        let (kind, drive) = match directive {
            SteeringDirective::BeaconAhead => (
                MoveKind::Forward,
                DriveCommand::forward(self.motion.forward_speed),
            ),
            SteeringDirective::BeaconOffToRight => self.correction(Rotation::Clockwise),
            SteeringDirective::BeaconOffToLeft => self.correction(Rotation::CounterClockwise),
            // Lost it: sweep again, still recorded as part of the approach
            SteeringDirective::NoBeacon => self.sweep(),
        };
        self.ensure_segment(kind, drive)?;
        Ok(RobotMode::Approach)
    }

    fn begin_return(&mut self, tag: TagId) -> Result<RobotMode> {
        self.last_tag = Some(tag);

        let motors = &mut self.motors;
        let (segments, ticks) = self.shared.with_core(|core| -> Result<(usize, i64)> {
            core.set_mode(RobotMode::Return);
            match core.log().active() {
                Some(segment) => motors.drive(segment.undo_command())?,
                None => motors.stop()?,
            }
            Ok((core.log().len(), core.log().total_ticks()))
        })?;

        log::info!(
            "Tag {} found; retracing {} segments ({} ticks)",
            tag,
            segments,
            ticks
        );
        Ok(RobotMode::Return)
    }

    fn unwind(&mut self) -> Result<RobotMode> {
        self.gate.discard(self.shared.beacon());

        let motors = &mut self.motors;
        let mode = self.shared.with_core(|core| -> Result<RobotMode> {
            if !core.log().is_segment_exhausted() {
                return Ok(RobotMode::Return);
            }
            match core.log_mut().step_back() {
                Some(segment) => {
                    log::debug!(
                        "Replaying segment {:?}: {} for {} ticks",
                        core.log().current_index(),
                        segment.kind.as_str(),
                        segment.duration
                    );
                    motors.drive(segment.undo_command())?;
                    Ok(RobotMode::Return)
                }
                None => {
                    motors.stop()?;
                    core.set_mode(RobotMode::Done);
                    Ok(RobotMode::Done)
                }
            }
        })?;

        if mode == RobotMode::Done {
            self.missions += 1;
            log::info!("Path retraced; mission {} complete", self.missions);
        }
        Ok(mode)
    }

    fn done(&mut self, reset: bool) -> Result<RobotMode> {
        self.gate.discard(self.shared.beacon());
        if !reset {
            return Ok(RobotMode::Done);
        }

        log::info!("Reset requested; clearing move log");
        if let Err(e) = self.display.show("RESETTING ROBOT") {
            log::warn!("Display update failed: {}", e);
        }

        self.motors.stop()?;
        self.sensor.reset();
        self.phase = Phase::Settling;
        self.last_tag = None;
        self.shared.with_core(|core| {
            core.log_mut().clear();
            core.set_mode(RobotMode::Search);
        });
        self.shared.beacon().clear();
        self.shown = None;
        Ok(RobotMode::Search)
    }

    /// Open a segment unless the active one already runs `drive`
    fn ensure_segment(&mut self, kind: MoveKind, drive: DriveCommand) -> Result<()> {
        let current = self
            .shared
            .with_core(|core| core.log().active().map(|s| (s.kind, s.drive)));
        if current == Some((kind, drive)) {
            return Ok(());
        }
        self.open_segment(kind, drive, None)
    }

    /// Start a segment, optionally switch mode, and command the motors as
    /// one step with respect to the tick
    fn open_segment(
        &mut self,
        kind: MoveKind,
        drive: DriveCommand,
        mode: Option<RobotMode>,
    ) -> Result<()> {
        let motors = &mut self.motors;
        self.shared.with_core(|core| -> Result<()> {
            let index = core.log_mut().start_new_segment(kind, drive)?;
            if let Some(mode) = mode {
                core.set_mode(mode);
            }
            motors.drive(drive)?;
            log::debug!("Segment {} started: {}", index, kind.as_str());
            Ok(())
        })
    }

    fn sweep(&self) -> (MoveKind, DriveCommand) {
        (
            MoveKind::Turn(SWEEP_ROTATION),
            DriveCommand::arc(
                SWEEP_ROTATION,
                self.motion.sweep_outer_speed,
                self.motion.sweep_inner_speed,
            ),
        )
    }

    fn correction(&self, rotation: Rotation) -> (MoveKind, DriveCommand) {
        (
            MoveKind::Turn(rotation),
            DriveCommand::spin(rotation, self.motion.correction_speed),
        )
    }

    fn refresh_display(&mut self, mode: RobotMode) {
        if self.shown == Some(mode) {
            return;
        }
        self.shown = Some(mode);

        let mut result = self.display.show(mode.status_text());
        if let (RobotMode::Return, Some(tag)) = (mode, self.last_tag) {
            result = result.and_then(|_| self.display.write_line(&format!("TAG {}", tag)));
        }
        if let Err(e) = result {
            log::warn!("Display update failed: {}", e);
        }
    }

    /// Stop everything and put the fault on the display
    fn halt(&mut self, error: &Error) {
        log::error!("Navigation halted: {}", error);
        if let Err(e) = self.motors.stop() {
            log::error!("Failed to stop motors: {}", e);
        }
        let text = match error {
            Error::InvalidMode(raw) => format!("MODE FAULT {:#04x}", raw),
            Error::MoveLogFull { .. } => "MOVE LOG FULL".to_string(),
            _ => "FAULT".to_string(),
        };
        if let Err(e) = self.display.show(&text) {
            log::warn!("Display update failed: {}", e);
        }
        self.shown = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sensor(&self) -> &SensorState {
        &self.sensor
    }

    pub fn gate(&self) -> &BeaconGate {
        &self.gate
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut M {
        &mut self.motors
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn missions_completed(&self) -> u32 {
        self.missions
    }

    pub fn shared(&self) -> &Arc<NavShared> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::RfidFrame;
    use crate::drivers::display::LogDisplay;
    use crate::timing::on_tick;

    #[derive(Default)]
    struct RecordingMotor {
        commands: Vec<DriveCommand>,
    }

    impl MotorDriver for RecordingMotor {
        fn drive(&mut self, command: DriveCommand) -> Result<()> {
            self.commands.push(command);
            Ok(())
        }
    }

    impl RecordingMotor {
        fn last(&self) -> DriveCommand {
            *self.commands.last().unwrap()
        }
    }

    fn navigator() -> Navigator<RecordingMotor, LogDisplay> {
        Navigator::new(
            Arc::new(NavShared::new()),
            SensorConfig::default(),
            MotionConfig::default(),
            RecordingMotor::default(),
            LogDisplay::new(16),
        )
    }

    fn settle(nav: &mut Navigator<RecordingMotor, LogDisplay>, raw: u32) {
        for _ in 0..200 {
            nav.step(Some(raw), false).unwrap();
            if nav.phase() == Phase::Active {
                return;
            }
        }
        panic!("sensor never settled");
    }

    fn kinds(nav: &Navigator<RecordingMotor, LogDisplay>) -> Vec<MoveKind> {
        nav.shared()
            .with_core(|core| core.log().segments().iter().map(|s| s.kind).collect())
    }

    #[test]
    fn test_settles_before_sweeping() {
        let mut nav = navigator();
        nav.step(Some(0), false).unwrap();
        assert_eq!(nav.phase(), Phase::Settling);
        assert_eq!(nav.motors().last(), DriveCommand::STOP);

        settle(&mut nav, 0);
        assert_eq!(kinds(&nav), vec![MoveKind::Idle, MoveKind::Turn(Rotation::Clockwise)]);
        assert_eq!(nav.motors().last(), DriveCommand::arc(Rotation::Clockwise, 30, 18));
    }

    #[test]
    fn test_sweep_continues_without_beacon() {
        let mut nav = navigator();
        settle(&mut nav, 0);
        for _ in 0..20 {
            assert_eq!(nav.step(Some(300), false).unwrap(), RobotMode::Search);
        }
        // Off-to-the-left while searching keeps the same sweep segment
        assert_eq!(kinds(&nav).len(), 2);
    }

    #[test]
    fn test_beacon_ahead_starts_approach() {
        let mut nav = navigator();
        settle(&mut nav, 0);

        let mut mode = RobotMode::Search;
        for _ in 0..100 {
            mode = nav.step(Some(500), false).unwrap();
            if mode == RobotMode::Approach {
                break;
            }
        }
        assert_eq!(mode, RobotMode::Approach);
        assert_eq!(kinds(&nav).last(), Some(&MoveKind::Forward));
        assert_eq!(nav.motors().last(), DriveCommand::forward(50));
        assert_eq!(nav.display().lines(), ["APPROACHING"]);
    }

    #[test]
    fn test_drift_opens_correction_then_forward() {
        let mut nav = navigator();
        settle(&mut nav, 500);
        nav.step(Some(500), false).unwrap();
        assert_eq!(nav.shared().mode().unwrap(), RobotMode::Approach);

        for _ in 0..100 {
            nav.step(Some(950), false).unwrap();
        }
        assert_eq!(kinds(&nav).last(), Some(&MoveKind::Turn(Rotation::Clockwise)));
        assert_eq!(nav.motors().last(), DriveCommand::spin(Rotation::Clockwise, 25));

        for _ in 0..100 {
            nav.step(Some(500), false).unwrap();
        }
        let k = kinds(&nav);
        assert_eq!(k[k.len() - 2], MoveKind::Turn(Rotation::Clockwise));
        assert_eq!(k[k.len() - 1], MoveKind::Forward);
    }

    #[test]
    fn test_valid_tag_during_search_returns() {
        let mut nav = navigator();
        settle(&mut nav, 0);
        for _ in 0..3 {
            on_tick(nav.shared());
        }

        nav.shared()
            .beacon()
            .publish(RfidFrame::for_tag(TagId(0x12_3456_789A)));
        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);

        // Undo of the clockwise sweep is a counter-clockwise arc
        assert_eq!(
            nav.motors().last(),
            DriveCommand::arc(Rotation::Clockwise, 30, 18).inverted()
        );
        assert_eq!(nav.display().lines(), ["RETURNING", "TAG 123456789A"]);
    }

    #[test]
    fn test_invalid_tag_during_search_ignored() {
        let mut nav = navigator();
        settle(&mut nav, 0);
        let before = kinds(&nav);

        nav.shared()
            .beacon()
            .publish(RfidFrame::from_chars(*b"0415AB3C9D00"));
        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Search);
        assert_eq!(kinds(&nav), before);
        assert_eq!(nav.gate().rejected(), 1);
    }

    #[test]
    fn test_return_replays_then_done() {
        let mut nav = navigator();
        settle(&mut nav, 500);
        nav.step(Some(500), false).unwrap();
        for _ in 0..4 {
            on_tick(nav.shared());
        }

        nav.shared().beacon().publish(RfidFrame::for_tag(TagId(1)));
        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);
        assert_eq!(nav.motors().last(), DriveCommand::forward(50).inverted());

        let mut mode = RobotMode::Return;
        for _ in 0..20 {
            mode = nav.step(None, false).unwrap();
            if mode == RobotMode::Done {
                break;
            }
            on_tick(nav.shared());
        }
        assert_eq!(mode, RobotMode::Done);
        assert!(nav.motors().last().is_stopped());
        assert_eq!(nav.missions_completed(), 1);
        nav.shared()
            .with_core(|core| assert!(core.log().is_unwound()));
    }

    #[test]
    fn test_reset_from_done() {
        let mut nav = navigator();
        nav.shared().beacon().publish(RfidFrame::for_tag(TagId(1)));
        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);
        // Nothing was recorded, so the first replay pass finishes
        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Done);

        assert_eq!(nav.step(None, false).unwrap(), RobotMode::Done);
        assert_eq!(nav.step(None, true).unwrap(), RobotMode::Search);
        nav.shared().with_core(|core| assert_eq!(core.log().len(), 0));
        assert_eq!(nav.phase(), Phase::Settling);
        assert_eq!(nav.sensor().samples(), 0);
    }

    #[test]
    fn test_move_log_overflow_halts() {
        let sensor = SensorConfig {
            smoothing_weight: 1,
            ..Default::default()
        };
        let mut nav = Navigator::new(
            Arc::new(NavShared::new()),
            sensor,
            MotionConfig::default(),
            RecordingMotor::default(),
            LogDisplay::new(16),
        );
        settle(&mut nav, 500);

        // Ahead and drift alternate, each opening a segment
        let mut result = Ok(RobotMode::Search);
        for i in 0..300 {
            let raw = if i % 2 == 0 { 500 } else { 950 };
            result = nav.step(Some(raw), false);
            if result.is_err() {
                break;
            }
        }

        assert!(matches!(result, Err(Error::MoveLogFull { capacity: 128 })));
        assert!(nav.motors().last().is_stopped());
        assert_eq!(nav.display().lines(), ["MOVE LOG FULL"]);
        nav.shared()
            .with_core(|core| assert_eq!(core.log().len(), 128));
    }

    struct BrokenDisplay;

    impl StatusDisplay for BrokenDisplay {
        fn clear(&mut self) -> Result<()> {
            Err(Error::Other("display unplugged".to_string()))
        }

        fn write_line(&mut self, _text: &str) -> Result<()> {
            Err(Error::Other("display unplugged".to_string()))
        }
    }

    #[test]
    fn test_fault_halts_without_display() {
        let mut nav = Navigator::new(
            Arc::new(NavShared::new()),
            SensorConfig::default(),
            MotionConfig::default(),
            RecordingMotor::default(),
            BrokenDisplay,
        );
        nav.step(Some(0), false).unwrap();
        nav.shared().with_core(|core| core.set_raw_mode(0xFF));

        assert!(matches!(nav.step(Some(0), false), Err(Error::InvalidMode(0xFF))));
        assert!(nav.motors().last().is_stopped());
    }

    #[test]
    fn test_corrupt_mode_halts() {
        let mut nav = navigator();
        settle(&mut nav, 0);
        nav.shared().with_core(|core| core.set_raw_mode(9));

        let err = nav.step(Some(0), false).unwrap_err();
        assert!(matches!(err, Error::InvalidMode(9)));
        assert!(nav.motors().last().is_stopped());
        assert_eq!(nav.display().lines(), ["MODE FAULT 0x09"]);
    }
}
