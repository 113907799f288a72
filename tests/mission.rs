//! End-to-end mission scenarios driven through the public API.
//!
//! Ticks are fired by hand so every scenario is deterministic.

use khoji::beacon::{RfidFrame, TagId};
use khoji::config::{MotionConfig, SensorConfig};
use khoji::drivers::{DriveCommand, LogDisplay, MotorDriver, Rotation};
use khoji::navigation::{Navigator, Phase, RobotMode};
use khoji::recorder::MoveKind;
use khoji::shared::NavShared;
use khoji::timing::{on_tick, TickOutcome};
use khoji::Result;
use std::sync::Arc;

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

type TestNavigator = Navigator<RecordingMotor, LogDisplay>;

fn navigator() -> TestNavigator {
    Navigator::new(
        Arc::new(NavShared::new()),
        SensorConfig::default(),
        MotionConfig::default(),
        RecordingMotor::default(),
        LogDisplay::new(16),
    )
}

fn last_command(nav: &TestNavigator) -> DriveCommand {
    *nav.motors().commands.last().unwrap()
}

fn settle(nav: &mut TestNavigator, raw: u32) {
    for _ in 0..200 {
        nav.step(Some(raw), false).unwrap();
        if nav.phase() == Phase::Active {
            return;
        }
    }
    panic!("sensor never settled");
}

fn ticks(nav: &TestNavigator, n: usize) {
    for _ in 0..n {
        on_tick(nav.shared());
    }
}

fn drive_until(nav: &mut TestNavigator, raw: u32, mode: RobotMode) {
    for _ in 0..200 {
        if nav.step(Some(raw), false).unwrap() == mode {
            return;
        }
    }
    panic!("never reached {}", mode);
}

fn durations(nav: &TestNavigator) -> Vec<(MoveKind, i32)> {
    nav.shared().with_core(|core| {
        core.log()
            .segments()
            .iter()
            .map(|s| (s.kind, s.duration))
            .collect()
    })
}

fn publish_tag(nav: &TestNavigator) {
    nav.shared()
        .beacon()
        .publish(RfidFrame::for_tag(TagId(0x04_15AB_3C9D)));
}

/// Step and tick through RETURN; returns the commands issued per tick
fn unwind(nav: &mut TestNavigator) -> Vec<DriveCommand> {
    let mut driven = Vec::new();
    for _ in 0..1000 {
        if nav.step(None, false).unwrap() == RobotMode::Done {
            return driven;
        }
        if on_tick(nav.shared()) == TickOutcome::Unwound {
            driven.push(last_command(nav));
        }
    }
    panic!("return never finished");
}

#[test]
fn test_turn_then_forward_is_retraced_in_reverse() {
    let mut nav = navigator();
    settle(&mut nav, 0);

    ticks(&nav, 5);
    drive_until(&mut nav, 500, RobotMode::Approach);
    ticks(&nav, 12);

    let sweep = DriveCommand::arc(Rotation::Clockwise, 30, 18);
    assert_eq!(
        durations(&nav),
        vec![
            (MoveKind::Idle, 0),
            (MoveKind::Turn(Rotation::Clockwise), 5),
            (MoveKind::Forward, 12),
        ]
    );

    publish_tag(&nav);
    assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);

    let driven = unwind(&mut nav);
    let mut expected = vec![DriveCommand::forward(50).inverted(); 12];
    expected.extend(vec![sweep.inverted(); 5]);
    assert_eq!(driven, expected);

    assert!(last_command(&nav).is_stopped());
    assert_eq!(nav.shared().mode().unwrap(), RobotMode::Done);
    assert_eq!(nav.display().lines(), ["DONE"]);
}

#[test]
fn test_every_recorded_tick_is_unwound() {
    let mut nav = navigator();
    let mut recorded = 0;

    let mut step_and_tick = |nav: &mut TestNavigator, raw: u32| {
        nav.step(Some(raw), false).unwrap();
        if on_tick(nav.shared()) == TickOutcome::Recorded {
            recorded += 1;
        }
    };

    // Settle, sweep, approach, drift right, recover, lose it, find it again
    for raw in std::iter::repeat(0)
        .take(40)
        .chain(std::iter::repeat(500).take(40))
        .chain(std::iter::repeat(900).take(40))
        .chain(std::iter::repeat(500).take(40))
        .chain(std::iter::repeat(0).take(40))
        .chain(std::iter::repeat(500).take(40))
    {
        step_and_tick(&mut nav, raw);
    }

    let total: i32 = durations(&nav).iter().map(|(_, d)| d).sum();
    assert_eq!(total, recorded);
    assert!(durations(&nav).len() >= 6);

    publish_tag(&nav);
    nav.step(None, false).unwrap();
    let unwound = unwind(&mut nav).len() as i32;
    assert_eq!(unwound, recorded);
    nav.shared()
        .with_core(|core| assert!(core.log().is_unwound()));
}

#[test]
fn test_bad_checksum_does_not_stop_search() {
    let mut nav = navigator();
    settle(&mut nav, 0);
    ticks(&nav, 3);

    nav.shared()
        .beacon()
        .publish(RfidFrame::from_chars(*b"0415AB3C9D1C"));
    assert_eq!(nav.step(Some(0), false).unwrap(), RobotMode::Search);
    assert_eq!(nav.gate().rejected(), 1);

    // The sweep carries on recording
    ticks(&nav, 2);
    assert_eq!(
        durations(&nav).last(),
        Some(&(MoveKind::Turn(Rotation::Clockwise), 5))
    );

    publish_tag(&nav);
    assert_eq!(nav.step(Some(0), false).unwrap(), RobotMode::Return);
    assert_eq!(nav.gate().accepted(), 1);
}

#[test]
fn test_tags_ignored_while_returning() {
    let mut nav = navigator();
    settle(&mut nav, 0);
    ticks(&nav, 4);
    publish_tag(&nav);
    nav.step(None, false).unwrap();

    publish_tag(&nav);
    assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);
    assert!(!nav.shared().beacon().is_pending());
    assert_eq!(nav.gate().accepted(), 1);
}

#[test]
fn test_empty_log_goes_straight_to_done() {
    let mut nav = navigator();
    publish_tag(&nav);
    assert_eq!(nav.step(None, false).unwrap(), RobotMode::Return);
    assert_eq!(nav.step(None, false).unwrap(), RobotMode::Done);
    assert!(last_command(&nav).is_stopped());
    assert_eq!(nav.missions_completed(), 1);
}

#[test]
fn test_reset_starts_a_fresh_mission() {
    let mut nav = navigator();
    settle(&mut nav, 0);
    ticks(&nav, 3);
    publish_tag(&nav);
    nav.step(None, false).unwrap();
    unwind(&mut nav);

    // Frames and ticks while DONE change nothing
    publish_tag(&nav);
    ticks(&nav, 10);
    assert_eq!(nav.step(None, false).unwrap(), RobotMode::Done);

    assert_eq!(nav.step(None, true).unwrap(), RobotMode::Search);
    assert_eq!(nav.phase(), Phase::Settling);
    assert!(durations(&nav).is_empty());

    settle(&mut nav, 0);
    ticks(&nav, 2);
    assert_eq!(
        durations(&nav),
        vec![(MoveKind::Idle, 0), (MoveKind::Turn(Rotation::Clockwise), 2)]
    );
}

#[test]
fn test_settling_ticks_are_retraced_standing_still() {
    let mut nav = navigator();
    nav.step(Some(0), false).unwrap();
    ticks(&nav, 3);
    settle(&mut nav, 0);

    publish_tag(&nav);
    nav.step(None, false).unwrap();
    let driven = unwind(&mut nav);
    assert_eq!(driven, vec![DriveCommand::STOP; 3]);
}
