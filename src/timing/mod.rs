//! Move timing service
//!
//! One call to [`on_tick`] per tick period. While the robot records it grows
//! the active segment; while it returns it shrinks it. The tick never opens
//! segments or moves the cursor, so RETURN spends exactly as many counted
//! ticks on a segment as were recorded on it.

mod tick_source;

pub use tick_source::{spawn_tick_source, tick_loop};

use crate::navigation::mode::RobotMode;
use crate::shared::NavShared;

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Added one tick to the active segment
    Recorded,
    /// Took one tick off the active segment
    Unwound,
    /// Returning, but the active segment is already exhausted
    Exhausted,
    /// Nothing to time (DONE, empty log, or an undecodable mode)
    Idle,
}

/// Handle one tick.
///
/// Mode and move log are read and written under the same lock the navigator
/// uses for transitions, so a tick never lands between a mode change and
/// the matching segment change. The tick is always acknowledged.
pub fn on_tick(shared: &NavShared) -> TickOutcome {
    let outcome = shared.with_core(|core| match core.mode() {
        Ok(mode) if mode.is_recording() => {
            if core.log_mut().record_tick() {
                TickOutcome::Recorded
            } else {
                TickOutcome::Idle
            }
        }
        Ok(RobotMode::Return) => {
            if core.log_mut().unwind_tick() {
                TickOutcome::Unwound
            } else {
                TickOutcome::Exhausted
            }
        }
        _ => TickOutcome::Idle,
    });

    let n = shared.acknowledge_tick();
    log::trace!("Tick {}: {:?}", n, outcome);
    outcome
}
