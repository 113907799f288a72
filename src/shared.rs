//! State shared between the main loop and the two event sources
//!
//! ```text
//!  ┌──────────────┐  publish()   ┌───────────────┐  take()   ┌─────────────┐
//!  │ beacon reader│─────────────▶│ BeaconMailbox │──────────▶│             │
//!  │ (high prio)  │              └───────────────┘           │  main loop  │
//!  └──────────────┘                                          │ (navigator) │
//!  ┌──────────────┐  on_tick()   ┌───────────────┐ transition│             │
//!  │ tick source  │─────────────▶│   TickCore    │◀─────────▶│             │
//!  │ (low prio)   │              │ mode + MoveLog│           └─────────────┘
//!  └──────────────┘              └───────────────┘
//! ```
//!
//! Field ownership:
//!
//! | Field              | Writer                         | Reader            |
//! |--------------------|--------------------------------|-------------------|
//! | mode               | navigator                      | tick, navigator   |
//! | move log cursor    | navigator                      | tick, navigator   |
//! | segment duration   | tick                           | navigator         |
//! | beacon frame/flag  | beacon reader (set)            | navigator (clear) |
//!
//! The mode and the move log live behind one short critical section, so the
//! tick never sees a new mode with a stale segment index or the reverse.

use crate::beacon::frame::RfidFrame;
use crate::error::Result;
use crate::navigation::mode::RobotMode;
use crate::recorder::MoveLog;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Mode and move log, always updated together
pub struct TickCore {
    mode: u8,
    log: MoveLog,
}

impl TickCore {
    fn new() -> Self {
        Self {
            mode: RobotMode::Search.as_raw(),
            log: MoveLog::new(),
        }
    }

    /// Decode the current mode
    pub fn mode(&self) -> Result<RobotMode> {
        RobotMode::from_raw(self.mode)
    }

    /// Raw mode byte
    pub fn raw_mode(&self) -> u8 {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RobotMode) {
        self.mode = mode.as_raw();
    }

    pub fn log(&self) -> &MoveLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut MoveLog {
        &mut self.log
    }

    #[cfg(test)]
    pub(crate) fn set_raw_mode(&mut self, raw: u8) {
        self.mode = raw;
    }
}

/// Single-slot handoff of completed RFID frames.
///
/// The reader thread is the only writer; the navigator is the only reader
/// and the only one that empties the slot. Flag and frame change together
/// under the slot lock; the flag alone is a lock-free pending hint.
pub struct BeaconMailbox {
    ready: AtomicBool,
    slot: Mutex<Option<RfidFrame>>,
}

impl BeaconMailbox {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            slot: Mutex::new(None),
        }
    }

    /// Store a completed frame and raise the flag.
    ///
    /// An unread frame is overwritten by the newer one.
    pub fn publish(&self, frame: RfidFrame) {
        let mut slot = self.slot.lock();
        *slot = Some(frame);
        self.ready.store(true, Ordering::Release);
    }

    /// Take the pending frame, emptying the slot
    pub fn take(&self) -> Option<RfidFrame> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        let mut slot = self.slot.lock();
        self.ready.store(false, Ordering::Release);
        slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Drop any pending frame
    pub fn clear(&self) {
        let mut slot = self.slot.lock();
        *slot = None;
        self.ready.store(false, Ordering::Release);
    }
}

/// Everything the main loop and the event sources share
pub struct NavShared {
    core: Mutex<TickCore>,
    beacon: BeaconMailbox,
    /// Ticks acknowledged by the timing service, whatever the mode
    ticks: AtomicU64,
    shutdown: AtomicBool,
}

impl NavShared {
    /// Fresh state: SEARCH with an empty log
    pub fn new() -> Self {
        Self {
            core: Mutex::new(TickCore::new()),
            beacon: BeaconMailbox::new(),
            ticks: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Run `f` inside the tick critical section.
    ///
    /// Keep `f` short: the tick source waits on this lock.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut TickCore) -> R) -> R {
        let mut core = self.core.lock();
        f(&mut core)
    }

    /// Current mode (consistent snapshot)
    pub fn mode(&self) -> Result<RobotMode> {
        self.core.lock().mode()
    }

    pub fn beacon(&self) -> &BeaconMailbox {
        &self.beacon
    }

    pub(crate) fn acknowledge_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Ticks fired since start
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Default for NavShared {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::frame::TagId;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_state_is_search_with_empty_log() {
        let shared = NavShared::new();
        assert_eq!(shared.mode().unwrap(), RobotMode::Search);
        shared.with_core(|core| assert!(core.log().is_empty()));
        assert_eq!(shared.tick_count(), 0);
    }

    #[test]
    fn test_mailbox_take_clears_flag() {
        let shared = NavShared::new();
        assert!(shared.beacon().take().is_none());

        let frame = RfidFrame::from_chars(*b"0415AB3C9D63");
        shared.beacon().publish(frame);
        assert!(shared.beacon().is_pending());
        assert_eq!(shared.beacon().take(), Some(frame));
        assert!(!shared.beacon().is_pending());
        assert!(shared.beacon().take().is_none());
    }

    #[test]
    fn test_mailbox_keeps_latest_frame() {
        let shared = NavShared::new();
        shared.beacon().publish(RfidFrame::from_chars(*b"000000000000"));
        let latest = RfidFrame::from_chars(*b"0415AB3C9D63");
        shared.beacon().publish(latest);
        assert_eq!(shared.beacon().take(), Some(latest));
    }

    #[test]
    fn test_mailbox_clear_drops_frame() {
        let shared = NavShared::new();
        shared.beacon().publish(RfidFrame::from_chars(*b"0415AB3C9D1B"));
        shared.beacon().clear();
        assert!(!shared.beacon().is_pending());
        assert!(shared.beacon().take().is_none());
    }

    #[test]
    fn test_mailbox_never_repeats_a_frame() {
        let shared = Arc::new(NavShared::new());
        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for id in 1..=5000u64 {
                    shared.beacon().publish(RfidFrame::for_tag(TagId(id)));
                }
            })
        };

        let mut last = 0;
        let mut delivered = 0;
        while !writer.is_finished() || shared.beacon().is_pending() {
            if let Some(frame) = shared.beacon().take() {
                let TagId(id) = frame.validate().unwrap();
                assert!(id > last, "tag {} delivered after {}", id, last);
                last = id;
                delivered += 1;
            }
        }
        writer.join().unwrap();

        assert!(delivered > 0);
        assert!(shared.beacon().take().is_none());
    }

    #[test]
    fn test_shutdown_flag() {
        let shared = NavShared::new();
        assert!(!shared.should_shutdown());
        shared.signal_shutdown();
        assert!(shared.should_shutdown());
    }
}
