//! Move recorder: a bounded stack of timed segments replayed in reverse
//!
//! ```text
//!  record (SEARCH / APPROACH)            unwind (RETURN)
//!  ────────────────────────────▶         ◀────────────────────────────
//!  [Idle:40][Turn:310][Fwd:120]          [Idle:40][Turn:310][Fwd:0 ]
//!                        ▲ cursor                       ▲ cursor
//!                 ticks count up                 ticks count down,
//!                                        step_back() once exhausted
//! ```
//!
//! Capacity is fixed at compile time. Running out of room is a hard error,
//! never a silent overwrite.
//!
//! Writers are split: the timing service only touches the active segment's
//! duration (`record_tick` / `unwind_tick`), the navigator only moves the
//! cursor and opens segments.

pub mod segment;

pub use segment::{MoveKind, MoveSegment};

use crate::drivers::motor::DriveCommand;
use crate::error::{Error, Result};

/// Default number of segments a mission can record
pub const DEFAULT_CAPACITY: usize = 128;

/// Fixed-capacity move log
pub struct MoveLog<const N: usize = DEFAULT_CAPACITY> {
    segments: [MoveSegment; N],
    /// Segments recorded since the last clear
    len: usize,
    /// Live segments; the active one is at `cursor - 1`
    cursor: usize,
}

impl<const N: usize> MoveLog<N> {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            segments: [MoveSegment::default(); N],
            len: 0,
            cursor: 0,
        }
    }

    /// Append a zero-duration segment and make it active.
    ///
    /// Any segments already unwound past the cursor are discarded.
    pub fn start_new_segment(&mut self, kind: MoveKind, drive: DriveCommand) -> Result<usize> {
        if self.cursor >= N {
            return Err(Error::MoveLogFull { capacity: N });
        }
        let index = self.cursor;
        self.segments[index] = MoveSegment::new(kind, drive);
        self.cursor += 1;
        self.len = self.cursor;
        Ok(index)
    }

    /// Index of the active segment
    #[inline]
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    /// The active segment
    #[inline]
    pub fn active(&self) -> Option<&MoveSegment> {
        self.current_index().map(|i| &self.segments[i])
    }

    /// Count one tick of forward motion on the active segment
    pub(crate) fn record_tick(&mut self) -> bool {
        match self.current_index() {
            Some(i) => {
                self.segments[i].duration += 1;
                true
            }
            None => false,
        }
    }

    /// Take one tick off the active segment.
    ///
    /// Never drives a duration below zero; a tick landing on an exhausted
    /// segment is not counted.
    pub(crate) fn unwind_tick(&mut self) -> bool {
        match self.current_index() {
            Some(i) if self.segments[i].duration > 0 => {
                self.segments[i].duration -= 1;
                true
            }
            _ => false,
        }
    }

    /// True when there is nothing left to unwind on the active segment
    pub fn is_segment_exhausted(&self) -> bool {
        self.active().is_none_or(|s| s.duration <= 0)
    }

    /// Retire the active segment and return the one before it.
    ///
    /// `None` once the log is fully unwound; calling again stays `None`.
    pub fn step_back(&mut self) -> Option<MoveSegment> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.active().copied()
    }

    /// Recorded segments, oldest first
    pub fn segments(&self) -> &[MoveSegment] {
        &self.segments[..self.len]
    }

    /// Number of recorded segments
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once every recorded segment has been retired
    #[inline]
    pub fn is_unwound(&self) -> bool {
        self.cursor == 0
    }

    /// Sum of the remaining durations of live segments
    pub fn total_ticks(&self) -> i64 {
        self.segments[..self.cursor]
            .iter()
            .map(|s| i64::from(s.duration))
            .sum()
    }

    /// Drop every segment
    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }
}

impl<const N: usize> Default for MoveLog<N> {
    fn default() -> Self {
        Self::new()
    }
}
