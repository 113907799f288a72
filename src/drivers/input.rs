//! Reset button input and debouncing glue

use std::time::{Duration, Instant};

/// Digital "operator requests restart" level
pub trait ResetInput: Send {
    /// Current raw level of the reset line
    fn is_asserted(&mut self) -> bool;
}

impl<I: ResetInput + ?Sized> ResetInput for Box<I> {
    fn is_asserted(&mut self) -> bool {
        (**self).is_asserted()
    }
}

/// Reports a press once the level has been held for the debounce time.
///
/// A held button registers once; it must be released before it can
/// register again.
pub struct Debounced<I> {
    input: I,
    hold: Duration,
    pressed_since: Option<Instant>,
    latched: bool,
}

impl<I: ResetInput> Debounced<I> {
    pub fn new(input: I, hold: Duration) -> Self {
        Self {
            input,
            hold,
            pressed_since: None,
            latched: false,
        }
    }

    /// Sample the line at `now`; true exactly once per qualified press
    pub fn poll_at(&mut self, now: Instant) -> bool {
        if !self.input.is_asserted() {
            self.pressed_since = None;
            self.latched = false;
            return false;
        }

        let since = *self.pressed_since.get_or_insert(now);
        if !self.latched && now.duration_since(since) >= self.hold {
            self.latched = true;
            return true;
        }
        false
    }

    /// Sample the line now
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.input
    }
}
