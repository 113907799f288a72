//! Periodic tick thread
//!
//! Runs [`on_tick`](super::on_tick) on a dedicated OS thread, independent of
//! the main loop, so navigation work can never delay a tick.
//!
//! # Timing
//!
//! Deadlines are absolute (`next += period`), so scheduling jitter does not
//! accumulate. If the thread wakes late it fires the missed ticks back to
//! back: ticks are never dropped, and each loop pass fires exactly one.

use super::on_tick;
use crate::error::{Error, Result};
use crate::shared::NavShared;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Spawn the tick thread
pub fn spawn_tick_source(shared: Arc<NavShared>, period: Duration) -> Result<JoinHandle<()>> {
    if period.is_zero() {
        return Err(Error::Config("tick period must be non-zero".to_string()));
    }
    thread::Builder::new()
        .name("move-tick".to_string())
        .spawn(move || tick_loop(&shared, period))
        .map_err(|e| Error::Other(format!("Failed to spawn tick source: {}", e)))
}

/// Fire ticks every `period` until shutdown is signalled
pub fn tick_loop(shared: &NavShared, period: Duration) {
    log::info!("Tick source running at {:?} per tick", period);

    let mut next = Instant::now() + period;
    let mut late_ticks: u64 = 0;

    while !shared.should_shutdown() {
        let now = Instant::now();
        if now < next {
            thread::sleep(next - now);
        } else if now - next >= period {
            late_ticks += 1;
        }

        on_tick(shared);
        next += period;
    }

    log::info!(
        "Tick source exiting after {} ticks ({} fired late)",
        shared.tick_count(),
        late_ticks
    );
}
