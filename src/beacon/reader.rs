//! Beacon reader thread (the high-priority event source)
//!
//! Pulls bytes from the RFID transport, assembles frames, and drops each
//! completed frame into the shared mailbox. It never touches the mode or the
//! move log; the navigator decides what a frame means.

use super::frame::FrameAssembler;
use crate::drivers::transport::Transport;
use crate::error::{Error, Result};
use crate::shared::NavShared;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pause after a transport error before retrying
const ERROR_BACKOFF_MS: u64 = 10;

/// Pause when the transport had nothing to give
const IDLE_SLEEP_MS: u64 = 2;

/// Spawn the reader thread
pub fn spawn_beacon_reader<T>(transport: T, shared: Arc<NavShared>) -> Result<JoinHandle<()>>
where
    T: Transport + 'static,
{
    thread::Builder::new()
        .name("beacon-reader".to_string())
        .spawn(move || reader_loop(transport, &shared))
        .map_err(|e| Error::Other(format!("Failed to spawn beacon reader: {}", e)))
}

/// Read bytes until shutdown is signalled
pub fn reader_loop<T: Transport>(mut transport: T, shared: &NavShared) {
    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; 64];
    let mut frames: u64 = 0;

    while !shared.should_shutdown() {
        match transport.read(&mut buf) {
            Ok(0) => thread::sleep(Duration::from_millis(IDLE_SLEEP_MS)),
            Ok(n) => {
                for &byte in &buf[..n] {
                    if let Some(frame) = assembler.push(byte) {
                        frames += 1;
                        log::debug!("RFID frame #{} assembled", frames);
                        shared.beacon().publish(frame);
                    }
                }
            }
            Err(e) => {
                log::error!("RFID read error: {}", e);
                thread::sleep(Duration::from_millis(ERROR_BACKOFF_MS));
            }
        }
    }

    log::info!(
        "Beacon reader exiting ({} frames, {} dropped partials)",
        frames,
        assembler.discarded()
    );
}
