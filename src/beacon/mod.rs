//! Beacon detection
//!
//! - [`frame`]: RFID frame assembly and checksum
//! - [`reader`]: event-source thread feeding the shared mailbox
//! - [`BeaconGate`]: turns mailbox frames into detections for the navigator

pub mod frame;
pub mod reader;

pub use frame::{FrameAssembler, RfidFrame, TagId};
pub use reader::spawn_beacon_reader;

use crate::shared::BeaconMailbox;

/// Beacon Detection Gate.
///
/// A frame only counts as a detection when its checksum holds. Bad frames
/// are "no detection": logged, counted, and otherwise ignored.
#[derive(Debug, Default)]
pub struct BeaconGate {
    accepted: u32,
    rejected: u32,
}

impl BeaconGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending frame, if any, and report a valid detection
    pub fn poll(&mut self, mailbox: &BeaconMailbox) -> Option<TagId> {
        let frame = mailbox.take()?;
        match frame.validate() {
            Ok(tag) => {
                self.accepted += 1;
                log::info!("Beacon detected: tag {}", tag);
                Some(tag)
            }
            Err(e) => {
                self.rejected += 1;
                log::warn!("Beacon frame rejected: {}", e);
                None
            }
        }
    }

    /// Throw away a pending frame without judging it
    pub fn discard(&mut self, mailbox: &BeaconMailbox) {
        if mailbox.take().is_some() {
            log::debug!("Beacon frame ignored outside search/approach");
        }
    }

    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}
