//! RFID reader frame assembly and checksum
//!
//! The reader sends one ASCII frame per tag read:
//!
//! ```text
//! ┌─────┬──────────────────────┬────────────┬─────┐
//! │ STX │ 10 hex chars (data)  │ 2 hex (cs) │ ETX │
//! │ 0x02│ 5 bytes: ver + id    │ XOR of data│ 0x03│
//! └─────┴──────────────────────┴────────────┴─────┘
//! ```

use crate::error::{Error, Result};

/// Start of frame
pub const STX: u8 = 0x02;
/// End of frame
pub const ETX: u8 = 0x03;
/// Hex characters of tag data
pub const FRAME_DATA_LEN: usize = 10;
/// Hex characters of checksum
pub const FRAME_CHECKSUM_LEN: usize = 2;
/// Characters between STX and ETX
pub const FRAME_LEN: usize = FRAME_DATA_LEN + FRAME_CHECKSUM_LEN;

/// 40-bit tag identifier (version byte + 32-bit serial)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(pub u64);

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:010X}", self.0)
    }
}

/// The 12 characters of one assembled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RfidFrame {
    chars: [u8; FRAME_LEN],
}

impl RfidFrame {
    pub fn from_chars(chars: [u8; FRAME_LEN]) -> Self {
        Self { chars }
    }

    pub fn as_chars(&self) -> &[u8; FRAME_LEN] {
        &self.chars
    }

    /// Build a well-formed frame for `tag`, checksum included
    pub fn for_tag(tag: TagId) -> Self {
        let bytes = tag_bytes(tag);
        let checksum = bytes.iter().fold(0u8, |acc, b| acc ^ b);
        let mut chars = [0u8; FRAME_LEN];
        for (i, b) in bytes.iter().chain(std::iter::once(&checksum)).enumerate() {
            chars[2 * i] = HEX_DIGITS[(b >> 4) as usize];
            chars[2 * i + 1] = HEX_DIGITS[(b & 0x0F) as usize];
        }
        Self { chars }
    }

    /// Wire bytes including STX and ETX
    pub fn to_wire(&self) -> [u8; FRAME_LEN + 2] {
        let mut wire = [0u8; FRAME_LEN + 2];
        wire[0] = STX;
        wire[1..=FRAME_LEN].copy_from_slice(&self.chars);
        wire[FRAME_LEN + 1] = ETX;
        wire
    }

    /// Decode the data and check it against the checksum
    pub fn validate(&self) -> Result<TagId> {
        let mut bytes = [0u8; 6];
        for (i, pair) in self.chars.chunks_exact(2).enumerate() {
            bytes[i] = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
        }

        let (data, checksum) = bytes.split_at(FRAME_DATA_LEN / 2);
        let expected = data.iter().fold(0u8, |acc, b| acc ^ b);
        if expected != checksum[0] {
            return Err(Error::ChecksumError {
                expected,
                actual: checksum[0],
            });
        }

        let id = data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        Ok(TagId(id))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn tag_bytes(tag: TagId) -> [u8; 5] {
    let be = tag.0.to_be_bytes();
    [be[3], be[4], be[5], be[6], be[7]]
}

fn hex_value(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(Error::InvalidFrame(format!("non-hex character {:#04x}", c))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    /// Waiting for STX
    Hunting,
    /// Collecting frame characters
    Collecting,
    /// All characters in, expecting ETX
    AwaitingEnd,
}

/// Byte-at-a-time frame assembler
pub struct FrameAssembler {
    buf: [u8; FRAME_LEN],
    len: usize,
    state: AssemblerState,
    discarded: u32,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: [0u8; FRAME_LEN],
            len: 0,
            state: AssemblerState::Hunting,
            discarded: 0,
        }
    }

    /// Feed one byte; returns the frame once it is complete.
    ///
    /// Completion only means the frame is well-delimited. Checksum
    /// validation is left to [`RfidFrame::validate`].
    pub fn push(&mut self, byte: u8) -> Option<RfidFrame> {
        if byte == STX {
            if self.state != AssemblerState::Hunting {
                self.discard("restarted by STX");
            }
            self.len = 0;
            self.state = AssemblerState::Collecting;
            return None;
        }

        match self.state {
            AssemblerState::Hunting => None,
            AssemblerState::Collecting => {
                self.buf[self.len] = byte;
                self.len += 1;
                if self.len == FRAME_LEN {
                    self.state = AssemblerState::AwaitingEnd;
                }
                None
            }
            AssemblerState::AwaitingEnd => {
                self.state = AssemblerState::Hunting;
                self.len = 0;
                if byte == ETX {
                    Some(RfidFrame::from_chars(self.buf))
                } else {
                    self.discard("missing ETX");
                    None
                }
            }
        }
    }

    /// Frames dropped for bad delimiting
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    fn discard(&mut self, reason: &str) {
        self.discarded = self.discarded.saturating_add(1);
        log::debug!("RFID: partial frame dropped ({})", reason);
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &[u8; FRAME_LEN] = b"0415AB3C9D1B";

    fn feed(assembler: &mut FrameAssembler, bytes: &[u8]) -> Vec<RfidFrame> {
        bytes.iter().filter_map(|&b| assembler.push(b)).collect()
    }

    #[test]
    fn test_validate_good_frame() {
        let tag = RfidFrame::from_chars(*VALID).validate().unwrap();
        assert_eq!(tag, TagId(0x04_15AB_3C9D));
        assert_eq!(tag.to_string(), "0415AB3C9D");
    }

    #[test]
    fn test_checksum_mismatch() {
        let err = RfidFrame::from_chars(*b"0415AB3C9D00").validate().unwrap_err();
        assert!(matches!(
            err,
            Error::ChecksumError {
                expected: 0x1B,
                actual: 0x00
            }
        ));
    }

    #[test]
    fn test_non_hex_rejected() {
        let err = RfidFrame::from_chars(*b"0415AB3C9DZZ").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn test_lowercase_hex_accepted() {
        assert!(RfidFrame::from_chars(*b"0415ab3c9d1b").is_valid());
    }

    #[test]
    fn test_for_tag_roundtrip() {
        let frame = RfidFrame::for_tag(TagId(0x04_15AB_3C9D));
        assert_eq!(frame.as_chars(), VALID);
    }

    #[test]
    fn test_assembles_delimited_frame() {
        let mut assembler = FrameAssembler::new();
        let wire = RfidFrame::from_chars(*VALID).to_wire();

        let frames = feed(&mut assembler, &wire);
        assert_eq!(frames, vec![RfidFrame::from_chars(*VALID)]);
    }

    #[test]
    fn test_ignores_noise_between_frames() {
        let mut assembler = FrameAssembler::new();
        let mut bytes = vec![0xFF, b'X', 0x00];
        bytes.extend_from_slice(&RfidFrame::from_chars(*VALID).to_wire());
        bytes.extend_from_slice(b"junk");
        bytes.extend_from_slice(&RfidFrame::from_chars(*VALID).to_wire());

        assert_eq!(feed(&mut assembler, &bytes).len(), 2);
        assert_eq!(assembler.discarded(), 0);
    }

    #[test]
    fn test_missing_etx_discards() {
        let mut assembler = FrameAssembler::new();
        let mut bytes = vec![STX];
        bytes.extend_from_slice(VALID);
        bytes.push(b'7');
        assert!(feed(&mut assembler, &bytes).is_empty());
        assert_eq!(assembler.discarded(), 1);
    }

    #[test]
    fn test_stx_restarts_truncated_frame() {
        let mut assembler = FrameAssembler::new();
        let mut bytes = vec![STX, b'0', b'4', b'1'];
        bytes.extend_from_slice(&RfidFrame::from_chars(*VALID).to_wire());
        let frames = feed(&mut assembler, &bytes);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_valid());
        assert_eq!(assembler.discarded(), 1);
    }
}
