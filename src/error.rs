//! Error types for Khoji

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Khoji error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Robot mode byte outside the known set.
    ///
    /// Only reachable through memory corruption or a missed transition, so
    /// the navigator halts instead of recovering.
    #[error("Invalid robot mode: {0:#04x}")]
    InvalidMode(u8),

    /// Move log has no room for another segment
    #[error("Move log full ({capacity} segments)")]
    MoveLogFull {
        /// Fixed capacity of the log
        capacity: usize,
    },

    /// RFID frame checksum mismatch
    #[error("Checksum error: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumError {
        /// Checksum computed over the data bytes
        expected: u8,
        /// Checksum carried by the frame
        actual: u8,
    },

    /// Malformed RFID frame
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
