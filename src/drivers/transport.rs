//! Byte transport for the RFID reader

use crate::error::Result;

/// Byte source feeding the beacon reader thread
pub trait Transport: Send {
    /// Read available bytes into `buffer`, returning how many were read.
    ///
    /// Returns `Ok(0)` when nothing arrived within the transport's timeout.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        (**self).read(buffer)
    }
}

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

#[cfg(feature = "serial")]
mod serial {
    use super::Transport;
    use crate::error::Result;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::Read;
    use std::time::Duration;

    /// UART connection to a hardware RFID reader (8N1, no flow control)
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port
        ///
        /// # Arguments
        /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
        /// * `baud_rate` - Baud rate (RDM6300-class readers use 9600)
        pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
            let port = serialport::new(path, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_millis(5))
                .open()?;

            log::info!("Opened RFID reader on {} at {} baud", path, baud_rate);
            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
            match self.port.read(buffer) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(e.into()),
            }
        }
    }
}
