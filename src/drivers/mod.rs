//! Capabilities the navigation core drives or reads
//!
//! - [`motor`]: differential drive commands
//! - [`sensor`]: beacon receiver samples
//! - [`transport`]: RFID reader byte stream
//! - [`display`]: status text
//! - [`input`]: debounced reset button

pub mod display;
pub mod input;
pub mod motor;
pub mod sensor;
pub mod transport;

pub use display::{LogDisplay, StatusDisplay};
pub use input::{Debounced, ResetInput};
pub use motor::{Direction, DriveCommand, MotorDriver, Rotation, WheelCommand};
pub use sensor::BeaconSensor;
pub use transport::Transport;
