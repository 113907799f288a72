//! Device implementations
//!
//! - [`sim`]: simulated chassis, receiver, RFID reader and operator

pub mod sim;
