//! Mission mode and the navigation state machine

pub mod mode;
pub mod navigator;

pub use mode::RobotMode;
pub use navigator::{Navigator, Phase};
