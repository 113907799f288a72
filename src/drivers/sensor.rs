//! Beacon receiver sampling capability

use crate::error::Result;

/// Source of raw beacon receiver readings (duty-cycle magnitude)
pub trait BeaconSensor: Send {
    /// Take one raw sample
    fn sample(&mut self) -> Result<u32>;
}

impl<S: BeaconSensor + ?Sized> BeaconSensor for Box<S> {
    fn sample(&mut self) -> Result<u32> {
        (**self).sample()
    }
}
