//! Beacon receiver signal processing

pub mod classifier;

pub use classifier::{Classifier, SensorState, SteeringDirective};
