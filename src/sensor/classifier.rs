//! Beacon receiver smoothing and steering classification

use crate::config::SensorConfig;

/// Fixed-point scale of the running average (8 fractional bits)
const SMOOTHING_SCALE: u64 = 256;

/// Steering decision derived from the smoothed receiver signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringDirective {
    BeaconAhead,
    BeaconOffToRight,
    BeaconOffToLeft,
    NoBeacon,
}

impl SteeringDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            SteeringDirective::BeaconAhead => "AHEAD",
            SteeringDirective::BeaconOffToRight => "RIGHT",
            SteeringDirective::BeaconOffToLeft => "LEFT",
            SteeringDirective::NoBeacon => "NONE",
        }
    }
}

/// Raw reading plus its moving average
///
/// Only [`Classifier::classify`] mutates this.
#[derive(Debug, Clone, Default)]
pub struct SensorState {
    raw: u32,
    smoothed: u32,
    /// Running average scaled by [`SMOOTHING_SCALE`]
    accumulator: u64,
    /// Samples folded in since the last reset
    samples: u32,
    /// Consecutive samples whose smoothed change stayed within the settle bound
    stable_run: u32,
}

impl SensorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last raw sample after clamping
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Current smoothed value
    pub fn smoothed(&self) -> u32 {
        self.smoothed
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fixed-weight moving average classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    config: SensorConfig,
}

impl Classifier {
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }

    /// Fold one raw sample into `state` and classify the smoothed value.
    ///
    /// Samples above `max_sample` are clamped rather than rejected.
    pub fn classify(&self, raw_sample: u32, state: &mut SensorState) -> SteeringDirective {
        let raw = if raw_sample > self.config.max_sample {
            log::trace!(
                "Sensor sample {} above range, clamped to {}",
                raw_sample,
                self.config.max_sample
            );
            self.config.max_sample
        } else {
            raw_sample
        };

        let previous = state.smoothed;
        let weight = u64::from(self.config.smoothing_weight.max(1));

        // new = old + (raw - old) / W, kept in fixed point so the average
        // converges onto the sample instead of stalling short of it
        let target = u64::from(raw) * SMOOTHING_SCALE;
        if target >= state.accumulator {
            state.accumulator += (target - state.accumulator) / weight;
        } else {
            state.accumulator -= (state.accumulator - target) / weight;
        }
        state.smoothed = ((state.accumulator + SMOOTHING_SCALE / 2) / SMOOTHING_SCALE) as u32;
        state.raw = raw;
        state.samples = state.samples.saturating_add(1);

        if previous.abs_diff(state.smoothed) <= self.config.settle_delta {
            state.stable_run = state.stable_run.saturating_add(1);
        } else {
            state.stable_run = 0;
        }

        self.directive_for(state.smoothed)
    }

    /// Map a smoothed value onto a directive.
    ///
    /// A value has to strictly exceed a threshold to land in the band above
    /// it, so a value sitting exactly on a threshold takes the lower band.
    pub fn directive_for(&self, smoothed: u32) -> SteeringDirective {
        let c = &self.config;
        if smoothed <= c.signal_floor {
            SteeringDirective::NoBeacon
        } else if smoothed <= c.ahead_low {
            SteeringDirective::BeaconOffToLeft
        } else if smoothed <= c.ahead_high {
            SteeringDirective::BeaconAhead
        } else {
            SteeringDirective::BeaconOffToRight
        }
    }

    /// True once the average has filled its window and stopped moving
    pub fn is_settled(&self, state: &SensorState) -> bool {
        state.samples >= self.config.smoothing_weight
            && state.stable_run >= self.config.settle_samples
    }
}
