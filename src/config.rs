//! Configuration for the Khoji daemon
//!
//! Loaded from a TOML file. Every field has a default tuned for the stock
//! chassis and beacon receiver, so a partial (or empty) file is valid.

use crate::devices::sim::config::SimulationConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub rfid: RfidConfig,
    #[serde(default)]
    pub reset: ResetConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Move timing tick source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Period of one move-timing tick in milliseconds (default: 10)
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
}

fn default_tick_period_ms() -> u64 {
    10
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
        }
    }
}

/// Beacon receiver sampling and classification
///
/// Samples are duty-cycle readings in `0..=max_sample`. The receiver encodes
/// the beacon bearing in the duty: low values mean the beacon is to the left,
/// high values to the right, and a dead carrier reads near zero.
///
/// Bands (ties resolve to the lower band):
///
/// | Smoothed value                       | Directive          |
/// |--------------------------------------|--------------------|
/// | `<= signal_floor`                    | `NoBeacon`         |
/// | `signal_floor < v <= ahead_low`      | `BeaconOffToLeft`  |
/// | `ahead_low < v <= ahead_high`        | `BeaconAhead`      |
/// | `> ahead_high`                       | `BeaconOffToRight` |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Sensor poll cadence in milliseconds (default: 20)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Largest valid raw sample; larger readings are clamped (default: 1000)
    #[serde(default = "default_max_sample")]
    pub max_sample: u32,

    /// Moving average weight W: new = (old * (W - 1) + raw) / W (default: 8)
    #[serde(default = "default_smoothing_weight")]
    pub smoothing_weight: u32,

    /// Carrier floor below which no beacon is seen (default: 80)
    #[serde(default = "default_signal_floor")]
    pub signal_floor: u32,

    /// Upper edge of the "off to the left" band (default: 420)
    #[serde(default = "default_ahead_low")]
    pub ahead_low: u32,

    /// Upper edge of the "ahead" band (default: 580)
    #[serde(default = "default_ahead_high")]
    pub ahead_high: u32,

    /// Largest per-sample change of the smoothed value still counted as stable (default: 2)
    #[serde(default = "default_settle_delta")]
    pub settle_delta: u32,

    /// Consecutive stable samples required before classification is trusted (default: 8)
    #[serde(default = "default_settle_samples")]
    pub settle_samples: u32,
}

fn default_poll_interval_ms() -> u64 {
    20
}
fn default_max_sample() -> u32 {
    1000
}
fn default_smoothing_weight() -> u32 {
    8
}
fn default_signal_floor() -> u32 {
    80
}
fn default_ahead_low() -> u32 {
    420
}
fn default_ahead_high() -> u32 {
    580
}
fn default_settle_delta() -> u32 {
    2
}
fn default_settle_samples() -> u32 {
    8
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_sample: default_max_sample(),
            smoothing_weight: default_smoothing_weight(),
            signal_floor: default_signal_floor(),
            ahead_low: default_ahead_low(),
            ahead_high: default_ahead_high(),
            settle_delta: default_settle_delta(),
            settle_samples: default_settle_samples(),
        }
    }
}

/// Wheel speeds (0-100) for each motion primitive
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Outer (left, forward) wheel speed of the clockwise search sweep
    #[serde(default = "default_sweep_outer_speed")]
    pub sweep_outer_speed: u8,

    /// Inner (right, reverse) wheel speed of the search sweep.
    ///
    /// Kept below the outer speed so the sweep creeps forward while turning.
    #[serde(default = "default_sweep_inner_speed")]
    pub sweep_inner_speed: u8,

    /// Speed of both wheels while approaching
    #[serde(default = "default_forward_speed")]
    pub forward_speed: u8,

    /// Spin speed of corrective turns during approach
    #[serde(default = "default_correction_speed")]
    pub correction_speed: u8,
}

fn default_sweep_outer_speed() -> u8 {
    30
}
fn default_sweep_inner_speed() -> u8 {
    18
}
fn default_forward_speed() -> u8 {
    50
}
fn default_correction_speed() -> u8 {
    25
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sweep_outer_speed: default_sweep_outer_speed(),
            sweep_inner_speed: default_sweep_inner_speed(),
            forward_speed: default_forward_speed(),
            correction_speed: default_correction_speed(),
        }
    }
}

/// RFID reader connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RfidConfig {
    /// Serial port of a hardware reader. `None` uses the simulated reader.
    #[serde(default)]
    pub port: Option<String>,

    /// Reader baud rate (default: 9600)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    9600
}

impl Default for RfidConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
        }
    }
}

/// Operator reset button
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResetConfig {
    /// Time the button must be held before a press registers (default: 100)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Status display
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Characters per line (default: 16)
    #[serde(default = "default_columns")]
    pub columns: usize,
}

fn default_columns() -> usize {
    16
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use khoji::Config;
    ///
    /// let config = Config::load("khoji.toml")?;
    /// # Ok::<(), khoji::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check cross-field constraints the type system can't express
    pub fn validate(&self) -> Result<()> {
        if self.timing.tick_period_ms == 0 {
            return Err(Error::Config("timing.tick_period_ms must be > 0".into()));
        }

        let s = &self.sensor;
        if s.poll_interval_ms == 0 {
            return Err(Error::Config("sensor.poll_interval_ms must be > 0".into()));
        }
        if s.smoothing_weight == 0 {
            return Err(Error::Config("sensor.smoothing_weight must be >= 1".into()));
        }
        if !(s.signal_floor < s.ahead_low && s.ahead_low < s.ahead_high && s.ahead_high < s.max_sample)
        {
            return Err(Error::Config(format!(
                "sensor thresholds must satisfy signal_floor < ahead_low < ahead_high < max_sample \
                 (got {} / {} / {} / {})",
                s.signal_floor, s.ahead_low, s.ahead_high, s.max_sample
            )));
        }

        let m = &self.motion;
        for (name, speed) in [
            ("sweep_outer_speed", m.sweep_outer_speed),
            ("sweep_inner_speed", m.sweep_inner_speed),
            ("forward_speed", m.forward_speed),
            ("correction_speed", m.correction_speed),
        ] {
            if speed > 100 {
                return Err(Error::Config(format!("motion.{} must be <= 100", name)));
            }
        }
        if m.sweep_inner_speed >= m.sweep_outer_speed {
            return Err(Error::Config(
                "motion.sweep_inner_speed must be below sweep_outer_speed".into(),
            ));
        }

        if self.display.columns == 0 {
            return Err(Error::Config("display.columns must be > 0".into()));
        }

        self.simulation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.tick_period_ms, 10);
        assert_eq!(config.sensor.smoothing_weight, 8);
        assert_eq!(config.display.columns, 16);
        assert!(config.rfid.port.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[sensor]
signal_floor = 50

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.sensor.signal_floor, 50);
        assert_eq!(config.sensor.ahead_low, 420);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.motion.forward_speed, 50);
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let mut config = Config::default();
        config.sensor.ahead_low = 600;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_symmetric_sweep_rejected() {
        let mut config = Config::default();
        config.motion.sweep_inner_speed = config.motion.sweep_outer_speed;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("khoji.toml");

        let mut config = Config::default();
        config.timing.tick_period_ms = 5;
        config.rfid.port = Some("/dev/ttyUSB0".to_string());
        config.to_file(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.timing.tick_period_ms, 5);
        assert_eq!(loaded.rfid.port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[timing\ntick_period_ms = ").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }
}
