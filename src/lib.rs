//! Khoji - beacon-seeking navigation for a small differential-drive robot
//!
//! The robot sweeps until its receiver points it at a beacon, drives in
//! under closed-loop steering until an RFID read confirms the tag, then
//! retraces every recorded motion backwards to where it started.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     main loop (navigator)                  │
//! │  sensor ─▶ classifier ─▶ state machine ─▶ motors, display  │
//! └───────────────▲──────────────────────────▲────────────────┘
//!                 │ mailbox                  │ mode + move log
//!       ┌─────────┴────────┐        ┌────────┴─────────┐
//!       │  beacon reader   │        │   tick source    │
//!       │ (RFID transport) │        │ (timing service) │
//!       └──────────────────┘        └──────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`navigation`]: mission modes and the state machine
//! - [`sensor`]: receiver smoothing and steering classification
//! - [`recorder`]: the move log
//! - [`timing`]: per-tick segment accounting and its thread
//! - [`beacon`]: RFID frames and the detection gate
//! - [`shared`]: state shared with the event sources
//! - [`drivers`]: hardware capabilities
//! - [`devices`]: simulated hardware
//! - [`app`]: daemon wiring

pub mod app;
pub mod beacon;
pub mod config;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod navigation;
pub mod recorder;
pub mod sensor;
pub mod shared;
pub mod timing;

pub use app::{App, MissionReport};
pub use config::Config;
pub use error::{Error, Result};
