//! SensorFlow firmware library.
//!
//! A reactive sensor dataflow engine for an ESP32 weather station:
//! producers sample or count, transforms calibrate, sinks publish, and a
//! single cooperative [`scheduler::Reactor`] drives it all.  Every module
//! builds and tests on the host; ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` inside each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod graph;
pub mod pins;
pub mod scheduler;
pub mod sensors;
pub mod signalk;
pub mod sinks;
pub mod transforms;

pub use error::{Error, Result};
