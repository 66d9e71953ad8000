//! Application layer.
//!
//! [`ports`] defines the traits the dataflow core uses to reach the
//! outside world; [`station`] wires the weather station graph on top of
//! them.  Nothing here touches hardware directly, so the whole station
//! runs on the host against mock adapters.

pub mod ports;
pub mod station;
