//! Unified error types for the SensorFlow firmware.
//!
//! A single `Error` enum that every construction-time check funnels into,
//! keeping graph bring-up uniform: wiring either succeeds completely or the
//! firmware refuses to enter its run phase.  All variants are `Copy` so they
//! can be passed around without allocation.
//!
//! Runtime emissions have no error channel at all; only building the graph
//! (and the surrounding config/storage plumbing) can fail.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A node or timer was configured with an unusable value
    /// (zero interval, zero reporting period, ...).
    InvalidConfig(&'static str),
    /// A fixed-capacity table (timers, subscribers, registry) is full.
    CapacityExceeded(&'static str),
    /// A subscription was attempted after the producer entered its run phase.
    GraphSealed,
    /// A rate transform was wired behind a producer whose reporting period
    /// differs from the one the transform was configured with.
    CadenceMismatch { expected_ms: u32, actual_ms: u32 },
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::CapacityExceeded(what) => write!(f, "capacity exceeded: {what}"),
            Self::GraphSealed => write!(f, "graph is sealed, subscriptions are closed"),
            Self::CadenceMismatch {
                expected_ms,
                actual_ms,
            } => write!(
                f,
                "cadence mismatch: rate expects {expected_ms} ms, upstream reports every {actual_ms} ms"
            ),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
