//! Port traits forming the hexagonal boundary between the dataflow core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ sensors / transforms / sinks (domain)
//! ```
//!
//! Driven adapters (clock, chip drivers, board I/O, publishers, storage)
//! implement these traits.  The graph only ever sees the traits, so the
//! whole pipeline runs on the host against mocks.
//!
//! ## Contract notes
//!
//! - **PublishPort** is called synchronously from inside an emission; it
//!   must return promptly and queue any slow work itself.
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers must handle every variant explicitly.

use crate::config::StationConfig;
use crate::signalk::SkUpdate;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: monotonic time → reactor)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock driving [`Reactor::tick`](crate::scheduler::Reactor::tick).
pub trait ClockPort {
    /// Milliseconds since boot.  Never goes backwards.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Environment port (driven adapter: sensor chip → domain)
// ───────────────────────────────────────────────────────────────

/// The combined temperature / humidity / pressure chip.  Register-level
/// bring-up belongs to the adapter; the domain only samples.
pub trait EnvironmentPort {
    /// Air temperature in degrees Celsius.
    fn read_temperature_c(&mut self) -> f32;

    /// Relative humidity in percent (0–100).
    fn read_humidity_percent(&mut self) -> f32;

    /// Barometric pressure in pascal.
    fn read_pressure_pa(&mut self) -> f32;

    /// True when readings are synthesized rather than measured.
    fn is_simulated(&self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Board port (driven adapter: GPIO / ADC ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Plain pin I/O used by polled producers and periodic housekeeping tasks.
pub trait BoardPort {
    /// Raw 12-bit ADC reading for the given GPIO.
    fn analog_raw(&mut self, gpio: i32) -> u16;

    /// Current logic level of a digital input.
    fn digital_level(&mut self, gpio: i32) -> bool;

    /// Invert a digital output.  Returns the new level.
    fn toggle_output(&mut self, gpio: i32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → telemetry transport)
// ───────────────────────────────────────────────────────────────

/// Hands a finished value to the telemetry collaborator.
///
/// Takes `&self`: one publisher is shared by every output node, so
/// implementations keep their own interior mutability.
pub trait PublishPort {
    fn publish(&self, update: &SkUpdate<'_>) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists station configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`StationConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<StationConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &StationConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic, no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Destination buffer is smaller than the stored value.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`PublishPort`] operations.  Never propagated into the
/// graph: output nodes log and count them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// Transport is not connected to a server.
    NotConnected,
    /// Outbound queue is full.
    QueueFull,
    /// The update could not be encoded.
    Encoding,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::QueueFull => write!(f, "queue full"),
            Self::Encoding => write!(f, "encoding failed"),
        }
    }
}
