//! Log-based publisher adapter.
//!
//! Implements [`PublishPort`] by writing each update as one JSON line to
//! the logger (UART / USB-CDC on the device, stderr in simulation).
//! A network transport would implement the same trait.

use core::cell::Cell;

use log::info;

use crate::app::ports::{PublishError, PublishPort};
use crate::signalk::SkUpdate;

/// Adapter that logs every update to the serial console.
#[derive(Default)]
pub struct LogPublisher {
    lines: Cell<u32>,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates written so far.
    pub fn lines(&self) -> u32 {
        self.lines.get()
    }

    /// The JSON line written for `update`.
    pub fn encode(update: &SkUpdate<'_>) -> Result<String, PublishError> {
        serde_json::to_string(update).map_err(|_| PublishError::Encoding)
    }
}

impl PublishPort for LogPublisher {
    fn publish(&self, update: &SkUpdate<'_>) -> Result<(), PublishError> {
        let line = Self::encode(update)?;
        info!("SK | {}", line);
        self.lines.set(self.lines.get().wrapping_add(1));
        Ok(())
    }
}
