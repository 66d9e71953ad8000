//! Analog input: a polled 12-bit ADC reading scaled to a full-scale value.
//!
//! A full-scale of 3.3 reports the pin voltage; any other value maps the
//! ADC range linearly onto `0.0..=full_scale`.

use std::rc::Rc;

use crate::error::{Error, Result};

use super::repeat::RepeatSensor;

/// Largest raw value of the 12-bit converter.
pub const ADC_MAX: f32 = 4095.0;

/// Scale a raw reading onto `0.0..=full_scale`.
pub fn scale_raw(raw: u16, full_scale: f32) -> f32 {
    f32::from(raw) / ADC_MAX * full_scale
}

/// Build a periodic analog sensor around a raw ADC read.
pub fn analog_input(
    label: &'static str,
    interval_ms: u32,
    full_scale: f32,
    mut read_raw: impl FnMut() -> u16 + 'static,
) -> Result<Rc<RepeatSensor<f32>>> {
    if !full_scale.is_finite() || full_scale <= 0.0 {
        return Err(Error::InvalidConfig("analog full scale must be positive"));
    }
    RepeatSensor::new(label, interval_ms, move || scale_raw(read_raw(), full_scale))
}
