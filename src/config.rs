//! Station configuration parameters
//!
//! Every interval, debounce window, reporting period and calibration
//! default used to wire the station graph.  Values can be overridden
//! through a [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::EdgePolarity;
use crate::transforms::calibration::MAX_CALIBRATIONS;

/// Runtime override for one registered calibration cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOverride {
    /// Registry path, e.g. `/study/rain/calibrate`.
    pub path: String,
    pub scale: f32,
    /// Ignored by factor-only targets (rate transforms).
    #[serde(default)]
    pub offset: f32,
}

/// One debounced pulse input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Reporting window (milliseconds)
    pub report_interval_ms: u32,
    /// Minimum gap after an accepted edge (milliseconds)
    pub debounce_ms: u32,
    pub polarity: EdgePolarity,
    /// Physical units per pulse
    pub factor: f32,
}

/// Core station configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    // --- Polled sensors ---
    /// Temperature / humidity / pressure poll interval (milliseconds)
    pub environment_interval_ms: u32,
    /// Analog input poll interval (milliseconds)
    pub analog_interval_ms: u32,
    /// Value produced at the ADC's maximum input
    pub analog_full_scale: f32,
    /// Polled digital input interval (milliseconds)
    pub digital_poll_interval_ms: u32,

    // --- Change-triggered input ---
    /// How often the ISR latch is checked (milliseconds)
    pub change_scan_interval_ms: u32,

    // --- Output ---
    /// Digital output toggle period (milliseconds)
    pub toggle_interval_ms: u32,

    // --- Pulse counters ---
    /// Tipping-bucket rain gauge, mm per tip
    pub rain: CounterConfig,
    /// Cup anemometer, m/s per pulse per second
    pub wind: CounterConfig,

    // --- Calibration ---
    /// Overrides applied to live calibration cells after wiring
    #[serde(default)]
    pub calibrations: Vec<CalibrationOverride>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            environment_interval_ms: 2000,
            analog_interval_ms: 500,
            analog_full_scale: 3.3,
            digital_poll_interval_ms: 1000,

            change_scan_interval_ms: 10,

            toggle_interval_ms: 650,

            rain: CounterConfig {
                report_interval_ms: 5 * 60 * 1000,
                debounce_ms: 200, // switch is noisy
                polarity: EdgePolarity::Falling,
                factor: 0.18,
            },
            wind: CounterConfig {
                report_interval_ms: 3000,
                debounce_ms: 5, // 200 counts/s ceiling
                polarity: EdgePolarity::Falling,
                factor: 1.026,
            },

            calibrations: Vec::new(),
        }
    }
}

impl StationConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=3_600_000).contains(&self.environment_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "environment_interval_ms must be 100–3600000",
            ));
        }
        if !(10..=3_600_000).contains(&self.analog_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "analog_interval_ms must be 10–3600000",
            ));
        }
        if !self.analog_full_scale.is_finite() || self.analog_full_scale <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "analog_full_scale must be finite and > 0",
            ));
        }
        if !(10..=3_600_000).contains(&self.digital_poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "digital_poll_interval_ms must be 10–3600000",
            ));
        }
        if !(1..=1000).contains(&self.change_scan_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "change_scan_interval_ms must be 1–1000",
            ));
        }
        if !(10..=60_000).contains(&self.toggle_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "toggle_interval_ms must be 10–60000",
            ));
        }
        validate_counter(&self.rain, &RAIN_MESSAGES)?;
        validate_counter(&self.wind, &WIND_MESSAGES)?;

        if self.calibrations.len() > MAX_CALIBRATIONS {
            return Err(ConfigError::ValidationFailed("too many calibration overrides"));
        }
        for over in &self.calibrations {
            if over.path.is_empty() {
                return Err(ConfigError::ValidationFailed("calibration path must not be empty"));
            }
            if !over.scale.is_finite() || !over.offset.is_finite() {
                return Err(ConfigError::ValidationFailed(
                    "calibration scale and offset must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// Validation messages for one counter, kept `'static` for [`ConfigError`].
struct CounterMessages {
    period: &'static str,
    debounce: &'static str,
    factor: &'static str,
}

const RAIN_MESSAGES: CounterMessages = CounterMessages {
    period: "rain.report_interval_ms must be 1000–3600000",
    debounce: "rain.debounce_ms must be below report_interval_ms and <= 10000",
    factor: "rain.factor must be finite and > 0",
};

const WIND_MESSAGES: CounterMessages = CounterMessages {
    period: "wind.report_interval_ms must be 1000–3600000",
    debounce: "wind.debounce_ms must be below report_interval_ms and <= 10000",
    factor: "wind.factor must be finite and > 0",
};

fn validate_counter(c: &CounterConfig, msg: &CounterMessages) -> Result<(), ConfigError> {
    if !(1000..=3_600_000).contains(&c.report_interval_ms) {
        return Err(ConfigError::ValidationFailed(msg.period));
    }
    if c.debounce_ms > 10_000 || c.debounce_ms >= c.report_interval_ms {
        return Err(ConfigError::ValidationFailed(msg.debounce));
    }
    if !c.factor.is_finite() || c.factor <= 0.0 {
        return Err(ConfigError::ValidationFailed(msg.factor));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert_eq!(StationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn debounce_is_much_shorter_than_reporting() {
        let c = StationConfig::default();
        assert!(c.rain.debounce_ms * 100 < c.rain.report_interval_ms);
        assert!(c.wind.debounce_ms * 100 < c.wind.report_interval_ms);
    }

    #[test]
    fn rejects_zero_intervals() {
        let mut c = StationConfig::default();
        c.environment_interval_ms = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));

        let mut c = StationConfig::default();
        c.change_scan_interval_ms = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_debounce_not_below_report_period() {
        let mut c = StationConfig::default();
        c.wind.debounce_ms = c.wind.report_interval_ms;
        assert_eq!(
            c.validate(),
            Err(ConfigError::ValidationFailed(
                "wind.debounce_ms must be below report_interval_ms and <= 10000"
            ))
        );
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut c = StationConfig::default();
        c.rain.factor = f32::NAN;
        assert!(c.validate().is_err());

        let mut c = StationConfig::default();
        c.calibrations.push(CalibrationOverride {
            path: "/study/temperature/calibrate".into(),
            scale: 1.0,
            offset: f32::INFINITY,
        });
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_empty_calibration_path() {
        let mut c = StationConfig::default();
        c.calibrations.push(CalibrationOverride {
            path: String::new(),
            scale: 1.0,
            offset: 0.0,
        });
        assert!(c.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let mut c = StationConfig::default();
        c.calibrations.push(CalibrationOverride {
            path: "/study/rain/calibrate".into(),
            scale: 0.2,
            offset: 0.0,
        });
        let json = serde_json::to_string(&c).unwrap();
        let c2: StationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn missing_calibrations_default_to_empty() {
        let c = StationConfig::default();
        let mut value = serde_json::to_value(&c).unwrap();
        value.as_object_mut().unwrap().remove("calibrations");
        let c2: StationConfig = serde_json::from_value(value).unwrap();
        assert!(c2.calibrations.is_empty());
    }

    #[test]
    fn postcard_roundtrip() {
        let c = StationConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: StationConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }
}
