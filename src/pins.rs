//! GPIO / peripheral pin assignments for the weather station board.
//!
//! Single source of truth: every adapter references this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pulse inputs (interrupt-driven, debounced)
// ---------------------------------------------------------------------------

/// Tipping-bucket rain gauge reed switch, falling edge per tip.
/// GPIO 35 is input-only with no internal pull-up; the board fits an
/// external 10 kΩ pull-up.
pub const RAIN_PULSE_GPIO: i32 = 35;
/// Cup anemometer reed switch, falling edge per revolution.
pub const WIND_PULSE_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Analog (ADC1)
// ---------------------------------------------------------------------------

/// General-purpose analog input, 0 – 3.3 V.
/// ADC1 channel 0 (GPIO 36 / SENSOR_VP on ESP32).
pub const ANALOG_INPUT_GPIO: i32 = 36;
pub const ANALOG_INPUT_ADC_CHANNEL: u32 = 0;
/// ADC attenuation (11 dB → full 0 – 3.3 V range).
pub const ANALOG_INPUT_ADC_ATTEN: u32 = 3;

// ---------------------------------------------------------------------------
// Digital I/O
// ---------------------------------------------------------------------------

/// Toggled output.  Jumper it to one of the inputs below for a bench test.
pub const DIGITAL_OUTPUT_GPIO: i32 = 15;
/// Change-triggered input (pull-up, both edges).
pub const CHANGE_INPUT_GPIO: i32 = 14;
/// Polled input (pull-up).
pub const POLLED_INPUT_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// I²C bus (temperature / humidity / pressure chip at 0x77)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const ENVIRONMENT_I2C_ADDR: u8 = 0x77;
