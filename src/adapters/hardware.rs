//! Hardware adapters: the board's plain pin I/O and the environment chip,
//! exposed through [`BoardPort`] and [`EnvironmentPort`].
//!
//! On `target_os = "espidf"` [`BoardAdapter`] reads ADC1 and GPIO through
//! [`hw_init`](crate::drivers::hw_init).  On the host it keeps pin state
//! in memory so the whole station runs as a simulation.

#[cfg(not(target_os = "espidf"))]
use std::collections::BTreeMap;

use crate::app::ports::{BoardPort, EnvironmentPort};
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// ADC and GPIO access for the station board.
#[derive(Default)]
pub struct BoardAdapter {
    #[cfg(not(target_os = "espidf"))]
    analog: BTreeMap<i32, u16>,
    #[cfg(not(target_os = "espidf"))]
    levels: BTreeMap<i32, bool>,
}

impl BoardAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BoardAdapter {
    /// Set the simulated raw ADC reading for `gpio`.
    pub fn set_analog(&mut self, gpio: i32, raw: u16) {
        self.analog.insert(gpio, raw.min(4095));
    }

    /// Set the simulated level of `gpio`.  Unset inputs read high
    /// (pull-up).
    pub fn set_level(&mut self, gpio: i32, high: bool) {
        self.levels.insert(gpio, high);
    }
}

#[cfg(target_os = "espidf")]
impl BoardPort for BoardAdapter {
    fn analog_raw(&mut self, gpio: i32) -> u16 {
        if gpio == pins::ANALOG_INPUT_GPIO {
            hw_init::adc1_read(pins::ANALOG_INPUT_ADC_CHANNEL)
        } else {
            log::warn!("BoardAdapter: GPIO {} has no ADC channel configured", gpio);
            0
        }
    }

    fn digital_level(&mut self, gpio: i32) -> bool {
        hw_init::gpio_read(gpio)
    }

    fn toggle_output(&mut self, gpio: i32) -> bool {
        let next = !hw_init::gpio_read(gpio);
        hw_init::gpio_write(gpio, next);
        next
    }
}

#[cfg(not(target_os = "espidf"))]
impl BoardPort for BoardAdapter {
    fn analog_raw(&mut self, gpio: i32) -> u16 {
        self.analog.get(&gpio).copied().unwrap_or(0)
    }

    fn digital_level(&mut self, gpio: i32) -> bool {
        self.levels.get(&gpio).copied().unwrap_or(true)
    }

    fn toggle_output(&mut self, gpio: i32) -> bool {
        let level = self.levels.entry(gpio).or_insert(false);
        *level = !*level;
        *level
    }
}

/// Synthetic temperature / humidity / pressure source.
///
/// Each read advances a slow daily-cycle-like drift so published values
/// move.  Stands in for the I²C chip driver on the host and on boards
/// without the chip fitted.
pub struct SimEnvironment {
    step: u32,
    base_temperature_c: f32,
    base_humidity_percent: f32,
    base_pressure_pa: f32,
}

impl Default for SimEnvironment {
    fn default() -> Self {
        Self {
            step: 0,
            base_temperature_c: 21.0,
            base_humidity_percent: 45.0,
            base_pressure_pa: 101_325.0,
        }
    }
}

impl SimEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    fn phase(&mut self) -> f32 {
        self.step = self.step.wrapping_add(1);
        (self.step % 360) as f32 * core::f32::consts::PI / 180.0
    }
}

impl EnvironmentPort for SimEnvironment {
    fn read_temperature_c(&mut self) -> f32 {
        self.base_temperature_c + 2.5 * self.phase().sin()
    }

    fn read_humidity_percent(&mut self) -> f32 {
        (self.base_humidity_percent - 10.0 * self.phase().sin()).clamp(0.0, 100.0)
    }

    fn read_pressure_pa(&mut self) -> f32 {
        self.base_pressure_pa + 150.0 * self.phase().cos()
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
