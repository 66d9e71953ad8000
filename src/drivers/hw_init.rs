//! One-shot hardware peripheral initialization and GPIO interrupt
//! handlers.
//!
//! Configures ADC1, GPIO directions and the per-pin ISR service using raw
//! ESP-IDF sys calls.  Called once from `main()` before the reactor loop
//! starts.  The ISR-side state lives here as `static`s because ESP-IDF
//! interrupt callbacks cannot capture closures.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::StationConfig;
#[cfg(target_os = "espidf")]
use crate::pins;
use crate::sensors::{LevelLatch, PulseAccumulator};
#[cfg(target_os = "espidf")]
use crate::sensors::EdgePolarity;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── ISR-shared state ──────────────────────────────────────────

/// Rain gauge tips.  Debounce window is set from config at bring-up.
pub static RAIN_PULSES: PulseAccumulator = PulseAccumulator::new(0);
/// Anemometer revolutions.
pub static WIND_PULSES: PulseAccumulator = PulseAccumulator::new(0);
/// Level of the change-triggered input.
pub static CHANGE_INPUT: LevelLatch = LevelLatch::new();

#[cfg(target_os = "espidf")]
pub fn init_peripherals(cfg: &StationConfig) -> crate::Result<()> {
    // SAFETY: Called once from main() before the reactor loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_isr_service(cfg)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_cfg: &StationConfig) -> crate::Result<()> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// reactor-side ADC read path.  `init_adc()` completes before the loop.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: pins::ANALOG_INPUT_ADC_ATTEN,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::ANALOG_INPUT_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=analog input)", pins::ANALOG_INPUT_ADC_CHANNEL);
    Ok(())
}

/// Raw 12-bit reading, 0 on a driver error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; reactor-thread access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let input_pins = [
        pins::RAIN_PULSE_GPIO,
        pins::WIND_PULSE_GPIO,
        pins::CHANGE_INPUT_GPIO,
        pins::POLLED_INPUT_GPIO,
    ];

    for &pin in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // Input-output mode so the toggle task can read back the level.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DIGITAL_OUTPUT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pins::DIGITAL_OUTPUT_GPIO, 0) };

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to a pin configured in
    // init_gpio_outputs(). Reactor thread only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn rain_gpio_isr(_arg: *mut core::ffi::c_void) {
    RAIN_PULSES.on_edge(crate::adapters::time::isr_now_ms());
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn wind_gpio_isr(_arg: *mut core::ffi::c_void) {
    WIND_PULSES.on_edge(crate::adapters::time::isr_now_ms());
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn change_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let high = unsafe { gpio_get_level(pins::CHANGE_INPUT_GPIO) } != 0;
    CHANGE_INPUT.on_level(high);
}

#[cfg(target_os = "espidf")]
fn intr_type(polarity: EdgePolarity) -> gpio_int_type_t {
    match polarity {
        EdgePolarity::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
        EdgePolarity::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
        EdgePolarity::Change => gpio_int_type_t_GPIO_INTR_ANYEDGE,
    }
}

/// Install the per-pin GPIO ISR service and register the handlers.
#[cfg(target_os = "espidf")]
unsafe fn init_isr_service(cfg: &StationConfig) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed. Handlers below only touch the
    // interrupt-safe statics above.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::RAIN_PULSE_GPIO, intr_type(cfg.rain.polarity));
        gpio_isr_handler_add(pins::RAIN_PULSE_GPIO, Some(rain_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::RAIN_PULSE_GPIO);

        gpio_set_intr_type(pins::WIND_PULSE_GPIO, intr_type(cfg.wind.polarity));
        gpio_isr_handler_add(pins::WIND_PULSE_GPIO, Some(wind_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::WIND_PULSE_GPIO);

        // Change input: any edge.
        gpio_set_intr_type(pins::CHANGE_INPUT_GPIO, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        gpio_isr_handler_add(pins::CHANGE_INPUT_GPIO, Some(change_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::CHANGE_INPUT_GPIO);

        // Seed the latch so the first scan reports the boot level.
        CHANGE_INPUT.on_level(gpio_get_level(pins::CHANGE_INPUT_GPIO) != 0);

        info!("hw_init: ISR service installed (rain, wind, change input)");
    }
    Ok(())
}
