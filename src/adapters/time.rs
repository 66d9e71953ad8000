//! Clock adapters.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side simulation.
//!
//! [`ManualClock`] is a hand-stepped clock for tests and replay.

use core::cell::Cell;

use crate::app::ports::ClockPort;

/// Monotonic uptime clock for the ESP32.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads a free-running hardware counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

/// Millisecond timestamp for interrupt handlers.  Same time base as
/// [`Esp32TimeAdapter`]; 64 bits, so it does not wrap in service.
///
/// Safe to call from ISR context.
#[cfg(target_os = "espidf")]
pub fn isr_now_ms() -> u64 {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u64
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        let now = self.now_ms.get().saturating_add(ms);
        self.now_ms.set(now);
        now
    }

    /// Jump to `ms`.  Ignored if it would move the clock backwards.
    pub fn set(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().max(ms));
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}
