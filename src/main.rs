//! SensorFlow Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardAdapter   SimEnvironment   LogPublisher   ConfigStore    │
//! │  (BoardPort)    (EnvironmentPort)(PublishPort)  (ConfigPort)   │
//! │  Esp32TimeAdapter (ClockPort)    GPIO ISRs → static latches    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Station graph: sensors → transforms → SkOutputs       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Reactor (cooperative timers) · Watchdog                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use sensorflow::adapters::config_store::MemoryConfigStore;
use sensorflow::adapters::hardware::{BoardAdapter, SimEnvironment};
use sensorflow::adapters::log_sink::LogPublisher;
use sensorflow::adapters::time::Esp32TimeAdapter;
use sensorflow::app::ports::{ClockPort, ConfigPort, PublishPort};
use sensorflow::app::station::{Station, StationIo};
use sensorflow::config::StationConfig;
use sensorflow::drivers::hw_init;
use sensorflow::drivers::watchdog::Watchdog;

/// Longest the loop sleeps between ticks.
const MAX_IDLE_MS: u64 = 10;
/// Interval of the diagnostics log line.
const DIAGNOSTICS_INTERVAL_MS: u64 = 60_000;

fn main() -> Result<()> {
    // ── 1. Bootstrap + logger ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  SensorFlow v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (stored or defaults) ────────────────────────
    let store = MemoryConfigStore::in_memory();
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            StationConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(&config) {
        error!("HAL init failed: {}, halting", e);
        return Err(e.into());
    }

    // ── 4. Adapters ───────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let publisher: Rc<dyn PublishPort> = Rc::new(LogPublisher::new());
    let io = StationIo {
        // No environment chip driver on this board; the station logs a warning.
        environment: Rc::new(RefCell::new(SimEnvironment::new())),
        board: Rc::new(RefCell::new(BoardAdapter::new())),
        publisher,
        rain: &hw_init::RAIN_PULSES,
        wind: &hw_init::WIND_PULSES,
        change_input: &hw_init::CHANGE_INPUT,
    };

    // ── 5. Graph ──────────────────────────────────────────────
    let mut station = match Station::build(&config, io, clock.now_ms()) {
        Ok(station) => station,
        Err(e) => {
            error!("Station bring-up failed: {}, halting", e);
            return Err(e.into());
        }
    };

    #[cfg(not(target_os = "espidf"))]
    sim::attach_pulse_sources(&mut station)?;

    let watchdog = Watchdog::default();
    info!("System ready. Entering reactor loop.");

    // ── 6. Reactor loop ───────────────────────────────────────
    let mut next_diagnostics_ms = clock.now_ms() + DIAGNOSTICS_INTERVAL_MS;
    loop {
        let now = clock.now_ms();
        station.tick(now);
        watchdog.feed();

        if now >= next_diagnostics_ms {
            let d = station.diagnostics();
            info!(
                "DIAG | fired={} max_late={}ms | bounces rain={} wind={} | published={} failed={}",
                d.reactor.fired,
                d.reactor.max_lateness_ms,
                d.rain_bounces,
                d.wind_bounces,
                d.published,
                d.publish_failures,
            );
            next_diagnostics_ms = now + DIAGNOSTICS_INTERVAL_MS;
        }

        let idle = station
            .next_deadline()
            .map_or(MAX_IDLE_MS, |deadline| deadline.saturating_sub(clock.now_ms()))
            .min(MAX_IDLE_MS);
        std::thread::sleep(Duration::from_millis(idle));
    }
}

/// Host-only pulse generators standing in for the reed switches.
#[cfg(not(target_os = "espidf"))]
mod sim {
    use sensorflow::app::station::Station;
    use sensorflow::drivers::hw_init;

    /// One anemometer pulse every 250 ms (≈ 4.1 m/s).
    const WIND_PULSE_MS: u32 = 250;
    /// One bucket tip every 40 s.
    const RAIN_TIP_MS: u32 = 40_000;
    /// Flip the change input every 5 s.
    const CHANGE_FLIP_MS: u32 = 5_000;

    pub fn attach_pulse_sources(station: &mut Station) -> sensorflow::Result<()> {
        let reactor = station.reactor_mut();
        reactor.schedule_repeating("sim_wind", WIND_PULSE_MS, |now| {
            hw_init::WIND_PULSES.on_edge(now);
        })?;
        reactor.schedule_repeating("sim_rain", RAIN_TIP_MS, |now| {
            hw_init::RAIN_PULSES.on_edge(now);
        })?;
        let mut level = true;
        reactor.schedule_repeating("sim_change", CHANGE_FLIP_MS, move |_| {
            level = !level;
            hw_init::CHANGE_INPUT.on_level(level);
        })?;
        log::info!("sim: wind, rain and change-input pulse sources attached");
        Ok(())
    }
}
