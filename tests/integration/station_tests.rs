//! Station wiring tests.
//!
//! Builds the full weather-station graph against mock adapters and drives
//! the reactor with explicit timestamps.

use std::cell::RefCell;
use std::rc::Rc;

use sensorflow::adapters::hardware::SimEnvironment;
use sensorflow::app::ports::ConfigError;
use sensorflow::app::station::*;
use sensorflow::config::{CalibrationOverride, StationConfig};
use sensorflow::graph::Producer;
use sensorflow::pins;
use sensorflow::signalk::SkValue;
use sensorflow::Error;

use crate::mock_hw::Rig;

fn build(rig: &Rig, config: &StationConfig) -> Station {
    Station::build(config, rig.io(), 0).expect("station builds")
}

fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < 1e-3)
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn every_calibration_path_is_registered() {
    let rig = Rig::new();
    let station = build(&rig, &StationConfig::default());

    let paths: Vec<String> = station
        .calibration_snapshot()
        .into_iter()
        .map(|c| c.path)
        .collect();
    assert_eq!(
        paths,
        vec![TEMPERATURE_CAL, HUMIDITY_CAL, PRESSURE_CAL, RAIN_CAL, WIND_CAL]
    );
}

#[test]
fn invalid_config_aborts_bring_up() {
    let rig = Rig::new();
    let config = StationConfig {
        toggle_interval_ms: 0,
        ..StationConfig::default()
    };
    let result = Station::build(&config, rig.io(), 0);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}

#[test]
fn counter_debounce_windows_come_from_config() {
    let rig = Rig::new();
    let config = StationConfig::default();
    let _station = build(&rig, &config);
    assert_eq!(rig.rain.debounce_ms(), config.rain.debounce_ms);
    assert_eq!(rig.wind.debounce_ms(), config.wind.debounce_ms);
}

#[test]
fn simulated_environment_is_reported() {
    let rig = Rig::new();
    let station = build(&rig, &StationConfig::default());
    assert!(!station.diagnostics().simulated_environment);

    let io = StationIo {
        environment: Rc::new(RefCell::new(SimEnvironment::new())),
        board: Rc::clone(&rig.board),
        publisher: rig.publisher.clone(),
        rain: rig.rain,
        wind: rig.wind,
        change_input: rig.change_input,
    };
    let station = Station::build(&StationConfig::default(), io, 0).expect("station builds");
    assert!(station.diagnostics().simulated_environment);
}

// ── Environment chip ──────────────────────────────────────────

#[test]
fn environment_values_are_converted_to_si_units() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    station.tick(1999);
    assert!(rig.publisher.values(TEMPERATURE_PATH).is_empty());

    station.tick(2000);
    assert!(approx(rig.publisher.last_float(TEMPERATURE_PATH), 293.15));
    assert!(approx(rig.publisher.last_float(HUMIDITY_PATH), 0.45));
    assert!(approx(rig.publisher.last_float(PRESSURE_PATH), 101_325.0));
    assert_eq!(rig.environment.borrow().reads, 3);
}

#[test]
fn environment_publishes_every_interval_even_when_unchanged() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());
    for t in [2000, 4000, 6000] {
        station.tick(t);
    }
    assert_eq!(rig.publisher.values(TEMPERATURE_PATH).len(), 3);
}

#[test]
fn runtime_calibration_retunes_the_next_sample() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());
    station.tick(2000);

    let matched = station.apply_calibrations(&[
        CalibrationOverride {
            path: TEMPERATURE_CAL.into(),
            scale: 1.0,
            offset: -1.0,
        },
        CalibrationOverride {
            path: "/study/unknown/calibrate".into(),
            scale: 2.0,
            offset: 0.0,
        },
    ]);
    assert_eq!(matched, 1);

    station.tick(4000);
    assert!(approx(rig.publisher.last_float(TEMPERATURE_PATH), 292.15));
}

// ── Pulse counters ────────────────────────────────────────────

#[test]
fn ten_wind_pulses_in_three_seconds() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    for t in (100..=1000).step_by(100) {
        rig.wind.on_edge(t);
    }
    station.tick(3000);

    // 10 pulses * 1.026 / 3 s
    assert!(approx(rig.publisher.last_float(WIND_PATH), 3.42));
    assert_eq!(station.wind_counter().last_value(), Some(10));
}

#[test]
fn wind_bounces_are_counted_not_published() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    rig.wind.on_edge(100);
    rig.wind.on_edge(102);
    rig.wind.on_edge(104);
    rig.wind.on_edge(200);
    station.tick(3000);

    assert_eq!(station.wind_counter().last_value(), Some(2));
    assert_eq!(station.diagnostics().wind_bounces, 2);
}

#[test]
fn rain_tips_become_millimetres() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    for t in [1_000, 60_000, 120_000] {
        rig.rain.on_edge(t);
    }
    station.tick(299_999);
    assert!(rig.publisher.values(RAIN_PATH).is_empty());

    station.tick(300_000);
    assert!(approx(rig.publisher.last_float(RAIN_PATH), 0.54));

    // Next window starts from the new baseline.
    station.tick(600_000);
    assert!(approx(rig.publisher.last_float(RAIN_PATH), 0.0));
}

#[test]
fn configured_override_replaces_rain_factor() {
    let rig = Rig::new();
    let config = StationConfig {
        calibrations: vec![CalibrationOverride {
            path: RAIN_CAL.into(),
            scale: 0.2,
            offset: 0.0,
        }],
        ..StationConfig::default()
    };
    let mut station = build(&rig, &config);

    for t in [1_000, 2_000, 3_000] {
        rig.rain.on_edge(t);
    }
    station.tick(300_000);
    assert!(approx(rig.publisher.last_float(RAIN_PATH), 0.6));
}

#[test]
fn wind_factor_override_scales_rate() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());
    station.apply_calibrations(&[CalibrationOverride {
        path: WIND_CAL.into(),
        scale: 3.0,
        offset: 0.0,
    }]);

    for t in [100, 200, 300] {
        rig.wind.on_edge(t);
    }
    station.tick(3000);
    // 3 pulses * 3.0 / 3 s
    assert!(approx(rig.publisher.last_float(WIND_PATH), 3.0));
}

// ── Digital I/O ───────────────────────────────────────────────

#[test]
fn output_toggles_every_interval() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    station.tick(649);
    assert!(rig.board.borrow().toggles.is_empty());
    station.tick(650);
    station.tick(1300);
    assert_eq!(
        rig.board.borrow().toggles,
        vec![
            (pins::DIGITAL_OUTPUT_GPIO, true),
            (pins::DIGITAL_OUTPUT_GPIO, false)
        ]
    );
    assert!(station.next_deadline().is_some());
}

#[test]
fn change_input_emits_only_on_change() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    rig.change_input.on_level(true);
    station.tick(10);
    assert_eq!(station.change_input().last_value(), Some(true));

    // Same level again: latched but not re-emitted.
    rig.change_input.on_level(true);
    assert_eq!(station.change_input().scan(), None);

    rig.change_input.on_level(false);
    station.tick(20);
    assert_eq!(station.change_input().last_value(), Some(false));
}

#[test]
fn polled_input_publishes_its_level() {
    let rig = Rig::new();
    rig.board
        .borrow_mut()
        .levels
        .insert(pins::POLLED_INPUT_GPIO, false);
    let mut station = build(&rig, &StationConfig::default());

    station.tick(1000);
    assert_eq!(
        rig.publisher.values(POLLED_INPUT_PATH),
        vec![SkValue::Bool(false)]
    );
}

#[test]
fn analog_input_is_scaled_to_volts() {
    let rig = Rig::new();
    rig.board.borrow_mut().analog_raw = 4095;
    let mut station = build(&rig, &StationConfig::default());

    station.tick(500);
    assert!(approx(rig.publisher.last_float(ANALOG_PATH), 3.3));
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn publish_failures_are_counted_and_do_not_stop_the_graph() {
    let rig = Rig::new();
    let mut station = build(&rig, &StationConfig::default());

    rig.publisher.fail.set(true);
    station.tick(2000);
    let d = station.diagnostics();
    assert!(d.publish_failures >= 3);
    assert!(rig.publisher.updates.borrow().is_empty());

    rig.publisher.fail.set(false);
    station.tick(4000);
    assert!(approx(rig.publisher.last_float(TEMPERATURE_PATH), 293.15));
    let after = station.diagnostics();
    assert!(after.published > d.published);
    assert_eq!(after.publish_failures, d.publish_failures);
}
