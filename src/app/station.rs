//! Station wiring: the weather station's dataflow graph.
//!
//! [`Station::build`] constructs every producer, transform and output from
//! a validated [`StationConfig`], registers the calibration cells, applies
//! configured overrides, and starts the producers.  After that the graph
//! is sealed; the firmware loop only calls [`Station::tick`].
//!
//! ```text
//!  env poll ─▶ °C→K ─▶ Linear ─▶ SkOutput   study.temperature
//!  env poll ─▶ %→ratio ─▶ Linear ─▶ SkOutput study.humidity
//!  env poll ─▶ Pa ─▶ Linear ─▶ SkOutput      study.pressure
//!  rain ISR ─▶ EdgeCounter ─▶ Typecast ─▶ Linear(mm) ─▶ SkOutput
//!  wind ISR ─▶ EdgeCounter ─▶ Frequency(m/s) ─▶ SkOutput
//!  ADC ─▶ analog input ─▶ DebugLog + SkOutput
//!  change ISR ─▶ DigitalInputChange ─▶ LambdaConsumer (log)
//!  GPIO poll ─▶ RepeatSensor<bool> ─▶ SkOutput
//!  toggle task ─▶ digital output
//! ```

use core::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::app::ports::{BoardPort, EnvironmentPort, PublishPort};
use crate::config::{CalibrationOverride, StationConfig};
use crate::error::Result;
use crate::graph::Producer;
use crate::pins;
use crate::scheduler::{Reactor, ReactorStats, TimerHandle};
use crate::sensors::{
    analog_input, DigitalInputChange, EdgeCounter, LevelLatch, PulseAccumulator, RepeatSensor,
};
use crate::signalk::SkMetadata;
use crate::sinks::{DebugLog, LambdaConsumer, SkOutput};
use crate::transforms::{
    CalibrationHandle, CalibrationRegistry, Frequency, Linear, ParamCell, Typecast,
};

const KELVIN_OFFSET: f32 = 273.15;

// Calibration paths
pub const TEMPERATURE_CAL: &str = "/study/temperature/calibrate";
pub const HUMIDITY_CAL: &str = "/study/humidity/calibrate";
pub const PRESSURE_CAL: &str = "/study/pressure/calibrate";
pub const RAIN_CAL: &str = "/study/rain/calibrate";
pub const WIND_CAL: &str = "/study/windspeed/calibrate";

// Signal K paths
pub const TEMPERATURE_PATH: &str = "study.temperature";
pub const HUMIDITY_PATH: &str = "study.humidity";
pub const PRESSURE_PATH: &str = "study.pressure";
pub const RAIN_PATH: &str = "study.rain.last5mins";
pub const WIND_PATH: &str = "study.wind.speedApparent";
pub const ANALOG_PATH: &str = "sensors.analog_input.voltage";
pub const POLLED_INPUT_PATH: &str = "sensors.digital_input2.value";

/// Everything the station graph talks to.
pub struct StationIo<E, B> {
    pub environment: Rc<RefCell<E>>,
    pub board: Rc<RefCell<B>>,
    pub publisher: Rc<dyn PublishPort>,
    /// ISR half of the rain gauge counter.
    pub rain: &'static PulseAccumulator,
    /// ISR half of the anemometer counter.
    pub wind: &'static PulseAccumulator,
    /// ISR latch of the change-triggered input.
    pub change_input: &'static LevelLatch,
}

/// Snapshot of the station's health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationDiagnostics {
    pub reactor: ReactorStats,
    pub rain_bounces: u32,
    pub wind_bounces: u32,
    pub published: u32,
    pub publish_failures: u32,
    /// Temperature, humidity and pressure are synthetic.
    pub simulated_environment: bool,
}

pub struct Station {
    reactor: Reactor,
    calibrations: CalibrationRegistry,
    rain: Rc<EdgeCounter>,
    wind: Rc<EdgeCounter>,
    change_input: Rc<DigitalInputChange>,
    toggle: TimerHandle,
    float_outputs: Vec<Rc<SkOutput<f32>>>,
    bool_outputs: Vec<Rc<SkOutput<bool>>>,
    simulated_environment: bool,
}

impl Station {
    /// Wire and start the whole graph.  Any configuration or wiring error
    /// aborts bring-up.
    pub fn build<E, B>(config: &StationConfig, io: StationIo<E, B>, now_ms: u64) -> Result<Self>
    where
        E: EnvironmentPort + 'static,
        B: BoardPort + 'static,
    {
        config.validate()?;

        let simulated_environment = io.environment.borrow().is_simulated();
        if simulated_environment {
            warn!("Station: environment source is simulated, T/H/P values are synthetic");
        }

        let mut reactor = Reactor::new(now_ms);
        let mut calibrations = CalibrationRegistry::new();
        let mut float_outputs = Vec::new();
        let mut bool_outputs = Vec::new();

        // ── Temperature / humidity / pressure ──────────────────
        let env = Rc::clone(&io.environment);
        let temperature = RepeatSensor::new("temperature", config.environment_interval_ms, move || {
            env.borrow_mut().read_temperature_c() + KELVIN_OFFSET
        })?;
        let env = Rc::clone(&io.environment);
        let humidity = RepeatSensor::new("humidity", config.environment_interval_ms, move || {
            env.borrow_mut().read_humidity_percent() / 100.0
        })?;
        let env = Rc::clone(&io.environment);
        let pressure = RepeatSensor::new("pressure", config.environment_interval_ms, move || {
            env.borrow_mut().read_pressure_pa()
        })?;

        let environment = [
            (
                &temperature,
                TEMPERATURE_CAL,
                TEMPERATURE_PATH,
                SkMetadata::new("K", "Study Temperature").with_names("Study Temperature", "Study Temp"),
            ),
            (
                &humidity,
                HUMIDITY_CAL,
                HUMIDITY_PATH,
                SkMetadata::new("ratio", "Study Humidity").with_names("Study Humidity", "Study Humid"),
            ),
            (
                &pressure,
                PRESSURE_CAL,
                PRESSURE_PATH,
                SkMetadata::new("Pa", "Study Pressure").with_names("Study Pressure", "Study Pres"),
            ),
        ];
        for (sensor, cal_path, sk_path, meta) in environment {
            let linear = sensor.connect_to(Linear::with(1.0, 0.0))?;
            calibrations.register(cal_path, CalibrationHandle::Linear(linear.params()))?;
            let output = linear.connect_to(SkOutput::<f32>::new(sk_path, meta, Rc::clone(&io.publisher)))?;
            float_outputs.push(output);
        }

        // ── Rain gauge ─────────────────────────────────────────
        io.rain.set_debounce_ms(config.rain.debounce_ms);
        let rain = EdgeCounter::new("rain", io.rain, config.rain.report_interval_ms)?;
        let rain_mm = rain
            .connect_to(Typecast::<u32, f32>::new())?
            .connect_to(Linear::with(config.rain.factor, 0.0))?;
        calibrations.register(RAIN_CAL, CalibrationHandle::Linear(rain_mm.params()))?;
        float_outputs.push(rain_mm.connect_to(SkOutput::<f32>::new(
            RAIN_PATH,
            SkMetadata::new("mm", "Study Rain last 5 mins").with_names("Study Rain 5 mins", "Study Rain"),
            Rc::clone(&io.publisher),
        ))?);

        // ── Anemometer ─────────────────────────────────────────
        io.wind.set_debounce_ms(config.wind.debounce_ms);
        let wind = EdgeCounter::new("wind", io.wind, config.wind.report_interval_ms)?;
        let wind_factor = ParamCell::new(config.wind.factor);
        calibrations.register(WIND_CAL, CalibrationHandle::Factor(wind_factor.clone()))?;
        float_outputs.push(
            wind.connect_to(Frequency::for_counter(&wind, wind_factor))?
                .connect_to(SkOutput::<f32>::new(
                    WIND_PATH,
                    SkMetadata::new("m/s", "Study windspeed").with_names("Study windspeed", "Study windspeed"),
                    Rc::clone(&io.publisher),
                ))?,
        );

        // ── Analog input ───────────────────────────────────────
        let board = Rc::clone(&io.board);
        let analog = analog_input(
            "analog_input",
            config.analog_interval_ms,
            config.analog_full_scale,
            move || board.borrow_mut().analog_raw(pins::ANALOG_INPUT_GPIO),
        )?;
        analog.connect_to(DebugLog::<f32>::new("Analog input value"))?;
        float_outputs.push(analog.connect_to(SkOutput::<f32>::new(
            ANALOG_PATH,
            SkMetadata::new("V", "Analog input voltage"),
            Rc::clone(&io.publisher),
        ))?);

        // ── Digital inputs ─────────────────────────────────────
        let change_input = DigitalInputChange::new(
            "digital_input1",
            io.change_input,
            config.change_scan_interval_ms,
        )?;
        change_input.connect_to(LambdaConsumer::new(|level: bool| {
            debug!("Station: digital input 1 changed to {}", level);
        }))?;

        let board = Rc::clone(&io.board);
        let polled_input = RepeatSensor::new("digital_input2", config.digital_poll_interval_ms, move || {
            board.borrow_mut().digital_level(pins::POLLED_INPUT_GPIO)
        })?;
        bool_outputs.push(polled_input.connect_to(SkOutput::<bool>::new(
            POLLED_INPUT_PATH,
            SkMetadata::new("", "Digital input 2 value"),
            Rc::clone(&io.publisher),
        ))?);

        // ── Overrides, then start ──────────────────────────────
        let applied = calibrations.apply_all(&config.calibrations);
        info!(
            "Station: {} calibration cell(s), {} override(s) applied",
            calibrations.len(),
            applied
        );

        temperature.start(&mut reactor)?;
        humidity.start(&mut reactor)?;
        pressure.start(&mut reactor)?;
        rain.start(&mut reactor)?;
        wind.start(&mut reactor)?;
        analog.start(&mut reactor)?;
        change_input.start(&mut reactor)?;
        polled_input.start(&mut reactor)?;

        let board = Rc::clone(&io.board);
        let toggle = reactor.schedule_repeating("digital_output", config.toggle_interval_ms, move |_| {
            board.borrow_mut().toggle_output(pins::DIGITAL_OUTPUT_GPIO);
        })?;

        info!("Station: graph sealed, {} timer(s) armed", reactor.len());

        Ok(Self {
            reactor,
            calibrations,
            rain,
            wind,
            change_input,
            toggle,
            float_outputs,
            bool_outputs,
            simulated_environment,
        })
    }

    /// Run every due timer.  Called from the firmware loop.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        self.reactor.tick(now_ms)
    }

    /// Earliest pending deadline, for sleeping until the next tick.
    pub fn next_deadline(&self) -> Option<u64> {
        self.reactor.next_deadline()
    }

    /// Extra timers (simulation drivers, housekeeping).
    pub fn reactor_mut(&mut self) -> &mut Reactor {
        &mut self.reactor
    }

    /// Retune live calibration cells.  Returns how many paths matched.
    pub fn apply_calibrations(&self, overrides: &[CalibrationOverride]) -> usize {
        self.calibrations.apply_all(overrides)
    }

    /// Current value of every calibration cell, for persisting.
    pub fn calibration_snapshot(&self) -> Vec<CalibrationOverride> {
        self.calibrations.snapshot()
    }

    pub fn rain_counter(&self) -> &Rc<EdgeCounter> {
        &self.rain
    }

    pub fn wind_counter(&self) -> &Rc<EdgeCounter> {
        &self.wind
    }

    pub fn change_input(&self) -> &Rc<DigitalInputChange> {
        &self.change_input
    }

    pub fn toggle_timer(&self) -> TimerHandle {
        self.toggle
    }

    pub fn diagnostics(&self) -> StationDiagnostics {
        let floats = self.float_outputs.iter().map(|o| (o.published(), o.failures()));
        let bools = self.bool_outputs.iter().map(|o| (o.published(), o.failures()));
        let (published, publish_failures) = floats
            .chain(bools)
            .fold((0_u32, 0_u32), |(p, f), (op, of)| {
                (p.wrapping_add(op), f.wrapping_add(of))
            });
        StationDiagnostics {
            reactor: self.reactor.stats(),
            rain_bounces: self.rain.accumulator().rejected(),
            wind_bounces: self.wind.accumulator().rejected(),
            published,
            publish_failures,
            simulated_environment: self.simulated_environment,
        }
    }
}
