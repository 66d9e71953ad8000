//! Mock adapters for integration tests.
//!
//! Records every board and publisher call so tests can assert on the full
//! history without touching real GPIO/ADC registers.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use sensorflow::app::ports::{BoardPort, EnvironmentPort, PublishError, PublishPort};
use sensorflow::app::station::StationIo;
use sensorflow::sensors::{LevelLatch, PulseAccumulator};
use sensorflow::signalk::{SkUpdate, SkValue};

// ── Environment chip ──────────────────────────────────────────

pub struct MockEnvironment {
    pub temperature_c: f32,
    pub humidity_percent: f32,
    pub pressure_pa: f32,
    pub reads: u32,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            humidity_percent: 45.0,
            pressure_pa: 101_325.0,
            reads: 0,
        }
    }
}

impl EnvironmentPort for MockEnvironment {
    fn read_temperature_c(&mut self) -> f32 {
        self.reads += 1;
        self.temperature_c
    }

    fn read_humidity_percent(&mut self) -> f32 {
        self.reads += 1;
        self.humidity_percent
    }

    fn read_pressure_pa(&mut self) -> f32 {
        self.reads += 1;
        self.pressure_pa
    }
}

// ── Board I/O ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBoard {
    pub analog_raw: u16,
    pub levels: HashMap<i32, bool>,
    /// `(gpio, new_level)` for every toggle.
    pub toggles: Vec<(i32, bool)>,
}

impl BoardPort for MockBoard {
    fn analog_raw(&mut self, _gpio: i32) -> u16 {
        self.analog_raw
    }

    fn digital_level(&mut self, gpio: i32) -> bool {
        self.levels.get(&gpio).copied().unwrap_or(true)
    }

    fn toggle_output(&mut self, gpio: i32) -> bool {
        let level = self.levels.entry(gpio).or_insert(false);
        *level = !*level;
        self.toggles.push((gpio, *level));
        *level
    }
}

// ── Publisher ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    pub updates: RefCell<Vec<(String, SkValue)>>,
    pub fail: Cell<bool>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    /// Every value published under `path`, oldest first.
    pub fn values(&self, path: &str) -> Vec<SkValue> {
        self.updates
            .borrow()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| *v)
            .collect()
    }

    /// The most recent float published under `path`.
    pub fn last_float(&self, path: &str) -> Option<f64> {
        self.values(path).into_iter().rev().find_map(|v| match v {
            SkValue::Float(f) => Some(f),
            _ => None,
        })
    }
}

impl PublishPort for RecordingPublisher {
    fn publish(&self, update: &SkUpdate<'_>) -> Result<(), PublishError> {
        if self.fail.get() {
            return Err(PublishError::NotConnected);
        }
        self.updates
            .borrow_mut()
            .push((update.path.to_owned(), update.value));
        Ok(())
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Mocks plus the ISR-side statics, leaked per test so tests stay
/// independent.
pub struct Rig {
    pub environment: Rc<RefCell<MockEnvironment>>,
    pub board: Rc<RefCell<MockBoard>>,
    pub publisher: Rc<RecordingPublisher>,
    pub rain: &'static PulseAccumulator,
    pub wind: &'static PulseAccumulator,
    pub change_input: &'static LevelLatch,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self {
            environment: Rc::new(RefCell::new(MockEnvironment::default())),
            board: Rc::new(RefCell::new(MockBoard::default())),
            publisher: Rc::new(RecordingPublisher::default()),
            rain: Box::leak(Box::new(PulseAccumulator::new(0))),
            wind: Box::leak(Box::new(PulseAccumulator::new(0))),
            change_input: Box::leak(Box::new(LevelLatch::new())),
        }
    }

    pub fn io(&self) -> StationIo<MockEnvironment, MockBoard> {
        StationIo {
            environment: Rc::clone(&self.environment),
            board: Rc::clone(&self.board),
            publisher: self.publisher.clone(),
            rain: self.rain,
            wind: self.wind,
            change_input: self.change_input,
        }
    }
}
