//! Runtime-mutable calibration parameters.
//!
//! Transforms hold a [`ParamCell`] handle rather than a copy of their
//! parameters, and read it on every emission.  The same handle is listed
//! in the [`CalibrationRegistry`] under a config path
//! (e.g. `/study/rain/calibrate`), so a configuration update can retune a
//! live transform without rewiring the graph.

use core::cell::Cell;
use std::rc::Rc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::CalibrationOverride;
use crate::error::{Error, Result};

/// Maximum number of registered calibration paths.
pub const MAX_CALIBRATIONS: usize = 16;

/// `output = input * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub scale: f32,
    pub offset: f32,
}

impl LinearParams {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    pub const fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    pub fn apply(&self, input: f32) -> f32 {
        input * self.scale + self.offset
    }

    /// Recover the raw input from a calibrated output.  `None` when the
    /// scale is zero and the mapping is not invertible.
    pub fn invert(&self, output: f32) -> Option<f32> {
        if self.scale == 0.0 {
            None
        } else {
            Some((output - self.offset) / self.scale)
        }
    }
}

impl Default for LinearParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Shared, single-threaded parameter cell.  Cloning shares the cell.
#[derive(Debug, Clone)]
pub struct ParamCell<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> ParamCell<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn set(&self, value: T) {
        self.0.set(value);
    }
}

/// A registered calibration target.
#[derive(Debug, Clone)]
pub enum CalibrationHandle {
    /// Scale and offset of a [`Linear`](super::linear::Linear) transform.
    Linear(ParamCell<LinearParams>),
    /// Multiplier of a [`Frequency`](super::frequency::Frequency) transform.
    Factor(ParamCell<f32>),
}

/// Config path → live parameter cell.
#[derive(Default)]
pub struct CalibrationRegistry {
    entries: heapless::Vec<(&'static str, CalibrationHandle), MAX_CALIBRATIONS>,
}

impl CalibrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// List `handle` under `path`.  Paths must be unique.
    pub fn register(&mut self, path: &'static str, handle: CalibrationHandle) -> Result<()> {
        if self.get(path).is_some() {
            return Err(Error::InvalidConfig("duplicate calibration path"));
        }
        self.entries
            .push((path, handle))
            .map_err(|_| Error::CapacityExceeded("calibration registry"))
    }

    pub fn get(&self, path: &str) -> Option<&CalibrationHandle> {
        self.entries
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, handle)| handle)
    }

    /// Apply one override.  Returns `false` if the path is unknown.
    ///
    /// For a [`CalibrationHandle::Factor`] target only `scale` is used.
    pub fn apply(&self, over: &CalibrationOverride) -> bool {
        match self.get(&over.path) {
            Some(CalibrationHandle::Linear(cell)) => {
                cell.set(LinearParams::new(over.scale, over.offset));
            }
            Some(CalibrationHandle::Factor(cell)) => cell.set(over.scale),
            None => {
                warn!("Calibration: no target at '{}'", over.path);
                return false;
            }
        }
        info!(
            "Calibration: '{}' -> scale={} offset={}",
            over.path, over.scale, over.offset
        );
        true
    }

    /// Apply every override; returns how many matched a registered path.
    pub fn apply_all(&self, overrides: &[CalibrationOverride]) -> usize {
        overrides.iter().filter(|o| self.apply(o)).count()
    }

    /// Current values of every registered cell, in registration order.
    pub fn snapshot(&self) -> Vec<CalibrationOverride> {
        self.entries
            .iter()
            .map(|(path, handle)| {
                let (scale, offset) = match handle {
                    CalibrationHandle::Linear(cell) => {
                        let p = cell.get();
                        (p.scale, p.offset)
                    }
                    CalibrationHandle::Factor(cell) => (cell.get(), 0.0),
                };
                CalibrationOverride {
                    path: (*path).into(),
                    scale,
                    offset,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
