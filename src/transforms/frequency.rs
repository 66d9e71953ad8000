//! Count → rate: pulses per reporting window into a calibrated physical
//! rate per second.
//!
//! `output = count * factor / period_s`
//!
//! The reporting period is an explicit parameter and is checked against
//! the upstream producer when the graph is sealed: a rate transform wired
//! behind a counter with a different period fails bring-up with
//! [`Error::CadenceMismatch`] instead of silently producing a scaled-wrong
//! rate.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::graph::{Cadence, Consumer, Emitter, Producer};
use crate::sensors::EdgeCounter;

use super::calibration::ParamCell;

pub struct Frequency {
    factor: ParamCell<f32>,
    period_ms: u32,
    out: Emitter<f32>,
}

impl Frequency {
    /// Rate transform for counts reported every `period_ms`.
    pub fn new(period_ms: u32, factor: ParamCell<f32>) -> Result<Rc<Self>> {
        if period_ms == 0 {
            return Err(Error::InvalidConfig("rate period must be > 0 ms"));
        }
        Ok(Rc::new(Self {
            factor,
            period_ms,
            out: Emitter::new(),
        }))
    }

    /// Rate transform whose period is taken from `counter`.
    pub fn for_counter(counter: &EdgeCounter, factor: ParamCell<f32>) -> Rc<Self> {
        Rc::new(Self {
            factor,
            period_ms: counter.report_interval_ms(),
            out: Emitter::new(),
        })
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn factor(&self) -> ParamCell<f32> {
        self.factor.clone()
    }

    fn rate(&self, count: u32) -> f32 {
        let period_s = self.period_ms as f32 / 1000.0;
        count as f32 * self.factor.get() / period_s
    }
}

impl Consumer<u32> for Frequency {
    fn receive(&self, count: u32) {
        self.out.emit(self.rate(count));
    }

    fn seal(&self, upstream: Cadence) -> Result<()> {
        match upstream {
            Cadence::Periodic { period_ms } if period_ms == self.period_ms => {}
            Cadence::Periodic { period_ms } => {
                return Err(Error::CadenceMismatch {
                    expected_ms: self.period_ms,
                    actual_ms: period_ms,
                });
            }
            Cadence::OnChange => {
                return Err(Error::InvalidConfig(
                    "rate transform needs a periodic upstream",
                ));
            }
        }
        self.out.seal(upstream)
    }
}

impl Producer<f32> for Frequency {
    fn emitter(&self) -> &Emitter<f32> {
        &self.out
    }
}
