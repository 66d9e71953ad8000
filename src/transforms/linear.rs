//! Linear calibration: `output = input * scale + offset`.
//!
//! Parameters are read from the shared cell on every value, so an
//! override applied through the calibration registry takes effect on the
//! next emission.  No validation: NaN and out-of-range inputs go through
//! the formula unchanged.

use std::rc::Rc;

use crate::error::Result;
use crate::graph::{Cadence, Consumer, Emitter, Producer};

use super::calibration::{LinearParams, ParamCell};

pub struct Linear {
    params: ParamCell<LinearParams>,
    out: Emitter<f32>,
}

impl Linear {
    /// Build a transform reading its parameters from `params`.
    pub fn new(params: ParamCell<LinearParams>) -> Rc<Self> {
        Rc::new(Self {
            params,
            out: Emitter::new(),
        })
    }

    /// Build a transform with its own private parameter cell.
    pub fn with(scale: f32, offset: f32) -> Rc<Self> {
        Self::new(ParamCell::new(LinearParams::new(scale, offset)))
    }

    /// Handle to the live parameters, for registration or direct tuning.
    pub fn params(&self) -> ParamCell<LinearParams> {
        self.params.clone()
    }
}

impl Consumer<f32> for Linear {
    fn receive(&self, value: f32) {
        self.out.emit(self.params.get().apply(value));
    }

    fn seal(&self, upstream: Cadence) -> Result<()> {
        self.out.seal(upstream)
    }
}

impl Producer<f32> for Linear {
    fn emitter(&self) -> &Emitter<f32> {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_scale_then_offset() {
        let linear = Linear::with(2.0, -1.0);
        linear.receive(5.0);
        assert_eq!(linear.last_value(), Some(9.0));
    }

    #[test]
    fn parameters_are_read_fresh_each_value() {
        let linear = Linear::with(1.0, 0.0);
        let params = linear.params();
        linear.receive(10.0);
        assert_eq!(linear.last_value(), Some(10.0));

        params.set(LinearParams::new(0.5, 1.0));
        linear.receive(10.0);
        assert_eq!(linear.last_value(), Some(6.0));
    }

    #[test]
    fn nan_passes_through() {
        let linear = Linear::with(2.0, 1.0);
        linear.receive(f32::NAN);
        assert!(linear.last_value().unwrap().is_nan());
    }
}
