//! Periodic producer: sample a value on a fixed cadence and broadcast it.
//!
//! The sampling closure runs synchronously inside the reactor tick.  It may
//! do blocking bus I/O, but anything slower than a small fraction of the
//! interval stalls every other timer on the device.
//!
//! There is no change detection: a sample is emitted on every tick even
//! when it equals the previous one.

use core::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::error::{Error, Result};
use crate::graph::{Cadence, Emitter, Producer};
use crate::scheduler::{Reactor, TimerHandle};

/// Zero-argument sampling function.
pub type SampleFn<T> = Box<dyn FnMut() -> T>;

/// Samples `T` every `interval_ms` and emits it downstream.
pub struct RepeatSensor<T> {
    label: &'static str,
    interval_ms: u32,
    sample_fn: RefCell<SampleFn<T>>,
    out: Emitter<T>,
}

impl<T: Copy + 'static> RepeatSensor<T> {
    /// Build the sensor.  Rejects a zero interval at construction time.
    pub fn new(
        label: &'static str,
        interval_ms: u32,
        sample_fn: impl FnMut() -> T + 'static,
    ) -> Result<Rc<Self>> {
        if interval_ms == 0 {
            return Err(Error::InvalidConfig("sensor interval must be > 0 ms"));
        }
        Ok(Rc::new(Self {
            label,
            interval_ms,
            sample_fn: RefCell::new(Box::new(sample_fn)),
            out: Emitter::new(),
        }))
    }

    /// Seal the downstream graph and register the periodic sample with the
    /// reactor.  Wiring must be complete before this is called.
    pub fn start(self: &Rc<Self>, reactor: &mut Reactor) -> Result<TimerHandle> {
        self.out.seal(Cadence::Periodic {
            period_ms: self.interval_ms,
        })?;
        let sensor = Rc::clone(self);
        let handle = reactor.schedule_repeating(self.label, self.interval_ms, move |_| {
            sensor.sample();
        })?;
        info!(
            "RepeatSensor: '{}' started ({} ms, {} subscriber(s))",
            self.label,
            self.interval_ms,
            self.out.subscriber_count()
        );
        Ok(handle)
    }

    /// Take one sample and emit it.  Called by the reactor; public so a
    /// caller can force an out-of-band reading.
    pub fn sample(&self) -> T {
        let value = {
            let mut sample_fn = self.sample_fn.borrow_mut();
            (*sample_fn)()
        };
        self.out.emit(value);
        value
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T: Copy + 'static> Producer<T> for RepeatSensor<T> {
    fn emitter(&self) -> &Emitter<T> {
        &self.out
    }
}
