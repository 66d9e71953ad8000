//! Digital inputs: a change-triggered producer fed by a pin ISR, and a
//! sampler that turns any `embedded-hal` input pin into a
//! [`RepeatSensor`](super::repeat::RepeatSensor) source.
//!
//! The change-triggered input splits the same way the pulse counter does:
//! the ISR only latches the level and raises a flag, and a short reactor
//! scan emits the level when it differs from the last one emitted.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use std::rc::Rc;

use embedded_hal::digital::{Error as _, InputPin};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::graph::{Cadence, Emitter, Producer};
use crate::scheduler::{Reactor, TimerHandle};

/// Level latched by the pin ISR.  `static` for the same reason as
/// [`PulseAccumulator`](super::edge_counter::PulseAccumulator).
pub struct LevelLatch {
    level: AtomicBool,
    pending: AtomicBool,
}

impl LevelLatch {
    pub const fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// ISR entry: record the current pin level.  Lock-free.
    pub fn on_level(&self, high: bool) {
        self.level.store(high, Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    /// Reactor side: the latest level, if anything happened since the
    /// previous call.
    pub fn take(&self) -> Option<bool> {
        if self.pending.swap(false, Ordering::AcqRel) {
            Some(self.level.load(Ordering::Acquire))
        } else {
            None
        }
    }
}

impl Default for LevelLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits the pin level whenever it changes.
pub struct DigitalInputChange {
    label: &'static str,
    latch: &'static LevelLatch,
    scan_interval_ms: u32,
    last_emitted: Cell<Option<bool>>,
    out: Emitter<bool>,
}

impl DigitalInputChange {
    pub fn new(
        label: &'static str,
        latch: &'static LevelLatch,
        scan_interval_ms: u32,
    ) -> Result<Rc<Self>> {
        if scan_interval_ms == 0 {
            return Err(Error::InvalidConfig("change scan interval must be > 0 ms"));
        }
        Ok(Rc::new(Self {
            label,
            latch,
            scan_interval_ms,
            last_emitted: Cell::new(None),
            out: Emitter::new(),
        }))
    }

    pub fn start(self: &Rc<Self>, reactor: &mut Reactor) -> Result<TimerHandle> {
        self.out.seal(Cadence::OnChange)?;
        let input = Rc::clone(self);
        let handle = reactor.schedule_repeating(self.label, self.scan_interval_ms, move |_| {
            input.scan();
        })?;
        info!(
            "DigitalInputChange: '{}' scanning every {} ms",
            self.label, self.scan_interval_ms
        );
        Ok(handle)
    }

    /// Emit the latched level if it changed.  Returns the emitted level.
    pub fn scan(&self) -> Option<bool> {
        let level = self.latch.take()?;
        if self.last_emitted.get() == Some(level) {
            return None;
        }
        self.last_emitted.set(Some(level));
        self.out.emit(level);
        Some(level)
    }
}

impl Producer<bool> for DigitalInputChange {
    fn emitter(&self) -> &Emitter<bool> {
        &self.out
    }
}

/// Wrap an `embedded-hal` input pin as a sampling closure.  A failed read
/// is logged and yields the last good level.
pub fn pin_sampler<P>(label: &'static str, mut pin: P) -> impl FnMut() -> bool + 'static
where
    P: InputPin + 'static,
{
    let mut last_good = false;
    move || {
        match pin.is_high() {
            Ok(level) => last_good = level,
            Err(e) => warn!("{}: pin read failed ({:?}), holding {}", label, e.kind(), last_good),
        }
        last_good
    }
}
