//! Debounced pulse counter for reed-switch and hall-effect sensors
//! (rain tipping bucket, cup anemometer, flow meters).
//!
//! The counter lives in two time domains:
//!
//! ```text
//!   GPIO ISR ──▶ PulseAccumulator::on_edge(now)     (interrupt domain)
//!                   │  debounce + increment, critical section
//!                   ▼
//!               total accepted edges (monotonic, wrapping u32)
//!                   │
//!   Reactor ───▶ EdgeCounter::flush()               (reactor domain)
//!                   delta = total - baseline; baseline = total; emit(delta)
//! ```
//!
//! ## Debounce policy
//!
//! Leading-edge: the first edge of a burst is counted, every edge within
//! `debounce_ms` of the last *accepted* edge is discarded, and the window
//! restarts only from accepted edges.  A burst shorter than the window is
//! undercounted; contact bounce is never double-counted.
//!
//! Edge timestamps are `u64` milliseconds since boot, so a gauge that sits
//! idle for weeks still measures the gap to its last accepted edge
//! exactly.
//!
//! ## Sharing
//!
//! The ISR cannot capture closures, so the accumulator is a `static`
//! (hence the `const fn` constructor).  The critical section masks
//! interrupts on the device (`esp-idf-svc`'s `critical-section` feature)
//! and is a global mutex on the host.  The accepted total is never reset:
//! the reactor side keeps its own baseline, so an edge that lands between
//! the flush's read and its baseline update is simply reported in the
//! next window.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};
use std::rc::Rc;

use critical_section::Mutex;
use log::info;

use crate::error::{Error, Result};
use crate::graph::{Cadence, Emitter, Producer};
use crate::scheduler::{Reactor, TimerHandle};

// ═══════════════════════════════════════════════════════════════
//  Interrupt domain
// ═══════════════════════════════════════════════════════════════

/// Hardware edge polarity that should trigger the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EdgePolarity {
    Rising,
    Falling,
    /// Both edges.
    Change,
}

#[derive(Debug, Clone, Copy)]
struct DebounceState {
    accepted: u32,
    rejected: u32,
    last_accepted_ms: Option<u64>,
}

/// ISR-side state: accepted/rejected edge totals and the debounce timestamp.
pub struct PulseAccumulator {
    state: Mutex<Cell<DebounceState>>,
    debounce_ms: AtomicU32,
}

impl PulseAccumulator {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            state: Mutex::new(Cell::new(DebounceState {
                accepted: 0,
                rejected: 0,
                last_accepted_ms: None,
            })),
            debounce_ms: AtomicU32::new(debounce_ms),
        }
    }

    /// Record an edge seen at `now_ms` (milliseconds since boot).
    /// Returns whether it was accepted.
    ///
    /// Interrupt-safe: constant time, no allocation, no logging.
    pub fn on_edge(&self, now_ms: u64) -> bool {
        let window = u64::from(self.debounce_ms.load(Ordering::Relaxed));
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut st = cell.get();
            let bounced = st
                .last_accepted_ms
                .is_some_and(|last| now_ms.saturating_sub(last) < window);
            if bounced {
                st.rejected = st.rejected.wrapping_add(1);
            } else {
                st.accepted = st.accepted.wrapping_add(1);
                st.last_accepted_ms = Some(now_ms);
            }
            cell.set(st);
            !bounced
        })
    }

    /// Total accepted edges since boot (wrapping).
    pub fn total(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).get().accepted)
    }

    /// Total edges discarded as bounce since boot (wrapping).
    pub fn rejected(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).get().rejected)
    }

    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms.load(Ordering::Relaxed)
    }

    /// Change the debounce window.  Takes effect from the next edge.
    pub fn set_debounce_ms(&self, debounce_ms: u32) {
        self.debounce_ms.store(debounce_ms, Ordering::Relaxed);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Reactor domain
// ═══════════════════════════════════════════════════════════════

/// Reports the number of accepted edges per reporting window.
pub struct EdgeCounter {
    label: &'static str,
    accumulator: &'static PulseAccumulator,
    report_interval_ms: u32,
    baseline: Cell<u32>,
    last_flush_ms: Cell<Option<u64>>,
    out: Emitter<u32>,
}

impl EdgeCounter {
    /// Build the reactor half.  `report_interval_ms` must be non-zero.
    ///
    /// Edges accepted before construction are not reported.
    pub fn new(
        label: &'static str,
        accumulator: &'static PulseAccumulator,
        report_interval_ms: u32,
    ) -> Result<Rc<Self>> {
        if report_interval_ms == 0 {
            return Err(Error::InvalidConfig("counter report interval must be > 0 ms"));
        }
        Ok(Rc::new(Self {
            label,
            accumulator,
            report_interval_ms,
            baseline: Cell::new(accumulator.total()),
            last_flush_ms: Cell::new(None),
            out: Emitter::new(),
        }))
    }

    /// Seal the downstream graph and register the periodic flush.
    pub fn start(self: &Rc<Self>, reactor: &mut Reactor) -> Result<TimerHandle> {
        self.out.seal(Cadence::Periodic {
            period_ms: self.report_interval_ms,
        })?;
        let counter = Rc::clone(self);
        let handle = reactor.schedule_repeating(self.label, self.report_interval_ms, move |now| {
            counter.flush(now);
        })?;
        info!(
            "EdgeCounter: '{}' reports every {} ms, debounce {} ms",
            self.label,
            self.report_interval_ms,
            self.accumulator.debounce_ms()
        );
        Ok(handle)
    }

    /// Emit the edges accepted since the previous flush and move the
    /// baseline.  Returns the emitted delta.
    pub fn flush(&self, now_ms: u64) -> u32 {
        let total = self.accumulator.total();
        let delta = total.wrapping_sub(self.baseline.replace(total));
        self.last_flush_ms.set(Some(now_ms));
        self.out.emit(delta);
        delta
    }

    pub fn report_interval_ms(&self) -> u32 {
        self.report_interval_ms
    }

    /// Reactor time of the most recent flush.
    pub fn last_flush_ms(&self) -> Option<u64> {
        self.last_flush_ms.get()
    }

    pub fn accumulator(&self) -> &'static PulseAccumulator {
        self.accumulator
    }
}

impl Producer<u32> for EdgeCounter {
    fn emitter(&self) -> &Emitter<u32> {
        &self.out
    }
}
