//! Push-based dataflow graph: producers, consumers, and the subscriber
//! list that connects them.
//!
//! Every edge carries one concrete value type `T`, fixed when the edge is
//! created, so connecting an `f32` producer to a `bool` consumer is a
//! compile error rather than a runtime surprise.
//!
//! ```text
//!   RepeatSensor<f32> ──▶ Linear ──▶ SkOutput<f32>
//!   EdgeCounter (u32) ──▶ Frequency (u32 → f32) ──▶ SkOutput<f32>
//! ```
//!
//! The graph is single-threaded: nodes are shared through `Rc` and keep
//! their state in `Cell`/`RefCell`.  Emission is synchronous and
//! depth-first; a producer's `emit` returns only after every downstream
//! node has handled the value.
//!
//! ## Lifecycle
//!
//! Subscriptions are append-only and only allowed while wiring.  When a
//! producer starts it *seals* its emitter, which seals every downstream
//! emitter in turn; later `connect_to` calls fail with
//! [`Error::GraphSealed`].  Sealing also tells each node the cadence of
//! its upstream producer so rate transforms can check it.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};

/// Maximum number of direct subscribers per producer.
pub const MAX_SUBSCRIBERS: usize = 4;

/// How often the upstream producer of an edge emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// One emission every `period_ms`.
    Periodic { period_ms: u32 },
    /// Emissions only when the underlying value changes.
    OnChange,
}

/// Anything that can receive values of type `T`.
///
/// `receive` runs inside the reactor's single thread, synchronously from
/// the producer's emission.  It has no failure channel: a consumer that
/// can fail must swallow, log, or queue its own faults, and must return
/// promptly.
pub trait Consumer<T> {
    fn receive(&self, value: T);

    /// Called once when the upstream producer enters its run phase.
    /// Transforms forward this to their own subscribers.
    fn seal(&self, _upstream: Cadence) -> Result<()> {
        Ok(())
    }
}

/// A node that emits values of type `T` to subscribers.
pub trait Producer<T: Copy + 'static> {
    /// The subscriber list of this node.
    fn emitter(&self) -> &Emitter<T>;

    /// Subscribe `consumer` and hand it back so chains read left to right:
    ///
    /// ```ignore
    /// sensor.connect_to(linear)?.connect_to(output)?;
    /// ```
    fn connect_to<C>(&self, consumer: Rc<C>) -> Result<Rc<C>>
    where
        C: Consumer<T> + 'static,
        Self: Sized,
    {
        self.emitter().subscribe(consumer.clone())?;
        Ok(consumer)
    }

    /// Most recent value emitted, if any.
    fn last_value(&self) -> Option<T> {
        self.emitter().last()
    }
}

/// Ordered subscriber list plus the last emitted value.
pub struct Emitter<T> {
    subscribers: RefCell<heapless::Vec<Rc<dyn Consumer<T>>, MAX_SUBSCRIBERS>>,
    last: Cell<Option<T>>,
    sealed: Cell<bool>,
}

impl<T: Copy + 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(heapless::Vec::new()),
            last: Cell::new(None),
            sealed: Cell::new(false),
        }
    }

    /// Append a subscriber.  Fails once the emitter is sealed or full, or
    /// when called from inside one of its own subscribers' `receive`.
    pub fn subscribe(&self, consumer: Rc<dyn Consumer<T>>) -> Result<()> {
        if self.sealed.get() {
            return Err(Error::GraphSealed);
        }
        self.subscribers
            .try_borrow_mut()
            .map_err(|_| Error::InvalidConfig("cannot subscribe during an emission"))?
            .push(consumer)
            .map_err(|_| Error::CapacityExceeded("emitter subscribers"))
    }

    /// Record `value` as the current value, then deliver it to every
    /// subscriber in subscription order.
    pub fn emit(&self, value: T) {
        self.last.set(Some(value));
        for subscriber in self.subscribers.borrow().iter() {
            subscriber.receive(value);
        }
    }

    /// Close the subscriber list and propagate `cadence` downstream.
    /// Sealing an already sealed emitter is a no-op.
    pub fn seal(&self, cadence: Cadence) -> Result<()> {
        if self.sealed.replace(true) {
            return Ok(());
        }
        for subscriber in self.subscribers.borrow().iter() {
            subscriber.seal(cadence)?;
        }
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    pub fn last(&self) -> Option<T> {
        self.last.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<T: Copy + 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
