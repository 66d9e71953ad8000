//! Sinks: terminal consumers.
//!
//! A sink's `receive` has no failure channel.  Anything that can fail
//! (publishing) logs and counts its own faults and returns promptly.

pub mod sk_output;

use core::cell::RefCell;
use core::fmt::Debug;
use core::marker::PhantomData;
use std::rc::Rc;

use log::debug;

use crate::graph::Consumer;

pub use sk_output::SkOutput;

/// Closure observer.  Handy for tests and for ad-hoc taps on an edge.
pub struct LambdaConsumer<T> {
    f: RefCell<Box<dyn FnMut(T)>>,
}

impl<T> LambdaConsumer<T> {
    pub fn new(f: impl FnMut(T) + 'static) -> Rc<Self> {
        Rc::new(Self {
            f: RefCell::new(Box::new(f)),
        })
    }
}

impl<T> Consumer<T> for LambdaConsumer<T> {
    fn receive(&self, value: T) {
        let mut f = self.f.borrow_mut();
        (*f)(value);
    }
}

/// Logs every received value at `debug!` under a label.
pub struct DebugLog<T> {
    label: &'static str,
    _value: PhantomData<fn(T)>,
}

impl<T: Debug> DebugLog<T> {
    pub fn new(label: &'static str) -> Rc<Self> {
        Rc::new(Self {
            label,
            _value: PhantomData,
        })
    }
}

impl<T: Debug> Consumer<T> for DebugLog<T> {
    fn receive(&self, value: T) {
        debug!("{}: {:?}", self.label, value);
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[test]
    fn lambda_sees_every_value() {
        let sum = Rc::new(Cell::new(0_u32));
        let s = sum.clone();
        let sink = LambdaConsumer::new(move |v: u32| s.set(s.get() + v));
        sink.receive(3);
        sink.receive(4);
        assert_eq!(sum.get(), 7);
    }

    #[test]
    fn debug_log_accepts_any_debug_value() {
        let sink = DebugLog::<bool>::new("door");
        sink.receive(true);
        let sink = DebugLog::<f32>::new("temperature");
        sink.receive(21.5);
    }
}
