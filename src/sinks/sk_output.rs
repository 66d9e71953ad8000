//! Output node: turns a graph value into an [`SkUpdate`] and hands it to
//! the publisher.
//!
//! The publisher is shared by every output and is called synchronously
//! from inside the emission.  A failed publish is logged at `warn!` and
//! counted; the value is dropped.

use core::cell::Cell;
use core::marker::PhantomData;
use std::rc::Rc;

use log::{debug, warn};

use crate::app::ports::PublishPort;
use crate::graph::Consumer;
use crate::signalk::{SkMetadata, SkUpdate, SkValue};

pub struct SkOutput<T> {
    path: &'static str,
    meta: SkMetadata,
    publisher: Rc<dyn PublishPort>,
    published: Cell<u32>,
    failures: Cell<u32>,
    _value: PhantomData<fn(T)>,
}

impl<T: Into<SkValue>> SkOutput<T> {
    pub fn new(path: &'static str, meta: SkMetadata, publisher: Rc<dyn PublishPort>) -> Rc<Self> {
        Rc::new(Self {
            path,
            meta,
            publisher,
            published: Cell::new(0),
            failures: Cell::new(0),
            _value: PhantomData,
        })
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn meta(&self) -> &SkMetadata {
        &self.meta
    }

    /// Updates accepted by the publisher.
    pub fn published(&self) -> u32 {
        self.published.get()
    }

    /// Updates the publisher refused.
    pub fn failures(&self) -> u32 {
        self.failures.get()
    }
}

impl<T: Into<SkValue>> Consumer<T> for SkOutput<T> {
    fn receive(&self, value: T) {
        let update = SkUpdate {
            path: self.path,
            value: value.into(),
            meta: Some(&self.meta),
        };
        match self.publisher.publish(&update) {
            Ok(()) => {
                self.published.set(self.published.get().wrapping_add(1));
                debug!("SkOutput: {} = {:?}", self.path, update.value);
            }
            Err(e) => {
                self.failures.set(self.failures.get().wrapping_add(1));
                warn!("SkOutput: dropped {} ({})", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::app::ports::PublishError;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(String, SkValue)>>,
        refuse: Cell<bool>,
    }

    impl PublishPort for Recorder {
        fn publish(&self, update: &SkUpdate<'_>) -> Result<(), PublishError> {
            if self.refuse.get() {
                return Err(PublishError::NotConnected);
            }
            self.seen
                .borrow_mut()
                .push((update.path.to_owned(), update.value));
            Ok(())
        }
    }

    #[test]
    fn publishes_path_and_converted_value() {
        let recorder = Rc::new(Recorder::default());
        let out = SkOutput::<u32>::new(
            "environment.rain.count",
            SkMetadata::new("", "Rain bucket tips"),
            recorder.clone(),
        );
        out.receive(4);
        assert_eq!(
            *recorder.seen.borrow(),
            vec![("environment.rain.count".to_owned(), SkValue::Int(4))]
        );
        assert_eq!(out.published(), 1);
    }

    #[test]
    fn publish_failures_are_counted_not_propagated() {
        let recorder = Rc::new(Recorder::default());
        recorder.refuse.set(true);
        let out = SkOutput::<bool>::new("sensors.input", SkMetadata::default(), recorder.clone());
        out.receive(true);
        out.receive(false);
        assert_eq!(out.failures(), 2);
        assert_eq!(out.published(), 0);

        recorder.refuse.set(false);
        out.receive(true);
        assert_eq!(out.published(), 1);
        assert_eq!(out.failures(), 2);
    }
}
