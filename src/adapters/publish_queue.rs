//! Bounded outbound queue between the graph and a network transport.
//!
//! `publish` never blocks: the update is copied into a fixed-capacity
//! ring and the call returns.  When the ring is full the oldest entry is
//! dropped to make room, so a stalled transport costs history, not
//! latency.  The transport drains the ring from its own task.

use core::cell::{Cell, RefCell};

use log::warn;

use crate::app::ports::{PublishError, PublishPort};
use crate::signalk::{SkUpdate, SkValue};

/// Longest Signal K path the queue will hold.
pub const MAX_PATH_LEN: usize = 64;

/// An update copied out of the emission that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedUpdate {
    pub path: heapless::String<MAX_PATH_LEN>,
    pub value: SkValue,
}

pub struct QueuedPublisher<const N: usize> {
    queue: RefCell<heapless::Deque<QueuedUpdate, N>>,
    dropped: Cell<u32>,
}

impl<const N: usize> Default for QueuedPublisher<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> QueuedPublisher<N> {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(heapless::Deque::new()),
            dropped: Cell::new(0),
        }
    }

    /// Oldest queued update, if any.
    pub fn pop(&self) -> Option<QueuedUpdate> {
        self.queue.borrow_mut().pop_front()
    }

    /// Hand every queued update to `send`, oldest first.  Returns the count.
    pub fn drain(&self, mut send: impl FnMut(QueuedUpdate)) -> usize {
        let mut sent = 0;
        while let Some(update) = self.pop() {
            send(update);
            sent += 1;
        }
        sent
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Updates discarded because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.get()
    }
}

impl<const N: usize> PublishPort for QueuedPublisher<N> {
    fn publish(&self, update: &SkUpdate<'_>) -> Result<(), PublishError> {
        let path = heapless::String::try_from(update.path).map_err(|_| PublishError::Encoding)?;
        let entry = QueuedUpdate {
            path,
            value: update.value,
        };

        let mut queue = self.queue.borrow_mut();
        if queue.is_full() {
            queue.pop_front();
            let dropped = self.dropped.get().wrapping_add(1);
            self.dropped.set(dropped);
            warn!("QueuedPublisher: queue full, dropped oldest ({} total)", dropped);
        }
        queue.push_back(entry).map_err(|_| PublishError::QueueFull)
    }
}
