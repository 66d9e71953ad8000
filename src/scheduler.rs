//! Cooperative timer reactor.
//!
//! Single point of time-based concurrency: every periodic sample, every
//! counter flush, and every one-shot delay is a timer entry here.  The
//! outer loop calls [`Reactor::tick`] forever; due callbacks run to
//! completion, one after another, on that single thread of control.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         loop { }                             │
//! │                            │                                 │
//! │                            ▼                                 │
//! │                    Reactor::tick(now)                        │
//! │                            │                                 │
//! │        due entries, ascending (deadline, registration)       │
//! │                            │                                 │
//! │   ┌────────────┐   ┌───────────────┐   ┌────────────────┐    │
//! │   │RepeatSensor│   │EdgeCounter    │   │ one-shot delay │    │
//! │   │  sample()  │   │  flush()      │   │                │    │
//! │   └─────┬──────┘   └──────┬────────┘   └────────────────┘    │
//! │         ▼                 ▼                                  │
//! │     transforms ──▶ sinks (depth-first, before next entry)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repeating entries are re-armed for `now + interval` immediately before
//! their callback runs, so a slow callback costs at most its own execution
//! time in drift and can never fire twice in one tick.

use log::{info, warn};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// Maximum number of live timer entries (stack-allocated table).
pub const MAX_TIMERS: usize = 32;

/// Callback invoked with the tick time (ms) at which it fired.
pub type TimerCallback = Box<dyn FnMut(u64)>;

/// Opaque handle returned at registration.  Handles are issued in
/// registration order, which is also the tie-break order for equal
/// deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u32);

/// How an entry behaves after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Re-armed for `now + interval_ms` before every invocation.
    Repeating { interval_ms: u32 },
    /// Invoked exactly once, then discarded.
    OneShot,
}

/// Internal bookkeeping for a live timer.
struct TimerEntry {
    handle: TimerHandle,
    label: &'static str,
    deadline_ms: u64,
    kind: TimerKind,
    callback: TimerCallback,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactorStats {
    /// Total callback invocations since boot.
    pub fired: u64,
    /// Worst observed delay between a deadline and the tick that ran it.
    pub max_lateness_ms: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Reactor
// ═══════════════════════════════════════════════════════════════

/// The timer reactor.
///
/// One instance is constructed by the firmware entry point and threaded
/// through graph construction by `&mut`; there is no global reactor.
pub struct Reactor {
    entries: heapless::Vec<TimerEntry, MAX_TIMERS>,
    /// Time of the most recent tick (or construction); the base for new
    /// deadlines.
    now_ms: u64,
    next_handle: u32,
    stats: ReactorStats,
}

impl Reactor {
    /// Create a reactor whose clock currently reads `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            entries: heapless::Vec::new(),
            now_ms,
            next_handle: 0,
            stats: ReactorStats::default(),
        }
    }

    /// Register `callback` to run every `interval_ms`, first at
    /// `now + interval_ms`.
    pub fn schedule_repeating(
        &mut self,
        label: &'static str,
        interval_ms: u32,
        callback: impl FnMut(u64) + 'static,
    ) -> Result<TimerHandle> {
        if interval_ms == 0 {
            return Err(Error::InvalidConfig("repeat interval must be > 0 ms"));
        }
        let deadline = self.now_ms + u64::from(interval_ms);
        let handle = self.insert(
            label,
            deadline,
            TimerKind::Repeating { interval_ms },
            Box::new(callback),
        )?;
        info!("Reactor: '{}' repeats every {} ms", label, interval_ms);
        Ok(handle)
    }

    /// Register `callback` to run once at `now + delay_ms`.  A zero delay
    /// fires on the next tick.
    pub fn schedule_once(
        &mut self,
        label: &'static str,
        delay_ms: u32,
        callback: impl FnMut(u64) + 'static,
    ) -> Result<TimerHandle> {
        let deadline = self.now_ms + u64::from(delay_ms);
        let handle = self.insert(label, deadline, TimerKind::OneShot, Box::new(callback))?;
        info!("Reactor: '{}' fires once in {} ms", label, delay_ms);
        Ok(handle)
    }

    fn insert(
        &mut self,
        label: &'static str,
        deadline_ms: u64,
        kind: TimerKind,
        callback: TimerCallback,
    ) -> Result<TimerHandle> {
        let handle = TimerHandle(self.next_handle);
        self.entries
            .push(TimerEntry {
                handle,
                label,
                deadline_ms,
                kind,
                callback,
            })
            .map_err(|_| Error::CapacityExceeded("reactor timer table"))?;
        self.next_handle += 1;
        Ok(handle)
    }

    /// Run every entry whose deadline is `<= now_ms`, in ascending
    /// deadline order with ties broken by registration order.
    ///
    /// Only entries that were due when the tick started are considered;
    /// anything re-armed or registered meanwhile waits for the next tick.
    /// Returns the number of callbacks invoked.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut due: heapless::Vec<(u64, TimerHandle), MAX_TIMERS> = self
            .entries
            .iter()
            .filter(|e| e.deadline_ms <= now)
            .map(|e| (e.deadline_ms, e.handle))
            .collect();
        due.sort_unstable();

        let mut fired = 0;
        for (deadline, handle) in due {
            let Some(idx) = self.entries.iter().position(|e| e.handle == handle) else {
                continue;
            };

            let lateness = now - deadline;
            if lateness > self.stats.max_lateness_ms {
                self.stats.max_lateness_ms = lateness;
            }

            match self.entries[idx].kind {
                TimerKind::Repeating { interval_ms } => {
                    let entry = &mut self.entries[idx];
                    if lateness >= u64::from(interval_ms) {
                        warn!(
                            "Reactor: '{}' overran, {} ms late (interval {} ms)",
                            entry.label, lateness, interval_ms
                        );
                    }
                    entry.deadline_ms = now + u64::from(interval_ms);
                    (entry.callback)(now);
                }
                TimerKind::OneShot => {
                    let mut entry = self.entries.swap_remove(idx);
                    (entry.callback)(now);
                }
            }
            fired += 1;
        }

        self.stats.fired += fired as u64;
        fired
    }

    /// Whether `handle` still refers to a live entry.  One-shot entries
    /// stop being pending once they have fired.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Earliest deadline among live entries, if any.  Lets the outer loop
    /// sleep until there is work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.deadline_ms).min()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no timers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the most recent tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn stats(&self) -> ReactorStats {
        self.stats
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
