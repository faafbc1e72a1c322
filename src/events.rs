//! Timer-fired notice queue.
//!
//! Debounce timers run on background threads. When one fires it turns its
//! device off under the device's slot lock and pushes a [`TimerNotice`]
//! here; the monitoring loop drains the queue after every tick (and after
//! the final drain) and forwards each notice to the event sink.
//!
//! ```text
//! ┌───────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ timer thread  │────▶│              │     │              │
//! │ timer thread  │────▶│ NoticeQueue  │────▶│ Monitor loop │
//! │ timer thread  │────▶│  (lock-free) │     │  (consumer)  │
//! └───────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Between two drains a device can contribute at most two notices (one
//! from a timer that fired during the sleep, one from a re-armed star
//! tracker timer that fired within the tick), so the capacity covers the
//! whole device table twice over.

use std::sync::Arc;
use std::time::Duration;

use heapless::mpmc::MpMcQueue;
use log::error;

use crate::device::DeviceId;

/// Capacity of the notice queue. Power of two, at least twice the device count.
pub const NOTICE_QUEUE_CAP: usize = 8;

/// A turn-off action that actually took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerNotice {
    pub device: DeviceId,
    /// Arm instance that fired (monotonic per device).
    pub generation: u64,
    /// False when the device was already OFF, i.e. a repeated protective
    /// action rather than a transition.
    pub was_on: bool,
    /// Time between the arm call and the state change.
    pub fired_after: Duration,
}

/// Shared, cloneable handle to the notice queue.
#[derive(Clone)]
pub struct NoticeQueue {
    inner: Arc<MpMcQueue<TimerNotice, NOTICE_QUEUE_CAP>>,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MpMcQueue::new()),
        }
    }

    /// Push a notice. Safe from any thread.
    /// Returns `false` if the queue is full (notice dropped).
    pub fn push(&self, notice: TimerNotice) -> bool {
        match self.inner.enqueue(notice) {
            Ok(()) => true,
            Err(dropped) => {
                error!("notice queue full, dropped {:?}", dropped);
                false
            }
        }
    }

    /// Pop the next notice, FIFO.
    pub fn pop(&self) -> Option<TimerNotice> {
        self.inner.dequeue()
    }

    /// Drain all pending notices into a callback.
    pub fn drain(&self, mut handler: impl FnMut(TimerNotice)) {
        while let Some(notice) = self.pop() {
            handler(notice);
        }
    }
}
