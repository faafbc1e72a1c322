//! Debounce timer manager.
//!
//! A DANGER reading arms a one-shot "turn off" action on the device; the
//! action fires only if the danger persists for the whole grace duration.
//! Any SAFE reading in between cancels it.
//!
//! ```text
//!            arm()                    grace elapsed
//!   Idle ───────────▶ Armed(gen) ─────────────────────▶ Idle, power = OFF
//!    ▲                   │                                   │
//!    │     cancel()      │                                   │ notice pushed
//!    └───────────────────┘                                   ▼
//!                                                      NoticeQueue
//! ```
//!
//! ## Race freedom
//!
//! Each device owns one [`TimerSlot`]: a mutex over the power state and the
//! arm phase, plus a condvar the timer thread sleeps on. Fire and cancel
//! both take the slot lock and act only if the slot is still `Armed` with
//! the timer's own generation, so for one arm instance exactly one of them
//! takes effect. A timer thread woken after its instance was cancelled (or
//! superseded by a newer arm) sees a different phase and exits untouched.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::device::{Device, DeviceId, DeviceState};
use crate::error::TimerError;
use crate::events::{NoticeQueue, TimerNotice};

// ═══════════════════════════════════════════════════════════════
//  Timer slot
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Armed {
        generation: u64,
        armed_at: Instant,
        deadline: Instant,
    },
}

#[derive(Debug)]
struct SlotState {
    power: DeviceState,
    phase: Phase,
    /// Arm instances issued so far.
    generation: u64,
}

/// Per-device shared state between the monitoring loop and the device's
/// timer thread.
#[derive(Debug)]
pub struct TimerSlot {
    state: Mutex<SlotState>,
    wake: Condvar,
}

impl TimerSlot {
    pub fn new(power: DeviceState) -> Self {
        Self {
            state: Mutex::new(SlotState {
                power,
                phase: Phase::Idle,
                generation: 0,
            }),
            wake: Condvar::new(),
        }
    }

    // Every critical section is a handful of plain assignments, so the data
    // is consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn power(&self) -> DeviceState {
        self.lock().power
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.lock().phase, Phase::Armed { .. })
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

// ═══════════════════════════════════════════════════════════════
//  Outcomes
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// A new timer was started.
    Armed,
    /// A timer is already live; its deadline is unchanged.
    AlreadyArmed,
    /// The device is known to be off; nothing to protect.
    DeviceOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A live timer was cancelled before it fired.
    Cancelled,
    /// No live timer (never armed, already fired or already cancelled).
    NotArmed,
}

// ═══════════════════════════════════════════════════════════════
//  Manager
// ═══════════════════════════════════════════════════════════════

/// Arms, cancels and drains per-device turn-off timers.
///
/// Holds no per-device state itself; everything lives in each device's
/// slot, so timers of different devices never interfere.
#[derive(Clone, Default)]
pub struct DebounceTimers {
    notices: NoticeQueue,
}

impl DebounceTimers {
    pub fn new(notices: NoticeQueue) -> Self {
        Self { notices }
    }

    /// Queue that receives one [`TimerNotice`] per fired timer.
    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    /// Start the turn-off timer unless one is already live.
    ///
    /// Devices with an observable power state are only armed while ON; the
    /// star tracker is always armed.
    pub fn arm(&self, device: &mut Device, grace: Duration) -> Result<ArmOutcome, TimerError> {
        let id = device.id();
        let generation = {
            let mut st = device.slot.lock();
            if matches!(st.phase, Phase::Armed { .. }) {
                return Ok(ArmOutcome::AlreadyArmed);
            }
            if id.power_state_observable() && st.power == DeviceState::Off {
                return Ok(ArmOutcome::DeviceOff);
            }
            st.generation += 1;
            let armed_at = Instant::now();
            st.phase = Phase::Armed {
                generation: st.generation,
                armed_at,
                deadline: armed_at + grace,
            };
            st.generation
        };

        // The previous instance is idle by now: its thread has exited or is
        // about to.
        reap(id, device.pending.take());

        let slot = Arc::clone(&device.slot);
        let notices = self.notices.clone();
        let spawned = thread::Builder::new()
            .name(format!("fdir-timer-{}", id.name().to_ascii_lowercase()))
            .spawn(move || run_timer(&slot, id, generation, &notices));

        match spawned {
            Ok(handle) => {
                device.pending = Some(handle);
                info!("timer: start {:?} countdown to turn OFF {}", grace, id);
                Ok(ArmOutcome::Armed)
            }
            Err(e) => {
                error!("timer: could not spawn thread for {}: {}", id, e);
                let mut st = device.slot.lock();
                if matches!(st.phase, Phase::Armed { generation: g, .. } if g == generation) {
                    st.phase = Phase::Idle;
                }
                Err(TimerError::SpawnFailed)
            }
        }
    }

    /// Cancel the live timer, if any, and reap its thread.
    pub fn cancel(&self, device: &mut Device) -> CancelOutcome {
        let id = device.id();
        let outcome = {
            let mut st = device.slot.lock();
            let phase = st.phase;
            match phase {
                Phase::Armed { .. } => {
                    st.phase = Phase::Idle;
                    CancelOutcome::Cancelled
                }
                Phase::Idle => CancelOutcome::NotArmed,
            }
        };

        if outcome == CancelOutcome::Cancelled {
            device.slot.wake.notify_all();
            info!("timer: cancel countdown to turn OFF {}", id);
        }
        reap(id, device.pending.take());
        outcome
    }

    /// Block until the device's timer has fired or been cancelled.
    pub fn drain(&self, device: &mut Device) {
        if device.pending.is_some() && device.has_live_timer() {
            info!("timer: waiting for {} countdown", device.id());
        }
        reap(device.id(), device.pending.take());
    }
}

fn reap(id: DeviceId, handle: Option<thread::JoinHandle<()>>) {
    if let Some(handle) = handle {
        if handle.join().is_err() {
            error!("timer: thread for {} panicked", id);
        }
    }
}

/// Body of one timer thread. Sleeps on the slot condvar until the deadline
/// passes or the instance is no longer the armed one.
fn run_timer(slot: &TimerSlot, id: DeviceId, generation: u64, notices: &NoticeQueue) {
    let mut st = slot.lock();
    loop {
        let phase = st.phase;
        match phase {
            Phase::Armed {
                generation: live,
                armed_at,
                deadline,
            } if live == generation => {
                let now = Instant::now();
                if now >= deadline {
                    let was_on = st.power == DeviceState::On;
                    st.power = DeviceState::Off;
                    st.phase = Phase::Idle;
                    drop(st);
                    info!("timer: turn OFF {}", id);
                    notices.push(TimerNotice {
                        device: id,
                        generation,
                        was_on,
                        fired_after: now - armed_at,
                    });
                    return;
                }
                st = slot
                    .wake
                    .wait_timeout(st, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            // Cancelled or superseded.
            _ => return,
        }
    }
}
