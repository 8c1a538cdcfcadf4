// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The timing service (§4.B): a process-wide clock that is either wall-clock
//! or virtual, plus cooperative [`Scheduler`]s that register periodic or
//! one-shot work against it. Real mode drives schedulers with background
//! tokio tasks; test mode is driven synchronously by `advance_to` /
//! `advance_by` / `next_tick` so tests are deterministic.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

/// A point in time, either wall-clock or virtual, represented as nanoseconds
/// since a mode-specific reference point. `Instant::ZERO` is the sentinel a
/// [`crate::segment::TimedOutput`] returns from `next_refresh` to mean
/// "static, no further refresh" (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(u64);

impl Instant {
    pub const ZERO: Instant = Instant(0);

    pub fn from_nanos(nanos: u64) -> Self {
        Instant(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Instant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(other.0))
    }
}

impl std::ops::Add<Duration> for Instant {
    type Output = Instant;
    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0.saturating_add(rhs.as_nanos() as u64))
    }
}

impl std::ops::Sub for Instant {
    type Output = Duration;
    fn sub(self, rhs: Instant) -> Duration {
        self.saturating_sub(rhs)
    }
}

/// Test mode always freezes `now` at this fixed, non-zero epoch so it can
/// never collide with the `Instant::ZERO` "static" sentinel.
const TEST_EPOCH_NANOS: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy)]
enum Mode {
    Real { epoch: std::time::Instant },
    Test { now: Instant },
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Stopped,
    At(Instant),
    Every { period: Duration, next: Instant },
}

impl Trigger {
    fn deadline(&self) -> Option<Instant> {
        match *self {
            Trigger::Stopped => None,
            Trigger::At(t) => Some(t),
            Trigger::Every { next, .. } => Some(next),
        }
    }
}

struct SchedulerState {
    trigger: Trigger,
    tx: mpsc::UnboundedSender<()>,
    generation: u64,
}

struct State {
    mode: Mode,
    paused: bool,
    next_id: u64,
    schedulers: HashMap<u64, SchedulerState>,
}

struct Shared {
    state: Mutex<State>,
    resume_notify: Notify,
}

/// Process-wide (or test-local) virtual/real clock service (§4.B).
#[derive(Clone)]
pub struct Timing(Arc<Shared>);

static GLOBAL: OnceLock<Timing> = OnceLock::new();

impl Timing {
    /// The process-wide singleton, starting in real (wall-clock) mode.
    pub fn global() -> Timing {
        GLOBAL.get_or_init(Timing::new_real).clone()
    }

    /// A fresh, independent instance — useful for tests that want isolation
    /// from the process-wide singleton.
    pub fn new_real() -> Timing {
        Timing(Arc::new(Shared {
            state: Mutex::new(State {
                mode: Mode::Real { epoch: std::time::Instant::now() },
                paused: false,
                next_id: 0,
                schedulers: HashMap::new(),
            }),
            resume_notify: Notify::new(),
        }))
    }

    /// A fresh instance already in test mode.
    pub fn new_for_test() -> Timing {
        let timing = Self::new_real();
        timing.enter_test_mode();
        timing
    }

    pub fn now(&self) -> Instant {
        let state = self.0.state.lock();
        match state.mode {
            Mode::Real { epoch } => Instant(epoch.elapsed().as_nanos() as u64),
            Mode::Test { now } => now,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.0.state.lock().paused
    }

    /// Create a new [`Scheduler`] registered with this service.
    pub fn scheduler(&self) -> Scheduler {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.0.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.schedulers.insert(id, SchedulerState { trigger: Trigger::Stopped, tx, generation: 0 });
        drop(state);
        Scheduler { timing: self.clone(), id, rx }
    }

    pub fn pause(&self) {
        self.0.state.lock().paused = true;
    }

    /// Resume from a global pause. Any scheduler whose trigger had already
    /// elapsed while paused fires exactly once now (§4.B pause semantics);
    /// real-mode background tasks waiting out the pause are woken too.
    pub fn resume(&self) {
        {
            let mut state = self.0.state.lock();
            if !state.paused {
                return;
            }
            state.paused = false;
            if let Mode::Test { now } = state.mode {
                fire_overdue(&mut state, now);
            }
        }
        self.0.resume_notify.notify_waiters();
    }

    /// Freeze `now` at a fixed epoch and switch to synchronous test-mode
    /// dispatch. Any real-mode background tasks notice the generation bump
    /// and exit without firing.
    pub fn enter_test_mode(&self) {
        let mut state = self.0.state.lock();
        state.mode = Mode::Test { now: Instant(TEST_EPOCH_NANOS) };
        for sched in state.schedulers.values_mut() {
            sched.generation += 1;
        }
    }

    /// Return to wall-clock mode, re-arming background tasks for any
    /// scheduler with a pending trigger.
    pub fn exit_test_mode(&self) {
        let mut to_arm = Vec::new();
        {
            let mut state = self.0.state.lock();
            let epoch = std::time::Instant::now();
            state.mode = Mode::Real { epoch };
            for (&id, sched) in state.schedulers.iter_mut() {
                sched.generation += 1;
                if let Some(deadline) = sched.trigger.deadline() {
                    to_arm.push((id, sched.generation, deadline, sched.tx.clone()));
                }
            }
        }
        for (id, generation, deadline, tx) in to_arm {
            spawn_real_wait(Arc::clone(&self.0), id, generation, deadline, tx);
        }
    }

    /// Test mode only: advance `now` to `target`, firing every scheduler
    /// whose next fire is `<= target`, in non-decreasing order of their
    /// fire time (§4.B, §8 testable property 6). While globally paused, no
    /// scheduler fires — `now` still moves, and overdue schedulers fire
    /// once on the next `resume()`.
    pub fn advance_to(&self, target: Instant) {
        let mut state = self.0.state.lock();
        assert!(matches!(state.mode, Mode::Test { .. }), "advance_to requires test mode");
        if state.paused {
            if let Mode::Test { ref mut now } = state.mode {
                *now = target;
            }
            return;
        }
        loop {
            let due = state
                .schedulers
                .iter()
                .filter_map(|(&id, s)| s.trigger.deadline().filter(|t| *t <= target).map(|t| (id, t)))
                .min_by_key(|&(id, t)| (t, id));
            let Some((id, deadline)) = due else { break };
            if let Mode::Test { ref mut now } = state.mode {
                *now = deadline;
            }
            fire_one(&mut state, id, deadline);
        }
        if let Mode::Test { ref mut now } = state.mode {
            *now = target;
        }
    }

    /// Test mode only: `advance_to(now() + d)`, returning the new `now`.
    pub fn advance_by(&self, d: Duration) -> Instant {
        let target = self.now() + d;
        self.advance_to(target);
        self.now()
    }

    /// Test mode only: advance to the earliest pending scheduler fire time
    /// across all schedulers and fire it, returning the new `now`. A no-op
    /// (returns the current `now`) if nothing is pending.
    pub fn next_tick(&self) -> Instant {
        let target = {
            let state = self.0.state.lock();
            assert!(matches!(state.mode, Mode::Test { .. }), "next_tick requires test mode");
            let earliest = state.schedulers.values().filter_map(|s| s.trigger.deadline()).min();
            match earliest {
                Some(t) => t,
                None => return self.now(),
            }
        };
        self.advance_to(target);
        self.now()
    }

    fn set_trigger(&self, id: u64, trigger: Trigger) {
        let (is_real, generation, tx, deadline) = {
            let mut state = self.0.state.lock();
            let Some(sched) = state.schedulers.get_mut(&id) else { return };
            sched.trigger = trigger;
            sched.generation += 1;
            (
                matches!(state.mode, Mode::Real { .. }),
                sched.generation,
                sched.tx.clone(),
                trigger.deadline(),
            )
        };
        if is_real {
            if let Some(deadline) = deadline {
                spawn_real_wait(Arc::clone(&self.0), id, generation, deadline, tx);
            }
        }
    }
}

/// Fire, exactly once, every scheduler whose trigger had already elapsed by
/// `now` (used by `resume()` in test mode).
fn fire_overdue(state: &mut State, now: Instant) {
    let overdue: Vec<u64> = state
        .schedulers
        .iter()
        .filter_map(|(&id, s)| s.trigger.deadline().filter(|t| *t <= now).map(|_| id))
        .collect();
    for id in overdue {
        let basis = now;
        fire_one(state, id, basis);
    }
}

/// Send one tick for `id` and advance its trigger past `basis` (the instant
/// treated as "the current fire" for `every(d)` cadence purposes).
fn fire_one(state: &mut State, id: u64, basis: Instant) {
    let Some(sched) = state.schedulers.get_mut(&id) else { return };
    let _ = sched.tx.send(());
    match sched.trigger {
        Trigger::At(_) => sched.trigger = Trigger::Stopped,
        Trigger::Every { period, .. } => {
            sched.trigger = Trigger::Every { period, next: basis + period };
        }
        Trigger::Stopped => {}
    }
}

/// Real-mode background task: sleep until `deadline`, then fire (respecting
/// a global pause by waiting for `resume()`), and reschedule `Every`
/// triggers. Exits quietly if superseded (`generation` mismatch) or if the
/// service has switched to test mode in the meantime.
fn spawn_real_wait(shared: Arc<Shared>, id: u64, generation: u64, deadline: Instant, tx: mpsc::UnboundedSender<()>) {
    tokio::spawn(async move {
        let now = {
            let state = shared.state.lock();
            match state.mode {
                Mode::Real { epoch } => Instant(epoch.elapsed().as_nanos() as u64),
                Mode::Test { .. } => return,
            }
        };
        let remaining = deadline.saturating_sub(now);
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }

        let (should_wait_for_resume, rearm) = {
            let mut state = shared.state.lock();
            let Some(sched) = state.schedulers.get(&id) else { return };
            if sched.generation != generation || !matches!(state.mode, Mode::Real { .. }) {
                return;
            }
            if state.paused {
                (true, None)
            } else {
                let _ = tx.send(());
                (false, reschedule_real(&mut state, id, deadline))
            }
        };

        if !should_wait_for_resume {
            if let Some((generation, deadline, tx)) = rearm {
                spawn_real_wait(shared, id, generation, deadline, tx);
            }
            return;
        }

        shared.resume_notify.notified().await;
        let rearm = {
            let mut state = shared.state.lock();
            let Some(sched) = state.schedulers.get(&id) else { return };
            if sched.generation != generation || !matches!(state.mode, Mode::Real { .. }) {
                return;
            }
            let now = match state.mode {
                Mode::Real { epoch } => Instant(epoch.elapsed().as_nanos() as u64),
                Mode::Test { .. } => return,
            };
            let _ = sched.tx.send(());
            reschedule_real(&mut state, id, now)
        };
        if let Some((generation, deadline, tx)) = rearm {
            spawn_real_wait(shared, id, generation, deadline, tx);
        }
    });
}

/// After firing in real mode, rearm `Every` for its next deadline. Returns
/// the info needed to spawn a fresh background task once the caller has
/// released the state lock; `None` for a one-shot or stopped trigger.
fn reschedule_real(state: &mut State, id: u64, basis: Instant) -> Option<(u64, Instant, mpsc::UnboundedSender<()>)> {
    let sched = state.schedulers.get_mut(&id)?;
    let new_trigger = match sched.trigger {
        Trigger::Every { period, .. } => Trigger::Every { period, next: basis + period },
        Trigger::At(_) | Trigger::Stopped => Trigger::Stopped,
    };
    sched.trigger = new_trigger;
    sched.generation += 1;
    let deadline = new_trigger.deadline()?;
    Some((sched.generation, deadline, sched.tx.clone()))
}

/// A handle to periodic or one-shot work registered with a [`Timing`]
/// service (§4.B).
pub struct Scheduler {
    timing: Timing,
    id: u64,
    rx: mpsc::UnboundedReceiver<()>,
}

impl Scheduler {
    /// Fire once at `t`. Replaces any prior pending trigger.
    pub fn at(&self, t: Instant) {
        self.timing.set_trigger(self.id, Trigger::At(t));
    }

    /// Fire once after `d` from now. Replaces any prior pending trigger.
    pub fn after(&self, d: Duration) {
        self.at(self.timing.now() + d);
    }

    /// Fire every `d`, starting `d` from now. Replaces any prior pending
    /// trigger; subsequent fires are `d` after the current fire, not
    /// drift-corrected to wall clock (§4.B).
    pub fn every(&self, d: Duration) {
        let next = self.timing.now() + d;
        self.timing.set_trigger(self.id, Trigger::Every { period: d, next });
    }

    /// Cancel any pending trigger; an interval stops immediately (no final
    /// tick).
    pub fn stop(&self) {
        self.timing.set_trigger(self.id, Trigger::Stopped);
    }

    /// Await the next fire. Returns `true` for each tick, `false` once the
    /// scheduler is dropped (stopped schedulers simply never send again).
    pub async fn tick(&mut self) -> bool {
        matches!(self.rx.recv().await, Some(()))
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.timing.0.state.lock().schedulers.remove(&self.id);
    }
}

#[cfg(test)]
#[path = "timing_tests.rs"]
mod tests;
