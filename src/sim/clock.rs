//! Simulation time
//!
//! The simulator never reads wall-clock time. Hosts inject a [`Clock`] and a
//! [`FixedStep`] turns its readings into whole simulation steps; tests use
//! [`ManualClock`] or call `step(dt)` directly.

use std::cell::Cell;

use crate::consts::{MAX_FRAME_SECS, MAX_SUBSTEPS, SIM_DT};

/// Source of monotonic time in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Fixed timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedStep {
    pub dt: f32,
    pub max_substeps: u32,
    accumulator: f32,
    last: Option<f64>,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FixedStep {
    pub fn new(dt: f32, max_substeps: u32) -> Self {
        Self {
            dt,
            max_substeps,
            accumulator: 0.0,
            last: None,
        }
    }

    /// Read the clock and return how many fixed steps are due.
    ///
    /// The first reading only establishes a baseline. Long gaps (tab in the
    /// background, debugger) are clamped so a single update never runs more
    /// than `max_substeps` steps.
    pub fn due_steps<C: Clock + ?Sized>(&mut self, clock: &C) -> u32 {
        let now = clock.now();
        let elapsed = match self.last.replace(now) {
            Some(last) => (now - last).max(0.0) as f32,
            None => 0.0,
        };
        self.accumulator += elapsed.min(MAX_FRAME_SECS);

        let mut steps = 0;
        while self.accumulator >= self.dt && steps < self.max_substeps {
            self.accumulator -= self.dt;
            steps += 1;
        }
        if steps == self.max_substeps {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(self.dt);
        }
        steps
    }

    /// Forget accumulated time and the last reading
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last = None;
    }
}

/// Countdown timer for periodic simulation activities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timer {
    remaining: f32,
    armed: bool,
}

impl Timer {
    /// A timer that fires after `secs`
    pub fn after(secs: f32) -> Self {
        Self {
            remaining: secs,
            armed: true,
        }
    }

    /// Advance by `dt`. Returns true when the timer fires; it then stays
    /// disarmed until re-armed with [`Timer::arm`].
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.armed = false;
            true
        } else {
            false
        }
    }

    /// Re-arm for `secs`, carrying any overshoot from the last firing
    pub fn arm(&mut self, secs: f32) {
        self.remaining = (self.remaining.min(0.0) + secs).max(0.0);
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.remaining = 0.0;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn remaining(&self) -> f32 {
        if self.armed { self.remaining.max(0.0) } else { 0.0 }
    }
}
