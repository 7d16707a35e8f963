//! The bubble arena
//!
//! Owns the live bubbles and the slot grid. Three periodic activities share
//! one simulation clock: the spawner, the position update and the optional
//! round clock. All of them run inside [`BubbleArena::step`]; pop attempts
//! go through [`BubbleArena::pop_attempt`]. Both take `&mut self`, so a pop
//! can never observe a half-updated tick.
//!
//! The arena reports what happened through an event queue drained by the
//! host. It keeps no score; that belongs to the round controller.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleId, BubbleSnapshot, BubbleState};
use super::clock::{Clock, FixedStep, Timer};
use super::config::{ConfigError, RoundConfig, Termination};
use super::grid::{PlacementQuality, SlotGrid};
use super::rule::Rule;
use crate::consts::*;

/// Outcome of popping a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub kind: ScoreKind,
    pub bubble_id: BubbleId,
    pub value: i32,
}

/// Read-only view of the live bubbles after a step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub rule: Rule,
    pub level: u32,
    pub bubbles: Vec<BubbleSnapshot>,
}

/// Something the host should know about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArenaEvent {
    Spawned {
        bubble: BubbleSnapshot,
        quality: PlacementQuality,
    },
    Tick(Frame),
    Score(ScoreEvent),
    /// Floated off the top unpopped. Never scored.
    Expired(BubbleSnapshot),
    /// The round clock ran out; the arena has stopped itself
    TimeUp,
}

/// The simulator
#[derive(Debug, Clone)]
pub struct BubbleArena {
    config: RoundConfig,
    rng: Pcg32,
    running: bool,
    rule: Rule,
    level: u32,
    time_ticks: u64,
    /// Live bubbles, sorted by id
    bubbles: Vec<Bubble>,
    grid: SlotGrid,
    spawn_timer: Timer,
    round_clock: Option<Timer>,
    stepper: FixedStep,
    events: Vec<ArenaEvent>,
    next_id: u32,
}

impl Default for BubbleArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BubbleArena {
    /// An idle arena. Nothing happens until [`BubbleArena::start_round`].
    pub fn new() -> Self {
        let config = RoundConfig::default();
        Self {
            grid: SlotGrid::new(&config.geometry),
            rule: config.rule,
            config,
            rng: Pcg32::seed_from_u64(0),
            running: false,
            level: 1,
            time_ticks: 0,
            bubbles: Vec::new(),
            spawn_timer: Timer::default(),
            round_clock: None,
            stepper: FixedStep::default(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Validate `config` and start a fresh round. On error the arena is
    /// left exactly as it was.
    pub fn start_round(&mut self, config: RoundConfig, seed: u64) -> Result<(), ConfigError> {
        config.validate()?;

        log::info!(
            "Round started: rule={}, values={}..={}, cap={}, seed={}",
            config.rule.as_str(),
            config.value_min,
            config.value_max,
            config.max_bubbles,
            seed
        );

        self.grid = SlotGrid::new(&config.geometry);
        self.rule = config.rule;
        self.round_clock = match config.termination {
            Termination::Duration { secs } => Some(Timer::after(secs)),
            _ => None,
        };
        self.config = config;
        self.rng = Pcg32::seed_from_u64(seed);
        self.running = true;
        self.level = 1;
        self.time_ticks = 0;
        self.bubbles.clear();
        self.stepper.reset();
        self.events.clear();
        self.next_id = 1;

        for _ in 0..self.config.initial_burst.min(self.config.max_bubbles) {
            self.try_spawn();
        }
        let interval = self.next_spawn_interval();
        self.spawn_timer = Timer::after(interval);
        Ok(())
    }

    /// Halt the spawner, position updates and round clock. Nothing is
    /// emitted afterwards until the next `start_round`. Bubbles stay where
    /// they are so the last frame can still be drawn.
    pub fn stop_round(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.spawn_timer.cancel();
        if let Some(clock) = &mut self.round_clock {
            clock.cancel();
        }
        self.grid.clear();
        log::info!(
            "Round stopped after {} ticks with {} bubbles in play",
            self.time_ticks,
            self.bubbles.len()
        );
    }

    /// Pop bubble `id`. Unknown, popped or expired ids are ignored.
    pub fn pop_attempt(&mut self, id: BubbleId) -> Option<ScoreEvent> {
        if !self.running {
            return None;
        }
        let index = self.bubbles.binary_search_by_key(&id, |b| b.id).ok()?;
        if !self.bubbles[index].is_alive() {
            return None;
        }

        let mut bubble = self.bubbles.remove(index);
        bubble.finish(BubbleState::Popped);
        self.grid.release(id);

        let kind = if bubble.classification() {
            ScoreKind::Hit
        } else {
            ScoreKind::Miss
        };
        let event = ScoreEvent {
            kind,
            bubble_id: id,
            value: bubble.value(),
        };
        log::trace!("Bubble {} ({}) popped: {:?}", id, bubble.value(), kind);
        self.events.push(ArenaEvent::Score(event));
        Some(event)
    }

    /// Advance the simulation by one step of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.time_ticks += 1;

        for bubble in &mut self.bubbles {
            bubble.advance(dt);
        }
        self.expire_exited();
        self.refresh_spawn_band();

        if self.spawn_timer.tick(dt) {
            self.try_spawn();
            let interval = self.next_spawn_interval();
            self.spawn_timer.arm(interval);
        }

        let frame = self.frame();
        self.events.push(ArenaEvent::Tick(frame));

        let time_up = self
            .round_clock
            .as_mut()
            .is_some_and(|clock| clock.tick(dt));
        if time_up {
            log::info!("Round clock expired");
            self.events.push(ArenaEvent::TimeUp);
            self.stop_round();
        }
    }

    /// Run however many fixed steps `clock` says are due. Returns the count.
    pub fn advance<C: Clock + ?Sized>(&mut self, clock: &C) -> u32 {
        let steps = self.stepper.due_steps(clock);
        let dt = self.stepper.dt;
        for _ in 0..steps {
            self.step(dt);
        }
        steps
    }

    /// Switch the rule for bubbles spawned from now on
    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    /// Set the difficulty level (speed and spawn cadence scale with it)
    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    /// The arena was resized. Positions are relative, so only the grid's
    /// pixel geometry changes.
    pub fn resize(&mut self, width_px: f32) {
        if !(width_px.is_finite() && width_px > 0.0) {
            log::warn!("Ignoring invalid arena width {}", width_px);
            return;
        }
        self.config.geometry.width_px = width_px;
        self.grid.set_arena_width(width_px);
    }

    pub fn frame(&self) -> Frame {
        Frame {
            tick: self.time_ticks,
            rule: self.rule,
            level: self.level,
            bubbles: self.bubbles.iter().map(Bubble::snapshot).collect(),
        }
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<ArenaEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|index| &self.bubbles[index])
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Seconds left on the round clock, if the round is timed
    pub fn time_remaining(&self) -> Option<f32> {
        self.round_clock.as_ref().map(Timer::remaining)
    }

    fn next_bubble_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn next_spawn_interval(&mut self) -> f32 {
        let base = self.config.spawn_interval_for(self.level);
        if self.config.spawn_jitter > 0.0 {
            base + self.rng.random_range(0.0..self.config.spawn_jitter)
        } else {
            base
        }
    }

    fn try_spawn(&mut self) -> Option<BubbleId> {
        if self.bubbles.len() >= self.config.max_bubbles as usize {
            log::trace!("Spawn skipped: {} bubbles at cap", self.bubbles.len());
            return None;
        }

        let id = self.next_bubble_id();
        let config = &self.config;
        let value = self
            .rng
            .random_range(config.value_min..=config.value_max_for(self.level));
        let size = self.rng.random_range(config.size_min..=config.size_max);
        let speed = self.rng.random_range(config.speed_min..=config.speed_max)
            * config.speed_factor(self.level);
        let placement = self.grid.allocate(id, size, &mut self.rng);

        let bubble = Bubble::new(
            id,
            value,
            self.rule,
            Vec2::new(placement.x, SPAWN_Y),
            size,
            speed,
        );
        self.events.push(ArenaEvent::Spawned {
            bubble: bubble.snapshot(),
            quality: placement.quality,
        });
        self.bubbles.push(bubble);
        Some(id)
    }

    fn expire_exited(&mut self) {
        let mut expired = Vec::new();
        self.bubbles.retain_mut(|bubble| {
            if bubble.has_exited() && bubble.finish(BubbleState::Expired) {
                expired.push(bubble.snapshot());
                false
            } else {
                true
            }
        });
        for snapshot in expired {
            self.grid.release(snapshot.id);
            log::trace!("Bubble {} ({}) expired", snapshot.id, snapshot.value);
            self.events.push(ArenaEvent::Expired(snapshot));
        }
    }

    /// Drop reservations of bubbles that rose out of the spawn band
    fn refresh_spawn_band(&mut self) {
        let band_edge = SPAWN_Y - self.config.geometry.spawn_band_pct;
        let bubbles = &self.bubbles;
        self.grid.retain(|id| {
            bubbles
                .binary_search_by_key(&id, |b| b.id)
                .is_ok_and(|index| bubbles[index].pos.y > band_edge)
        });
    }
}
