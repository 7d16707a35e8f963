//! Round controller
//!
//! Drives a [`BubbleArena`] and turns its events into game progress:
//! score, lives, levels, rule switches and the end of the round. The arena
//! never sees the score; the controller never touches bubbles directly.

use serde::{Deserialize, Serialize};

use super::arena::{ArenaEvent, BubbleArena, Frame, ScoreEvent, ScoreKind};
use super::bubble::{BubbleId, BubbleSnapshot};
use super::clock::{Clock, FixedStep};
use super::config::{ConfigError, ExpiryPolicy, RoundConfig, Termination};
use super::rule::Rule;
use crate::consts::*;

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TimeExpired,
    LivesExhausted,
    TargetReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEnd {
    pub reason: EndReason,
    pub final_score: u64,
    pub level: u32,
    pub stars: u8,
}

/// Events for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    Tick(Frame),
    Spawned(BubbleSnapshot),
    Score {
        event: ScoreEvent,
        score: u64,
    },
    Expired(BubbleSnapshot),
    LifeLost {
        lives: u32,
    },
    LevelUp {
        level: u32,
        rule: Rule,
        required: u32,
    },
    RoundEnd(RoundEnd),
}

/// Score and progress accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Correct pops this round
    pub hits: u32,
    pub misses: u32,
    pub expired: u32,
    /// Correct pops since the last level-up
    pub level_pops: u32,
    /// Pops needed for the next level-up (None without progression)
    pub required_pops: Option<u32>,
}

impl Scoreboard {
    fn new(config: &RoundConfig) -> Self {
        Self {
            lives: config.lives,
            level: 1,
            required_pops: config.progression.map(|p| p.required_for(1)),
            ..Default::default()
        }
    }

    /// Fraction of the current level completed (0..1), for the progress bar
    pub fn level_progress(&self) -> f32 {
        match self.required_pops {
            Some(required) if required > 0 => {
                (self.level_pops as f32 / required as f32).min(1.0)
            }
            _ => 0.0,
        }
    }
}

/// Stars awarded for a final score
pub fn star_rating(score: u64) -> u8 {
    STAR_THRESHOLDS
        .iter()
        .filter(|&&threshold| score >= threshold)
        .count() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Running,
    Ended(RoundEnd),
}

/// Reference round controller
#[derive(Debug, Clone)]
pub struct RoundController {
    arena: BubbleArena,
    scoreboard: Scoreboard,
    phase: RoundPhase,
    stepper: FixedStep,
    events: Vec<RoundEvent>,
}

impl Default for RoundController {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundController {
    pub fn new() -> Self {
        Self {
            arena: BubbleArena::new(),
            scoreboard: Scoreboard::default(),
            phase: RoundPhase::Idle,
            stepper: FixedStep::default(),
            events: Vec::new(),
        }
    }

    /// Start a new round. A rejected config leaves the controller as it was.
    pub fn start(&mut self, config: RoundConfig, seed: u64) -> Result<(), ConfigError> {
        let scoreboard = Scoreboard::new(&config);
        self.arena.start_round(config, seed)?;
        self.scoreboard = scoreboard;
        self.phase = RoundPhase::Running;
        self.stepper.reset();
        self.events.clear();
        self.absorb();
        Ok(())
    }

    /// Abandon the round. No events follow, not even a round end.
    pub fn stop(&mut self) {
        self.arena.stop_round();
        if self.phase == RoundPhase::Running {
            self.phase = RoundPhase::Idle;
        }
    }

    pub fn pop(&mut self, id: BubbleId) -> Option<ScoreEvent> {
        if !self.is_running() {
            return None;
        }
        let event = self.arena.pop_attempt(id)?;
        self.absorb();
        Some(event)
    }

    pub fn step(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.arena.step(dt);
        self.absorb();
    }

    /// Run the fixed steps `clock` says are due
    pub fn update<C: Clock + ?Sized>(&mut self, clock: &C) -> u32 {
        let steps = self.stepper.due_steps(clock);
        let dt = self.stepper.dt;
        for _ in 0..steps {
            self.step(dt);
        }
        steps
    }

    pub fn resize(&mut self, width_px: f32) {
        self.arena.resize(width_px);
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    pub fn outcome(&self) -> Option<RoundEnd> {
        match self.phase {
            RoundPhase::Ended(end) => Some(end),
            _ => None,
        }
    }

    pub fn arena(&self) -> &BubbleArena {
        &self.arena
    }

    pub fn frame(&self) -> Frame {
        self.arena.frame()
    }

    /// Fold pending arena events into the scoreboard. Anything the arena
    /// emitted after the round ended is dropped.
    fn absorb(&mut self) {
        for event in self.arena.drain_events() {
            if !self.is_running() {
                break;
            }
            match event {
                ArenaEvent::Spawned { bubble, .. } => {
                    self.events.push(RoundEvent::Spawned(bubble));
                }
                ArenaEvent::Tick(frame) => {
                    self.events.push(RoundEvent::Tick(frame));
                }
                ArenaEvent::Score(score) => self.on_score(score),
                ArenaEvent::Expired(bubble) => {
                    self.scoreboard.expired += 1;
                    self.events.push(RoundEvent::Expired(bubble));
                    if self.arena.config().expiry_policy == ExpiryPolicy::CostsLife {
                        self.lose_life();
                    }
                }
                ArenaEvent::TimeUp => self.end(EndReason::TimeExpired),
            }
        }
    }

    fn on_score(&mut self, event: ScoreEvent) {
        match event.kind {
            ScoreKind::Hit => {
                self.scoreboard.score += POINTS_PER_HIT;
                self.scoreboard.hits += 1;
                self.scoreboard.level_pops += 1;
                self.events.push(RoundEvent::Score {
                    event,
                    score: self.scoreboard.score,
                });

                let termination = self.arena.config().termination;
                if let Termination::TargetPops { count } = termination {
                    if self.scoreboard.hits >= count {
                        self.end(EndReason::TargetReached);
                        return;
                    }
                }
                self.maybe_level_up();
            }
            ScoreKind::Miss => {
                self.scoreboard.misses += 1;
                self.events.push(RoundEvent::Score {
                    event,
                    score: self.scoreboard.score,
                });
                self.lose_life();
            }
        }
    }

    fn maybe_level_up(&mut self) {
        let Some(progression) = self.arena.config().progression else {
            return;
        };
        let Some(required) = self.scoreboard.required_pops else {
            return;
        };
        if self.scoreboard.level_pops < required {
            return;
        }

        let level = self.scoreboard.level + 1;
        let rule = if progression.switch_rule {
            self.arena.rule().switched()
        } else {
            self.arena.rule()
        };
        let required = progression.required_for(level);

        self.scoreboard.level = level;
        self.scoreboard.level_pops = 0;
        self.scoreboard.required_pops = Some(required);
        self.arena.set_rule(rule);
        self.arena.set_level(level);

        log::info!("Level {}! Now {}", level, rule.banner());
        self.events.push(RoundEvent::LevelUp {
            level,
            rule,
            required,
        });
    }

    fn lose_life(&mut self) {
        self.scoreboard.lives = self.scoreboard.lives.saturating_sub(1);
        self.events.push(RoundEvent::LifeLost {
            lives: self.scoreboard.lives,
        });
        if self.scoreboard.lives == 0 {
            self.end(EndReason::LivesExhausted);
        }
    }

    fn end(&mut self, reason: EndReason) {
        self.arena.stop_round();
        let end = RoundEnd {
            reason,
            final_score: self.scoreboard.score,
            level: self.scoreboard.level,
            stars: star_rating(self.scoreboard.score),
        };
        log::info!(
            "Round over ({:?}): score {}, level {}, {} stars",
            reason,
            end.final_score,
            end.level,
            end.stars
        );
        self.events.push(RoundEvent::RoundEnd(end));
        self.phase = RoundPhase::Ended(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::Progression;

    fn config(rule: Rule, value: i32, bubbles: u32) -> RoundConfig {
        RoundConfig {
            rule,
            value_min: value,
            value_max: value,
            max_bubbles: bubbles,
            initial_burst: bubbles,
            spawn_interval: 100.0,
            spawn_jitter: 0.0,
            spawn_interval_floor: 0.1,
            termination: Termination::Endless,
            ..Default::default()
        }
    }

    fn live_ids(controller: &RoundController) -> Vec<BubbleId> {
        controller.arena().bubbles().iter().map(|b| b.id).collect()
    }

    fn round_ends(events: &[RoundEvent]) -> Vec<RoundEnd> {
        events
            .iter()
            .filter_map(|e| match e {
                RoundEvent::RoundEnd(end) => Some(*end),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(star_rating(0), 0);
        assert_eq!(star_rating(49), 0);
        assert_eq!(star_rating(50), 1);
        assert_eq!(star_rating(100), 2);
        assert_eq!(star_rating(150), 3);
        assert_eq!(star_rating(10_000), 3);
    }

    #[test]
    fn test_hit_scores() {
        let mut c = RoundController::new();
        c.start(config(Rule::Even, 4, 1), 1).unwrap();
        let id = live_ids(&c)[0];
        c.pop(id).unwrap();
        assert_eq!(c.scoreboard().score, POINTS_PER_HIT);
        assert_eq!(c.scoreboard().hits, 1);
        assert_eq!(c.scoreboard().lives, 3);
    }

    #[test]
    fn test_misses_exhaust_lives() {
        let mut c = RoundController::new();
        c.start(config(Rule::Even, 7, 3), 1).unwrap();
        c.drain_events();
        for id in live_ids(&c) {
            c.pop(id);
        }
        let events = c.drain_events();
        let ends = round_ends(&events);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].reason, EndReason::LivesExhausted);
        assert_eq!(ends[0].final_score, 0);
        assert_eq!(events.last(), Some(&RoundEvent::RoundEnd(ends[0])));
        assert!(!c.arena().is_running());

        c.step(SIM_DT);
        assert!(c.drain_events().is_empty());
        assert_eq!(c.outcome(), Some(ends[0]));
    }

    #[test]
    fn test_level_up_switches_rule_for_new_bubbles() {
        let mut c = RoundController::new();
        let mut cfg = config(Rule::Even, 4, 6);
        cfg.progression = Some(Progression::default());
        c.start(cfg, 1).unwrap();

        let ids = live_ids(&c);
        for id in &ids[..5] {
            c.pop(*id);
        }
        let events = c.drain_events();
        assert!(events.contains(&RoundEvent::LevelUp {
            level: 2,
            rule: Rule::Odd,
            required: 7,
        }));
        assert_eq!(c.arena().rule(), Rule::Odd);
        assert_eq!(c.arena().level(), 2);
        assert_eq!(c.scoreboard().level_pops, 0);

        // Spawned under Even, still a hit
        let kind = c.pop(ids[5]).unwrap().kind;
        assert_eq!(kind, ScoreKind::Hit);
    }

    #[test]
    fn test_target_reached() {
        let mut c = RoundController::new();
        let mut cfg = config(Rule::Odd, 3, 3);
        cfg.termination = Termination::TargetPops { count: 2 };
        c.start(cfg, 1).unwrap();
        let ids = live_ids(&c);
        c.pop(ids[0]);
        c.pop(ids[1]);
        assert_eq!(
            c.outcome().map(|end| end.reason),
            Some(EndReason::TargetReached)
        );
        // Round is over; the third bubble can't be popped
        assert!(c.pop(ids[2]).is_none());
    }

    #[test]
    fn test_time_expired() {
        let mut c = RoundController::new();
        let mut cfg = config(Rule::Odd, 3, 1);
        cfg.termination = Termination::Duration { secs: 0.5 };
        c.start(cfg, 1).unwrap();
        for _ in 0..60 {
            c.step(SIM_DT);
        }
        let ends = round_ends(&c.drain_events());
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].reason, EndReason::TimeExpired);
    }

    #[test]
    fn test_expiry_policy() {
        let mut cfg = config(Rule::Odd, 3, 1);
        cfg.speed_min = 50.0;
        cfg.speed_max = 50.0;

        let mut free = RoundController::new();
        free.start(cfg.clone(), 1).unwrap();
        for _ in 0..130 {
            free.step(SIM_DT);
        }
        assert_eq!(free.scoreboard().expired, 1);
        assert_eq!(free.scoreboard().lives, 3);
        assert!(free.is_running());

        cfg.expiry_policy = ExpiryPolicy::CostsLife;
        cfg.lives = 1;
        let mut costly = RoundController::new();
        costly.start(cfg, 1).unwrap();
        for _ in 0..130 {
            costly.step(SIM_DT);
        }
        assert_eq!(costly.scoreboard().lives, 0);
        assert_eq!(
            costly.outcome().map(|end| end.reason),
            Some(EndReason::LivesExhausted)
        );
    }

    #[test]
    fn test_stop_emits_nothing() {
        let mut c = RoundController::new();
        c.start(config(Rule::Odd, 3, 2), 1).unwrap();
        c.drain_events();
        c.stop();
        assert_eq!(c.phase(), RoundPhase::Idle);
        c.step(SIM_DT);
        assert!(c.pop(live_ids(&c)[0]).is_none());
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_rejected_config_keeps_idle() {
        let mut c = RoundController::new();
        let cfg = RoundConfig {
            lives: 0,
            ..Default::default()
        };
        assert!(c.start(cfg, 1).is_err());
        assert_eq!(c.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_level_progress() {
        let board = Scoreboard {
            level_pops: 2,
            required_pops: Some(5),
            ..Default::default()
        };
        assert!((board.level_progress() - 0.4).abs() < 1e-6);
        assert_eq!(Scoreboard::default().level_progress(), 0.0);
    }
}
