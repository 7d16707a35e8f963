//! Round configuration
//!
//! Everything the round controller hands the simulator at `start_round`.
//! Configs are plain data (serde) and are validated before a round starts;
//! an invalid config never reaches a running arena.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rule::Rule;
use crate::consts::*;

/// Why a round config was rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("value range is empty: min {min} > max {max}")]
    EmptyValueRange { min: i32, max: i32 },
    #[error("size range must be positive and ordered, got {min}..={max}")]
    InvalidSizeRange { min: f32, max: f32 },
    #[error("speed range must be positive and ordered, got {min}..={max}")]
    InvalidSpeedRange { min: f32, max: f32 },
    #[error("invalid spawn timing: {0}")]
    InvalidSpawnTiming(&'static str),
    #[error("max_bubbles must be at least 1")]
    ZeroCap,
    #[error("lives must be at least 1")]
    ZeroLives,
    #[error("invalid termination: {0}")]
    InvalidTermination(&'static str),
    #[error("invalid arena geometry: {0}")]
    InvalidGeometry(&'static str),
    #[error("invalid progression: {0}")]
    InvalidProgression(&'static str),
    #[error("failed to parse round config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a round ends (besides running out of lives, which always ends it)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Round clock counts down from `secs`
    Duration { secs: f32 },
    /// Round ends after `count` correct pops
    TargetPops { count: u32 },
    /// Only lives end the round
    Endless,
}

/// Whether a bubble floating away unpopped costs a life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    #[default]
    Free,
    CostsLife,
}

/// Level-up schedule: after `initial_required` correct pops the level
/// increases and the requirement grows by `step`, up to `max_required`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub initial_required: u32,
    pub step: u32,
    pub max_required: u32,
    /// Swap the rule (odd <-> even) on every level-up
    pub switch_rule: bool,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            initial_required: 5,
            step: 2,
            max_required: 15,
            switch_rule: true,
        }
    }
}

impl Progression {
    /// Pops required to clear `level` (1-based)
    pub fn required_for(&self, level: u32) -> u32 {
        let extra = self.step.saturating_mul(level.saturating_sub(1));
        self.initial_required
            .saturating_add(extra)
            .min(self.max_required)
    }
}

/// Raises the top of the value range once the round reaches `from_level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTier {
    pub from_level: u32,
    pub value_max: i32,
}

/// Arena dimensions as seen by the slot grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaGeometry {
    /// Arena width in CSS pixels
    pub width_px: f32,
    /// Number of slot grid columns
    pub columns: usize,
    /// Extra spacing multiplier applied when converting bubble size to columns
    pub scale_factor: f32,
    /// Height of the spawn band (percent of arena height above the spawn edge)
    pub spawn_band_pct: f32,
}

impl Default for ArenaGeometry {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_ARENA_WIDTH_PX,
            columns: DEFAULT_COLUMNS,
            scale_factor: 1.0,
            spawn_band_pct: DEFAULT_SPAWN_BAND_PCT,
        }
    }
}

impl ArenaGeometry {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width_px.is_finite() && self.width_px > 0.0) {
            return Err(ConfigError::InvalidGeometry("width_px must be positive"));
        }
        if self.columns < GRID_SECTIONS {
            return Err(ConfigError::InvalidGeometry(
                "columns must be at least the number of grid sections",
            ));
        }
        if self.columns > MAX_COLUMNS {
            return Err(ConfigError::InvalidGeometry("too many columns"));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(ConfigError::InvalidGeometry("scale_factor must be positive"));
        }
        if !(self.spawn_band_pct > 0.0 && self.spawn_band_pct <= 100.0) {
            return Err(ConfigError::InvalidGeometry(
                "spawn_band_pct must be in (0, 100]",
            ));
        }
        Ok(())
    }
}

/// Parameters of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Rule active at round start
    pub rule: Rule,
    /// Inclusive value range
    pub value_min: i32,
    pub value_max: i32,
    /// Larger numbers at higher levels, sorted by `from_level`
    pub value_tiers: Vec<ValueTier>,
    /// Inclusive diameter range (pixels)
    pub size_min: f32,
    pub size_max: f32,
    /// Rise speed range (percent of arena height per second)
    pub speed_min: f32,
    pub speed_max: f32,
    /// Speed multiplier added per level above 1
    pub speed_per_level: f32,
    /// Base seconds between spawn attempts
    pub spawn_interval: f32,
    /// Random extra delay, uniform in [0, spawn_jitter)
    pub spawn_jitter: f32,
    /// Interval never shrinks below this
    pub spawn_interval_floor: f32,
    /// Interval multiplier per level above 1
    pub spawn_interval_decay: f32,
    /// Bubbles spawned immediately at round start
    pub initial_burst: u32,
    /// Concurrent live bubble cap
    pub max_bubbles: u32,
    pub termination: Termination,
    pub lives: u32,
    pub expiry_policy: ExpiryPolicy,
    pub progression: Option<Progression>,
    pub geometry: ArenaGeometry,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::odd_even(Rule::Odd)
    }
}

impl RoundConfig {
    /// Classic odd/even bubble pop: numbers 1-100, 50-70px bubbles,
    /// a bubble every 0.8-1.6s, up to 15 on screen, three lives
    pub fn odd_even(rule: Rule) -> Self {
        Self {
            rule,
            value_min: 1,
            value_max: 100,
            value_tiers: Vec::new(),
            size_min: 50.0,
            size_max: 70.0,
            speed_min: 25.0,
            speed_max: 31.0,
            speed_per_level: 0.25,
            spawn_interval: 0.8,
            spawn_jitter: 0.8,
            spawn_interval_floor: 0.4,
            spawn_interval_decay: 0.9,
            initial_burst: 9,
            max_bubbles: 15,
            termination: Termination::Endless,
            lives: 3,
            expiry_policy: ExpiryPolicy::Free,
            progression: Some(Progression::default()),
            geometry: ArenaGeometry::default(),
        }
    }

    /// Parse and validate a JSON config. Missing fields take the classic defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.value_min > self.value_max {
            return Err(ConfigError::EmptyValueRange {
                min: self.value_min,
                max: self.value_max,
            });
        }
        let mut previous_level = 1;
        for tier in &self.value_tiers {
            if tier.value_max < self.value_min {
                return Err(ConfigError::EmptyValueRange {
                    min: self.value_min,
                    max: tier.value_max,
                });
            }
            if tier.from_level < previous_level {
                return Err(ConfigError::InvalidProgression(
                    "value tiers must be sorted by from_level",
                ));
            }
            previous_level = tier.from_level;
        }
        if !(self.size_min > 0.0 && self.size_min <= self.size_max && self.size_max.is_finite()) {
            return Err(ConfigError::InvalidSizeRange {
                min: self.size_min,
                max: self.size_max,
            });
        }
        if !(self.speed_min > 0.0 && self.speed_min <= self.speed_max && self.speed_max.is_finite())
            || !(self.speed_per_level >= 0.0 && self.speed_per_level.is_finite())
        {
            return Err(ConfigError::InvalidSpeedRange {
                min: self.speed_min,
                max: self.speed_max,
            });
        }
        if !(self.spawn_interval > 0.0 && self.spawn_interval.is_finite()) {
            return Err(ConfigError::InvalidSpawnTiming("spawn_interval must be positive"));
        }
        if !(self.spawn_interval_floor > 0.0 && self.spawn_interval_floor.is_finite()) {
            return Err(ConfigError::InvalidSpawnTiming(
                "spawn_interval_floor must be positive",
            ));
        }
        if !(self.spawn_jitter >= 0.0 && self.spawn_jitter.is_finite()) {
            return Err(ConfigError::InvalidSpawnTiming("spawn_jitter must be non-negative"));
        }
        if !(self.spawn_interval_decay > 0.0 && self.spawn_interval_decay <= 1.0) {
            return Err(ConfigError::InvalidSpawnTiming(
                "spawn_interval_decay must be in (0, 1]",
            ));
        }
        if self.max_bubbles == 0 {
            return Err(ConfigError::ZeroCap);
        }
        if self.lives == 0 {
            return Err(ConfigError::ZeroLives);
        }
        match self.termination {
            Termination::Duration { secs } if !(secs > 0.0 && secs.is_finite()) => {
                return Err(ConfigError::InvalidTermination("duration must be positive"));
            }
            Termination::TargetPops { count: 0 } => {
                return Err(ConfigError::InvalidTermination("target pop count must be at least 1"));
            }
            _ => {}
        }
        if let Some(progression) = &self.progression {
            if progression.initial_required == 0 {
                return Err(ConfigError::InvalidProgression(
                    "initial_required must be at least 1",
                ));
            }
            if progression.max_required < progression.initial_required {
                return Err(ConfigError::InvalidProgression(
                    "max_required must not be below initial_required",
                ));
            }
        }
        self.geometry.validate()
    }

    /// Top of the value range at `level`
    pub fn value_max_for(&self, level: u32) -> i32 {
        self.value_tiers
            .iter()
            .rev()
            .find(|tier| tier.from_level <= level)
            .map_or(self.value_max, |tier| tier.value_max)
    }

    /// Speed multiplier at `level` (1-based)
    pub fn speed_factor(&self, level: u32) -> f32 {
        1.0 + self.speed_per_level * level.saturating_sub(1) as f32
    }

    /// Base spawn interval at `level`, before jitter
    pub fn spawn_interval_for(&self, level: u32) -> f32 {
        let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        (self.spawn_interval * self.spawn_interval_decay.powi(exponent))
            .max(self.spawn_interval_floor)
    }
}
