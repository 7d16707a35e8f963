//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (time comes from an injected clock)
//! - Seeded RNG only
//! - Stable iteration order (by bubble ID)
//! - No rendering or platform dependencies

pub mod arena;
pub mod bubble;
pub mod clock;
pub mod config;
pub mod grid;
pub mod round;
pub mod rule;

pub use arena::{ArenaEvent, BubbleArena, Frame, ScoreEvent, ScoreKind};
pub use bubble::{Bubble, BubbleId, BubbleSnapshot, BubbleState};
pub use clock::{Clock, FixedStep, ManualClock, Timer};
pub use config::{
    ArenaGeometry, ConfigError, ExpiryPolicy, Progression, RoundConfig, Termination, ValueTier,
};
pub use grid::{ColumnSpan, Placement, PlacementQuality, SlotGrid};
pub use round::{EndReason, RoundController, RoundEnd, RoundEvent, RoundPhase, Scoreboard, star_rating};
pub use rule::Rule;
