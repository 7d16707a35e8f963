//! Bubble Pop - a number-drill arcade game for young students
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawn grid, bubble lifecycle, rounds)
//! - `view`: Presentation-only helpers (drift, fades, frame serialization)
//! - `settings`: Player preferences
//! - `web`: Browser bindings (wasm32 only)

pub mod settings;
pub mod sim;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one step per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per update to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock gap a single update will account for (seconds)
    pub const MAX_FRAME_SECS: f32 = 0.1;

    /// Arena defaults
    pub const DEFAULT_ARENA_WIDTH_PX: f32 = 800.0;
    pub const DEFAULT_COLUMNS: usize = 20;
    pub const MAX_COLUMNS: usize = 1000;
    pub const DEFAULT_SPAWN_BAND_PCT: f32 = 25.0;
    /// Bubbles enter with their top edge on the bottom boundary...
    pub const SPAWN_Y: f32 = 100.0;
    /// ...and expire once it crosses the top one
    pub const EXIT_Y: f32 = 0.0;

    /// Spawn allocator tuning
    pub const GRID_SECTIONS: usize = 4;
    pub const SECTION_ATTEMPTS: u32 = 6;
    pub const FALLBACK_ATTEMPTS: u32 = 10;
    pub const FALLBACK_MAX_NEIGHBORS: usize = 1;

    /// Scoring
    pub const POINTS_PER_HIT: u64 = 10;
    /// Final score needed for one, two and three stars
    pub const STAR_THRESHOLDS: [u64; 3] = [50, 100, 150];
}
