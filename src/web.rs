//! Browser bindings
//!
//! The page owns rendering, input and the animation loop. Each animation
//! frame it calls `frame(performance.now())` and draws the returned JSON;
//! clicks on a bubble call `pop(id)`.

use wasm_bindgen::prelude::*;

use crate::settings::{Difficulty, Settings};
use crate::sim::{BubbleId, Clock, RoundConfig, RoundController};
use crate::view::FrameView;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Bubble Pop starting...");
}

/// Timestamp handed over by requestAnimationFrame
struct FrameClock {
    now_secs: f64,
}

impl Clock for FrameClock {
    fn now(&self) -> f64 {
        self.now_secs
    }
}

/// Game instance holding all state
#[wasm_bindgen]
pub struct WebGame {
    controller: RoundController,
    settings: Settings,
    width_px: f32,
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            controller: RoundController::new(),
            settings: Settings::load(),
            width_px: crate::consts::DEFAULT_ARENA_WIDTH_PX,
        }
    }

    /// Start a round with the player's preferred settings
    pub fn start(&mut self) -> Result<(), JsValue> {
        let config = self.settings.round_config(js_sys::Math::random() < 0.5);
        self.start_round(config)
    }

    /// Start a round from a JSON `RoundConfig` (missing fields take defaults)
    pub fn start_with_config(&mut self, json: &str) -> Result<(), JsValue> {
        let config = RoundConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.start_round(config)
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Returns false when the click hit nothing poppable
    pub fn pop(&mut self, id: u32) -> bool {
        self.controller.pop(BubbleId(id)).is_some()
    }

    pub fn resize(&mut self, width_px: f32) {
        self.width_px = width_px;
        self.controller.resize(width_px);
    }

    /// Advance to `now_ms` and describe what to draw
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let clock = FrameClock {
            now_secs: now_ms / 1000.0,
        };
        self.controller.update(&clock);
        let events = self.controller.drain_events();
        let frame = self.controller.frame();
        FrameView::new(
            &frame,
            self.controller.scoreboard(),
            &events,
            self.controller.outcome(),
            &self.settings,
        )
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Returns false for an unknown preset name
    pub fn set_difficulty(&mut self, name: &str) -> bool {
        match Difficulty::from_str(name) {
            Some(difficulty) => {
                self.settings.difficulty = difficulty;
                self.settings.save();
                true
            }
            None => {
                log::warn!("Unknown difficulty: {}", name);
                false
            }
        }
    }

    pub fn dark_mode(&self) -> bool {
        self.settings.dark_mode
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.settings.dark_mode = enabled;
        self.settings.save();
    }

    pub fn set_reduced_motion(&mut self, enabled: bool) {
        self.settings.reduced_motion = enabled;
        self.settings.save();
    }
}

impl WebGame {
    fn start_round(&mut self, mut config: RoundConfig) -> Result<(), JsValue> {
        if self.width_px.is_finite() && self.width_px > 0.0 {
            config.geometry.width_px = self.width_px;
        }
        let seed = js_sys::Date::now() as u64;
        self.controller
            .start(config, seed)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Round started with seed: {}", seed);
        Ok(())
    }
}
