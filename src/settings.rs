//! Player preferences
//!
//! Persisted in LocalStorage on the web; defaults on native.

use serde::{Deserialize, Serialize};

use crate::sim::{ExpiryPolicy, RoundConfig, Rule, ValueTier};

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" | "med" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Round parameters for this preset
    pub fn round_config(&self, rule: Rule) -> RoundConfig {
        let mut config = RoundConfig::odd_even(rule);
        match self {
            Difficulty::Easy => {
                // Small numbers that grow with the level, slow bubbles, extra lives
                config.value_max = 10;
                config.value_tiers = vec![
                    ValueTier {
                        from_level: 3,
                        value_max: 20,
                    },
                    ValueTier {
                        from_level: 5,
                        value_max: 50,
                    },
                ];
                config.speed_min *= 0.75;
                config.speed_max *= 0.75;
                config.spawn_interval = 1.2;
                config.max_bubbles = 10;
                config.initial_burst = 5;
                config.lives = 5;
            }
            Difficulty::Normal => {}
            Difficulty::Hard => {
                config.speed_min *= 1.3;
                config.speed_max *= 1.3;
                config.spawn_interval = 0.6;
                config.spawn_interval_floor = 0.3;
                config.expiry_policy = ExpiryPolicy::CostsLife;
            }
        }
        config
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Rule for the first level (None = coin flip each round)
    pub starting_rule: Option<Rule>,

    // === Accessibility ===
    /// No sideways drift
    pub reduced_motion: bool,

    // === Appearance ===
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            starting_rule: None,
            reduced_motion: false,
            dark_mode: false,
        }
    }
}

impl Settings {
    /// Round config for the next round. `coin` picks the rule when no
    /// starting rule is set.
    pub fn round_config(&self, coin: bool) -> RoundConfig {
        let rule = self
            .starting_rule
            .unwrap_or(if coin { Rule::Odd } else { Rule::Even });
        self.difficulty.round_config(rule)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bubble_pop_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Discarding unreadable settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
