//! Player preferences
//!
//! Persisted separately from high scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::input::ControlScheme;

/// Which touch controls to wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TouchControls {
    /// Buttons on touch-capable devices, half-screen taps elsewhere
    #[default]
    Auto,
    Buttons,
    HalfScreen,
}

impl TouchControls {
    /// Pick the control scheme for a device with `max_touch_points`
    pub fn resolve(&self, max_touch_points: i32) -> ControlScheme {
        match self {
            TouchControls::Auto if max_touch_points > 0 => ControlScheme::Buttons,
            TouchControls::Auto => ControlScheme::HalfScreen,
            TouchControls::Buttons => ControlScheme::Buttons,
            TouchControls::HalfScreen => ControlScheme::HalfScreen,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Silences music and every cue
    pub muted: bool,
    pub music_volume: f32,
    pub impact_volume: f32,
    pub flipper_volume: f32,
    pub life_lost_volume: f32,
    pub game_over_volume: f32,
    pub bumper_volume: f32,

    // === Controls ===
    pub touch_controls: TouchControls,

    // === Scores ===
    /// Endpoint receiving `{ user_id, score }` on game over
    pub score_api: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            music_volume: 0.05,
            impact_volume: 0.5,
            flipper_volume: 0.5,
            life_lost_volume: 0.7,
            game_over_volume: 0.7,
            bumper_volume: 0.7,

            touch_controls: TouchControls::Auto,

            score_api: "/api/v1/monthly-scores".to_string(),
        }
    }
}

impl Settings {
    /// Flip the mute flag and return the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "neon_pinball_settings";

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
                    Err(e) => log::warn!("Ignoring unreadable settings: {e}"),
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
        log::debug!("No {} on native, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.muted);
        assert_eq!(settings.music_volume, 0.05);
        assert_eq!(settings.bumper_volume, 0.7);
        assert_eq!(settings.score_api, "/api/v1/monthly-scores");
    }

    #[test]
    fn test_toggle_mute() {
        let mut settings = Settings::default();
        assert!(settings.toggle_mute());
        assert!(!settings.toggle_mute());
    }

    #[test]
    fn test_touch_controls_resolve() {
        assert_eq!(TouchControls::Auto.resolve(5), ControlScheme::Buttons);
        assert_eq!(TouchControls::Auto.resolve(0), ControlScheme::HalfScreen);
        assert_eq!(TouchControls::HalfScreen.resolve(5), ControlScheme::HalfScreen);
        assert_eq!(TouchControls::Buttons.resolve(0), ControlScheme::Buttons);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"muted":true}"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.flipper_volume, 0.5);
        assert_eq!(settings.touch_controls, TouchControls::Auto);
    }
}
