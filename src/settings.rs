//! Player selections and preferences
//!
//! Written by the menu shell, read once when a run starts. Persisted to
//! LocalStorage; the core only ever sees the resulting `RunConfig`.

use serde::{Deserialize, Serialize};

use crate::catalog::{Environment, Vehicle};
use crate::sim::{CameraMode, GameMode};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Selected car
    pub vehicle: Vehicle,
    /// Selected scenery
    pub environment: Environment,
    pub mode: GameMode,
    /// Camera the next run starts in
    pub camera: CameraMode,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vehicle: Vehicle::default(),
            environment: Environment::default(),
            mode: GameMode::default(),
            camera: CameraMode::default(),
            master_volume: 0.8,
            muted: false,
        }
    }
}

impl Settings {
    /// Volume actually applied to tone gains
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    /// Apply the menu's string selections; unknown ids fall back to defaults
    pub fn select(&mut self, mode: &str, car: &str, environment: &str) {
        self.mode = GameMode::from_id(mode);
        self.vehicle = Vehicle::from_id(car);
        self.environment = Environment::from_id(environment);
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "rd_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
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
    pub fn save(&self) {}
}
