//! Player preferences
//!
//! Persisted in LocalStorage, separately from the tuning table.

use serde::{Deserialize, Serialize};

use crate::sim::GameMode;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mode selected when the page was last open
    pub mode: GameMode,
    /// Vibrate on landings
    pub haptics: bool,
    /// Show the raw sensor readout line
    pub show_debug: bool,
    /// Reduced motion (no banner animation)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Cup,
            haptics: true,
            show_debug: true,
            reduced_motion: false,
        }
    }
}

/// On/off preferences the player can flip from the settings bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Haptics,
    Debug,
    ReducedMotion,
}

impl Toggle {
    pub const ALL: [Toggle; 3] = [Toggle::Haptics, Toggle::Debug, Toggle::ReducedMotion];

    /// Id of the button that flips this preference
    pub fn element_id(self) -> &'static str {
        match self {
            Toggle::Haptics => "toggle-haptics",
            Toggle::Debug => "toggle-debug",
            Toggle::ReducedMotion => "toggle-motion",
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "kendama_settings";

    /// Parse stored JSON, falling back to defaults on anything malformed
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_on(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Haptics => self.haptics,
            Toggle::Debug => self.show_debug,
            Toggle::ReducedMotion => self.reduced_motion,
        }
    }

    /// Flip a preference and return its new value
    pub fn toggle(&mut self, toggle: Toggle) -> bool {
        let flag = match toggle {
            Toggle::Haptics => &mut self.haptics,
            Toggle::Debug => &mut self.show_debug,
            Toggle::ReducedMotion => &mut self.reduced_motion,
        };
        *flag = !*flag;
        *flag
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
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
                log::debug!("Settings saved");
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
        log::debug!("Settings not persisted on native ({})", Self::STORAGE_KEY);
    }
}
