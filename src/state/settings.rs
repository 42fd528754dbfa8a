//! Typed views over the settings store.
//!
//! Stored documents are merged field by field over the defaults, so a value
//! written by an older build (or by hand) with keys missing still loads. A
//! value that does not parse at all is reported and replaced by the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::store::SettingsStore;
use crate::common::constants::*;
use crate::prayer::calculator::AdjustmentSet;
use crate::prayer::method::{Madhab, canonical_method_name};

/// Calculation preferences stored under `salah_settings_v1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalahSettings {
    pub method: String,
    pub madhab: Madhab,
    pub adjustments: AdjustmentSet,
}

impl Default for SalahSettings {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            madhab: Madhab::Hanafi,
            adjustments: AdjustmentSet::default(),
        }
    }
}

/// Shape of the stored document before defaults are applied.
#[derive(Debug, Default, Deserialize)]
struct StoredSalahSettings {
    method: Option<String>,
    madhab: Option<String>,
    adjustments: Option<AdjustmentSet>,
}

impl SalahSettings {
    /// Read the stored preferences, filling anything missing with defaults.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let Some(value) = store.get(SALAH_SETTINGS_KEY) else {
            return Self::default();
        };

        let stored: StoredSalahSettings = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                log_warning!("Stored prayer settings are unreadable ({e}), using defaults");
                return Self::default();
            }
        };

        let defaults = Self::default();
        let method = match stored.method.as_deref() {
            Some(name) => match canonical_method_name(name) {
                Some(canonical) => canonical.to_string(),
                None => {
                    log_warning!("Stored method '{name}' is unknown, using {}", defaults.method);
                    defaults.method
                }
            },
            None => defaults.method,
        };
        let madhab = match stored.madhab.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|_| {
                log_warning!("Stored madhab '{name}' is unknown, using {}", defaults.madhab);
                defaults.madhab
            }),
            None => defaults.madhab,
        };

        Self {
            method,
            madhab,
            // Missing event keys deserialize as zero
            adjustments: stored.adjustments.unwrap_or_default(),
        }
    }

    /// Write the complete, default-filled document back to the store.
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        let value = serde_json::to_value(self).context("Failed to serialize prayer settings")?;
        store.set(SALAH_SETTINGS_KEY, value)
    }
}

/// Recitation preferences stored under `quran_settings_v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuranSettings {
    pub reciter: String,
    pub play_translation: bool,
    pub use_offline_audio_when_available: bool,
}

impl Default for QuranSettings {
    fn default() -> Self {
        Self {
            reciter: DEFAULT_RECITER.to_string(),
            play_translation: false,
            use_offline_audio_when_available: true,
        }
    }
}

impl QuranSettings {
    pub fn load(store: &dyn SettingsStore) -> Self {
        match store.get(QURAN_SETTINGS_KEY) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log_warning!("Stored recitation settings are unreadable ({e}), using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        let value =
            serde_json::to_value(self).context("Failed to serialize recitation settings")?;
        store.set(QURAN_SETTINGS_KEY, value)
    }
}
