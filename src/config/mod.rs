//! Configuration system for salahtime.
//!
//! Settings live in `salahtime.toml` under the XDG config directory
//! (`~/.config/salahtime/`), or in the directory passed with `--config`.
//! A commented default file is written on first load.
//!
//! ```toml
//! #[Calculation]
//! method = "Moonsighting"             # MWL, ISNA, Egypt, Karachi, UmmAlQura, Tehran, Moonsighting, Makkah
//! madhab = "hanafi"                   # Asr convention: "shafi" or "hanafi"
//! high_latitude_rule = "twilight_angle"
//! all_methods = false                 # Compute every available method
//!
//! #[Location]
//! latitude = 51.5074                  # Leave unset to use the device location
//! longitude = -0.1278
//! location_timeout_ms = 7000          # Wait for a device fix (100-60000)
//! timezone = "Europe/London"          # Override the zone derived from coordinates
//!
//! [adjustments]                       # Minutes added after calculation (-180..180)
//! fajr = 0
//! ```
//!
//! Coordinates may also be kept in a separate `geo.toml` next to the main
//! file, which then takes precedence. This keeps the location out of a main
//! config that is shared or version controlled.
//!
//! The loaded [`Config`] is passed explicitly to every service. Nothing reads
//! configuration from a global.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::{format_coordinates, private_path};
use crate::geo::coordinate::GeoCoordinate;
use crate::geo::timezone::parse_timezone;
use crate::prayer::calculator::AdjustmentSet;
use crate::prayer::method::{HighLatitudeRule, Madhab, canonical_method_name};

pub use builder::create_default_config;
pub use loading::{get_config_path, load, load_from_path};

/// Coordinates stored apart from the main configuration.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct GeoConfig {
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
}

/// Settings loaded from `salahtime.toml`.
///
/// Every field is optional; the accessors below resolve the documented
/// default when a key is missing.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name of the calculation method preset.
    pub method: Option<String>,
    /// Asr convention: "shafi" (or "standard") or "hanafi".
    pub madhab: Option<String>,
    pub high_latitude_rule: Option<String>,
    /// Compute every method in the registry instead of just one.
    pub all_methods: Option<bool>,

    /// Fixed location. When unset the device location is requested.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Coordinate used when the device location is unavailable.
    pub fallback_latitude: Option<f64>,
    pub fallback_longitude: Option<f64>,
    pub location_timeout_ms: Option<u64>,
    /// IANA zone name, overriding the zone derived from the coordinate.
    pub timezone: Option<String>,

    /// Where `widget` and `watch` write the payload JSON.
    pub widget_path: Option<String>,
    /// Where persisted user preferences live.
    pub settings_path: Option<String>,

    /// Per-event minute offsets.
    pub adjustments: Option<AdjustmentSet>,
}

impl Config {
    /// Canonical method name, or the default preset.
    pub fn method_name(&self) -> String {
        self.method
            .as_deref()
            .and_then(canonical_method_name)
            .unwrap_or(DEFAULT_METHOD)
            .to_string()
    }

    pub fn madhab(&self) -> Madhab {
        self.madhab
            .as_deref()
            .unwrap_or(DEFAULT_MADHAB)
            .parse()
            .unwrap_or_default()
    }

    pub fn high_latitude_rule(&self) -> HighLatitudeRule {
        self.high_latitude_rule
            .as_deref()
            .unwrap_or(DEFAULT_HIGH_LATITUDE_RULE)
            .parse()
            .unwrap_or_default()
    }

    pub fn all_methods(&self) -> bool {
        self.all_methods.unwrap_or(false)
    }

    pub fn adjustments(&self) -> AdjustmentSet {
        self.adjustments.unwrap_or_default()
    }

    /// The fixed location, when both halves are configured.
    pub fn configured_coordinate(&self) -> Option<GeoCoordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoCoordinate::new(lat, lon).ok(),
            _ => None,
        }
    }

    pub fn fallback_coordinate(&self) -> GeoCoordinate {
        match (self.fallback_latitude, self.fallback_longitude) {
            (Some(lat), Some(lon)) => {
                GeoCoordinate::new(lat, lon).unwrap_or_else(|_| GeoCoordinate::fallback())
            }
            _ => GeoCoordinate::fallback(),
        }
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(
            self.location_timeout_ms
                .unwrap_or(DEFAULT_LOCATION_TIMEOUT_MS),
        )
    }

    /// The configured zone override, if any.
    pub fn timezone_override(&self) -> Result<Option<Tz>> {
        self.timezone.as_deref().map(parse_timezone).transpose()
    }

    /// Widget artifact path; defaults to the XDG data directory.
    pub fn widget_path(&self) -> Result<PathBuf> {
        match &self.widget_path {
            Some(path) => Ok(expand_home(path)),
            None => Ok(data_dir()?.join(WIDGET_FILE_NAME)),
        }
    }

    /// Settings store path; defaults to the XDG state directory.
    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.settings_path {
            Some(path) => Ok(expand_home(path)),
            None => {
                let base = dirs::state_dir()
                    .or_else(dirs::data_dir)
                    .context("Could not determine state directory")?;
                Ok(base.join(APP_NAME).join(SETTINGS_FILE_NAME))
            }
        }
    }

    pub fn log_config(&self, source: &std::path::Path) {
        log_block_start!("Loaded configuration");
        log_indented!("File: {}", private_path(source));
        if self.all_methods() {
            log_indented!("Method: all available");
        } else {
            log_indented!("Method: {}", self.method_name());
        }
        log_indented!("Madhab: {}", self.madhab());
        log_indented!("High latitude rule: {}", self.high_latitude_rule().as_str());

        match self.configured_coordinate() {
            Some(c) => log_indented!("Location: {}", format_coordinates(c.latitude, c.longitude)),
            None => log_indented!(
                "Location: device ({} ms timeout)",
                self.location_timeout().as_millis()
            ),
        }
        if let Some(tz) = &self.timezone {
            log_indented!("Timezone: {tz}");
        }

        let adjusted: Vec<String> = self
            .adjustments()
            .iter()
            .filter(|(_, minutes)| *minutes != 0)
            .map(|(kind, minutes)| format!("{} {minutes:+}", kind.key()))
            .collect();
        if !adjusted.is_empty() {
            log_indented!("Adjustments: {}", adjusted.join(", "));
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .context("Could not determine data directory")?
        .join(APP_NAME))
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
