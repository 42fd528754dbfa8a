//! Command-line command handlers for salahtime.
//!
//! Each command lives in its own submodule. This module holds what they
//! share: loading the configuration, resolving the location, zone, clock and
//! calculation settings, and building a [`DayPlanner`] from them.
//!
//! Calculation settings resolve in this order: command-line flag, then the
//! key in `salahtime.toml`, then the settings store, then the built-in default.

pub mod help;
pub mod next;
pub mod qibla;
pub mod settings;
pub mod times;
pub mod watch;
pub mod widget;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::CommandOptions;
use crate::common::constants::MAXIMUM_ADJUSTMENT_MINUTES;
use crate::common::utils::format_coordinates;
use crate::config::{self, Config};
use crate::geo::coordinate::GeoCoordinate;
use crate::geo::location::{LocationFix, LocationResolver};
use crate::geo::timezone::resolve_timezone;
use crate::logger::Log;
use crate::planner::{DayPlanner, PlannerSettings};
use crate::prayer::calculator::PrayerCalculator;
use crate::prayer::method::{Madhab, canonical_method_name};
use crate::prayer::registry::MethodRegistry;
use crate::state::{JsonFileSettingsStore, SalahSettings};
use crate::time_source::{self, FixedTimeSource};

/// Everything a command needs after the configuration has been loaded.
pub struct CommandEnv {
    pub options: CommandOptions,
    pub config: Config,
    pub config_path: PathBuf,
}

impl CommandEnv {
    /// Load the configuration named by `--config`, or the default one.
    pub fn load(options: CommandOptions) -> Result<Self> {
        let custom_dir = options.config_dir.as_deref().map(config::expand_home);
        let (config, config_path) = config::load(custom_dir.as_deref())?;
        if options.debug_enabled {
            config.log_config(&config_path);
        }
        Ok(Self {
            options,
            config,
            config_path,
        })
    }

    pub fn settings_store(&self) -> Result<JsonFileSettingsStore> {
        Ok(JsonFileSettingsStore::new(self.config.settings_path()?))
    }

    /// Resolve every setting and build the planner.
    pub fn planner(&self) -> Result<DayPlanner> {
        let store = self.settings_store()?;
        let stored = SalahSettings::load(&store);
        let settings = resolve_settings(&self.options, &self.config, &stored)?;

        let location = resolve_location(&self.options, &self.config)?;
        let timezone = self.timezone_for(&location)?;

        let calculator = PrayerCalculator::new(MethodRegistry::build());
        Ok(DayPlanner::new(calculator, location, timezone).with_settings(settings))
    }

    /// Zone for displayed times: `--timezone`, then the config key, then the
    /// zone containing the location.
    pub fn timezone_for(&self, location: &LocationFix) -> Result<Tz> {
        let override_name = self
            .options
            .timezone
            .as_deref()
            .or(self.config.timezone.as_deref());
        resolve_timezone(&location.coordinate(), override_name)
    }

    /// The current instant, or the `--at` time when given.
    ///
    /// A pinned time also pins the global clock, so log lines carry it.
    pub fn now(&self, tz: &Tz) -> Result<DateTime<Utc>> {
        match self.options.at.as_deref() {
            Some(at) => {
                let pinned = parse_local_datetime(at, *tz)?;
                time_source::init_time_source(Arc::new(FixedTimeSource::new(pinned)));
                Log::set_display_timezone(Some(*tz));
                Ok(pinned)
            }
            None => Ok(time_source::now()),
        }
    }
}

/// Resolve the calculation settings from flags, config and stored preferences.
pub fn resolve_settings(
    options: &CommandOptions,
    config: &Config,
    stored: &SalahSettings,
) -> Result<PlannerSettings> {
    let method = match options.method.as_deref() {
        Some(name) => canonical_method_name(name)
            .with_context(|| format!("Unknown method '{name}'"))?
            .to_string(),
        None => config
            .method
            .as_deref()
            .and_then(canonical_method_name)
            .map(str::to_string)
            .unwrap_or_else(|| stored.method.clone()),
    };

    let madhab = match options.madhab.as_deref().or(config.madhab.as_deref()) {
        Some(name) => name.parse::<Madhab>()?,
        None => stored.madhab,
    };

    let high_latitude_rule = match config.high_latitude_rule.as_deref() {
        Some(_) => Some(config.high_latitude_rule()),
        None => None,
    };

    let mut adjustments = config.adjustments.unwrap_or(stored.adjustments);
    for (kind, minutes) in &options.adjustments {
        if minutes.abs() > MAXIMUM_ADJUSTMENT_MINUTES {
            anyhow::bail!(
                "Adjustment for {} ({minutes} minutes) must be between -{MAXIMUM_ADJUSTMENT_MINUTES} and {MAXIMUM_ADJUSTMENT_MINUTES}",
                kind.key()
            );
        }
        adjustments.set(*kind, *minutes);
    }

    Ok(PlannerSettings {
        method,
        madhab,
        high_latitude_rule,
        adjustments,
        all_methods: options.all_methods || config.all_methods(),
    })
}

/// Resolve the location: `--lat/--lon`, then the configured coordinate,
/// then the fallback.
pub fn resolve_location(options: &CommandOptions, config: &Config) -> Result<LocationFix> {
    let from_flags = match (options.latitude, options.longitude) {
        (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)?),
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lon must be given together"),
    };

    let resolver = LocationResolver::new(config.location_timeout())
        .with_configured(from_flags.or_else(|| config.configured_coordinate()))
        .with_fallback(config.fallback_coordinate());
    Ok(resolver.resolve())
}

/// Parse a local `YYYY-MM-DD HH:MM[:SS]` in `tz`.
pub fn parse_local_datetime(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    let with_seconds = if trimmed.len() == 16 {
        format!("{trimmed}:00")
    } else {
        trimmed.to_string()
    };
    time_source::parse_datetime_in_tz(&with_seconds, tz).map_err(anyhow::Error::msg)
}

/// Describe a location fix for the output header.
pub(crate) fn describe_location(location: &LocationFix) -> String {
    format!(
        "{} ({}) [{}]",
        location.label,
        format_coordinates(location.lat, location.lon),
        location.source.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::location::LocationSource;
    use crate::prayer::calculator::{AdjustmentSet, PrayerKind};
    use crate::prayer::method::HighLatitudeRule;

    fn stored() -> SalahSettings {
        let mut adjustments = AdjustmentSet::default();
        adjustments.set(PrayerKind::Fajr, 4);
        SalahSettings {
            method: "Karachi".to_string(),
            madhab: Madhab::Shafi,
            adjustments,
        }
    }

    #[test]
    fn test_stored_settings_apply_without_flags_or_config() {
        let settings =
            resolve_settings(&CommandOptions::default(), &Config::default(), &stored()).unwrap();
        assert_eq!(settings.method, "Karachi");
        assert_eq!(settings.madhab, Madhab::Shafi);
        assert_eq!(settings.adjustments.get(PrayerKind::Fajr), 4);
        assert_eq!(settings.high_latitude_rule, None);
        assert!(!settings.all_methods);
    }

    #[test]
    fn test_config_overrides_stored_settings() {
        let config = Config {
            method: Some("egypt".to_string()),
            madhab: Some("hanafi".to_string()),
            high_latitude_rule: Some("middle_of_the_night".to_string()),
            adjustments: Some(AdjustmentSet::default()),
            all_methods: Some(true),
            ..Default::default()
        };
        let settings = resolve_settings(&CommandOptions::default(), &config, &stored()).unwrap();
        assert_eq!(settings.method, "Egypt");
        assert_eq!(settings.madhab, Madhab::Hanafi);
        assert_eq!(
            settings.high_latitude_rule,
            Some(HighLatitudeRule::MiddleOfTheNight)
        );
        assert_eq!(settings.adjustments.get(PrayerKind::Fajr), 0);
        assert!(settings.all_methods);
    }

    #[test]
    fn test_flags_override_everything() {
        let config = Config {
            method: Some("Egypt".to_string()),
            ..Default::default()
        };
        let options = CommandOptions {
            method: Some("tehran".to_string()),
            madhab: Some("hanafi".to_string()),
            adjustments: vec![(PrayerKind::Isha, -3)],
            ..Default::default()
        };
        let settings = resolve_settings(&options, &config, &stored()).unwrap();
        assert_eq!(settings.method, "Tehran");
        assert_eq!(settings.madhab, Madhab::Hanafi);
        // Flag adjustments layer on top of the stored ones
        assert_eq!(settings.adjustments.get(PrayerKind::Fajr), 4);
        assert_eq!(settings.adjustments.get(PrayerKind::Isha), -3);
    }

    #[test]
    fn test_bad_flag_values_are_rejected() {
        let unknown_method = CommandOptions {
            method: Some("Lunar".to_string()),
            ..Default::default()
        };
        assert!(resolve_settings(&unknown_method, &Config::default(), &stored()).is_err());

        let too_far = CommandOptions {
            adjustments: vec![(PrayerKind::Asr, 181)],
            ..Default::default()
        };
        assert!(resolve_settings(&too_far, &Config::default(), &stored()).is_err());
    }

    #[test]
    fn test_resolve_location_precedence() {
        let config = Config {
            latitude: Some(21.4225),
            longitude: Some(39.8262),
            ..Default::default()
        };

        let from_config = resolve_location(&CommandOptions::default(), &config).unwrap();
        assert_eq!(from_config.source, LocationSource::Configured);
        assert_eq!(from_config.lat, 21.4225);

        let options = CommandOptions {
            latitude: Some(-6.2),
            longitude: Some(106.8),
            ..Default::default()
        };
        let from_flags = resolve_location(&options, &config).unwrap();
        assert_eq!(from_flags.lat, -6.2);

        let fallback = resolve_location(&CommandOptions::default(), &Config::default()).unwrap();
        assert!(fallback.source.is_fallback());
        assert_eq!(fallback.lat, 51.5074);
    }

    #[test]
    fn test_resolve_location_rejects_bad_flags() {
        let options = CommandOptions {
            latitude: Some(95.0),
            longitude: Some(0.0),
            ..Default::default()
        };
        assert!(resolve_location(&options, &Config::default()).is_err());

        // Half a pair must not quietly fall through to the configured location
        let config = Config {
            latitude: Some(21.4225),
            longitude: Some(39.8262),
            ..Default::default()
        };
        let latitude_only = CommandOptions {
            latitude: Some(-6.2),
            ..Default::default()
        };
        let err = resolve_location(&latitude_only, &config).unwrap_err();
        assert!(err.to_string().contains("--lat and --lon"));

        let longitude_only = CommandOptions {
            longitude: Some(106.8),
            ..Default::default()
        };
        assert!(resolve_location(&longitude_only, &config).is_err());
    }

    #[test]
    fn test_parse_local_datetime() {
        let tz = chrono_tz::Europe::London;
        let short = parse_local_datetime("2024-06-21 14:30", tz).unwrap();
        let long = parse_local_datetime("2024-06-21 14:30:00", tz).unwrap();
        assert_eq!(short, long);
        assert_eq!(short.format("%H:%M").to_string(), "13:30");
        assert!(parse_local_datetime("tomorrow", tz).is_err());
    }

    #[test]
    fn test_describe_location() {
        let fix = LocationFix {
            lat: 51.5074,
            lon: -0.1278,
            accuracy: None,
            label: "London (fallback)".to_string(),
            source: LocationSource::FallbackNoPermission,
        };
        assert_eq!(
            describe_location(&fix),
            "London (fallback) (51.507°N, 0.128°W) [fallback_no_permission]"
        );
    }
}
