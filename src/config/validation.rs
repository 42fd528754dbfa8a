//! Configuration validation.
//!
//! Rejects values the engine cannot use before anything is computed, with a
//! message naming the offending key.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;
use crate::geo::timezone::parse_timezone;
use crate::prayer::method::{HighLatitudeRule, METHOD_NAMES, Madhab, canonical_method_name};

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(method) = config.method.as_deref()
        && canonical_method_name(method).is_none()
    {
        anyhow::bail!(
            "Unknown method '{}'. Expected one of: {}",
            method,
            METHOD_NAMES.join(", ")
        );
    }

    if let Some(madhab) = config.madhab.as_deref()
        && madhab.parse::<Madhab>().is_err()
    {
        anyhow::bail!("Unknown madhab '{madhab}'. Expected \"shafi\" or \"hanafi\"");
    }

    if let Some(rule) = config.high_latitude_rule.as_deref()
        && rule.parse::<HighLatitudeRule>().is_err()
    {
        anyhow::bail!(
            "Unknown high_latitude_rule '{rule}'. Expected \"middle_of_the_night\", \
             \"seventh_of_the_night\" or \"twilight_angle\""
        );
    }

    validate_coordinate_pair(config.latitude, config.longitude, "latitude", "longitude")?;
    validate_coordinate_pair(
        config.fallback_latitude,
        config.fallback_longitude,
        "fallback_latitude",
        "fallback_longitude",
    )?;

    if let Some(timeout) = config.location_timeout_ms
        && !(MINIMUM_LOCATION_TIMEOUT_MS..=MAXIMUM_LOCATION_TIMEOUT_MS).contains(&timeout)
    {
        anyhow::bail!(
            "location_timeout_ms ({}) must be between {} and {} milliseconds",
            timeout,
            MINIMUM_LOCATION_TIMEOUT_MS,
            MAXIMUM_LOCATION_TIMEOUT_MS
        );
    }

    if let Some(tz) = config.timezone.as_deref() {
        parse_timezone(tz)?;
    }

    if let Some(adjustments) = &config.adjustments {
        for (kind, minutes) in adjustments.iter() {
            if minutes.abs() > MAXIMUM_ADJUSTMENT_MINUTES {
                anyhow::bail!(
                    "adjustments.{} ({} minutes) must be between -{} and {}",
                    kind.key(),
                    minutes,
                    MAXIMUM_ADJUSTMENT_MINUTES,
                    MAXIMUM_ADJUSTMENT_MINUTES
                );
            }
        }
    }

    for (key, value) in [
        ("widget_path", &config.widget_path),
        ("settings_path", &config.settings_path),
    ] {
        if let Some(path) = value
            && path.trim().is_empty()
        {
            anyhow::bail!("{key} must not be empty");
        }
    }

    Ok(())
}

/// Both halves of a coordinate must be given together and be in range.
fn validate_coordinate_pair(
    latitude: Option<f64>,
    longitude: Option<f64>,
    lat_key: &str,
    lon_key: &str,
) -> Result<()> {
    if let Some(lat) = latitude
        && !(lat.is_finite() && (-90.0..=90.0).contains(&lat))
    {
        anyhow::bail!("{lat_key} must be between -90 and 90 degrees (got {lat})");
    }

    if let Some(lon) = longitude
        && !(lon.is_finite() && (-180.0..=180.0).contains(&lon))
    {
        anyhow::bail!("{lon_key} must be between -180 and 180 degrees (got {lon})");
    }

    match (latitude, longitude) {
        (Some(_), None) => anyhow::bail!("{lat_key} is set but {lon_key} is missing"),
        (None, Some(_)) => anyhow::bail!("{lon_key} is set but {lat_key} is missing"),
        _ => Ok(()),
    }
}
