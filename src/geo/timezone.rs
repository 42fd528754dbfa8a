//! Time zone resolution for a coordinate.
//!
//! Displayed prayer times are local to the coordinate, not to the machine
//! running the engine, so the zone comes from a polygon lookup on the
//! coordinate itself. A configured IANA name overrides the lookup.

use anyhow::{Result, bail};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

use crate::geo::coordinate::GeoCoordinate;

// Building the finder decodes the embedded polygon set, so do it once.
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// Determine the IANA time zone containing a coordinate.
///
/// Falls back to UTC when the lookup returns a name chrono-tz does not know.
pub fn timezone_for_coordinate(latitude: f64, longitude: f64) -> Tz {
    let name = FINDER.get_tz_name(longitude, latitude);
    name.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Resolve the zone used to format times for `coordinate`.
pub fn resolve_timezone(coordinate: &GeoCoordinate, override_name: Option<&str>) -> Result<Tz> {
    match override_name {
        Some(name) => parse_timezone(name),
        None => Ok(timezone_for_coordinate(
            coordinate.latitude,
            coordinate.longitude,
        )),
    }
}

/// Parse an IANA time zone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    match name.parse::<Tz>() {
        Ok(tz) => Ok(tz),
        Err(_) => bail!("Unknown time zone '{name}'"),
    }
}
