//! Validated geographic coordinate value type.

use serde::{Deserialize, Serialize};

use crate::common::constants::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE};
use crate::error::SalahError;

/// A point on the Earth in decimal degrees.
///
/// Construct through [`GeoCoordinate::new`] so the range invariant holds:
/// latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SalahError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(SalahError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The default coordinate used when no location can be obtained (London).
    pub fn fallback() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
        }
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            crate::common::utils::format_coordinates(self.latitude, self.longitude)
        )
    }
}
