//! Application-wide constants and defaults.
//!
//! Defaults here are what the configuration layer and the settings store fall
//! back to when a key is missing, so changing one of them changes first-run
//! behaviour for every user.

// # Application

/// Name used for the config directory, state directory and version header.
pub const APP_NAME: &str = "salahtime";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "salahtime.toml";

/// Widget artifact file name inside the data directory.
pub const WIDGET_FILE_NAME: &str = "salah-widget-data.json";

/// Settings store file name inside the state directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Lock file name for the watch loop (inside XDG_RUNTIME_DIR or /tmp).
pub const LOCK_FILE_NAME: &str = "salahtime.lock";

// # Settings store keys

pub const SALAH_SETTINGS_KEY: &str = "salah_settings_v1";
pub const QURAN_SETTINGS_KEY: &str = "quran_settings_v1";

pub const DEFAULT_RECITER: &str = "ar.alafasy";

// # Calculation defaults

pub const DEFAULT_METHOD: &str = "Moonsighting";
pub const DEFAULT_MADHAB: &str = "hanafi";
pub const DEFAULT_HIGH_LATITUDE_RULE: &str = "twilight_angle";

/// Method tried when the requested one is not in the registry.
pub const FALLBACK_METHOD: &str = "Moonsighting";

/// Placeholder shown for events that could not be resolved (polar day/night).
pub const UNRESOLVED_PLACEHOLDER: &str = "—";

/// Hard limit for a single user adjustment, in minutes.
pub const MAXIMUM_ADJUSTMENT_MINUTES: i64 = 180;

// # Location

pub const FALLBACK_LATITUDE: f64 = 51.5074;
pub const FALLBACK_LONGITUDE: f64 = -0.1278;
pub const FALLBACK_LABEL: &str = "London (fallback)";

pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 7000;
pub const MINIMUM_LOCATION_TIMEOUT_MS: u64 = 100;
pub const MAXIMUM_LOCATION_TIMEOUT_MS: u64 = 60_000;

// # Qibla

/// The Kaaba, Makkah.
pub const QIBLA_LATITUDE: f64 = 21.422487;
pub const QIBLA_LONGITUDE: f64 = 39.826206;

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Heading smoothing factor applied to the previous estimate.
pub const HEADING_SMOOTHING_ALPHA: f64 = 0.15;

/// Maximum absolute difference between heading and bearing to count as aligned.
pub const ALIGNMENT_THRESHOLD_DEGREES: f64 = 5.0;

/// Sampling intervals requested from the sensor streams.
pub const TILT_SENSOR_INTERVAL_MS: u64 = 150;
pub const RAW_MAGNETOMETER_INTERVAL_MS: u64 = 200;

// # Astronomy

/// Sun's upper-limb elevation at rise/set for the standalone solar model.
pub const SUN_ALTITUDE_RISE_SET_DEGREES: f64 = -0.833;

/// Obliquity of the ecliptic used by the standalone solar model.
pub const OBLIQUITY_DEGREES: f64 = 23.4397;

/// Solar altitude (−50′) used for sunrise/sunset by the prayer engine.
pub const PRAYER_SUN_ALTITUDE_DEGREES: f64 = -50.0 / 60.0;

// # Scheduling

/// Grace period after local midnight before the daily recompute fires.
pub const MIDNIGHT_GRACE_SECONDS: i64 = 1;

/// Local hour used for "tomorrow" when no location is known.
pub const DEFAULT_MORNING_HOUR: u32 = 6;

/// Fixed evening hour for the location-free day/night split.
pub const DEFAULT_EVENING_HOUR: u32 = 18;

/// Retry delay when the day/night computation fails.
pub const THEME_RETRY_MINUTES: i64 = 5;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
