//! Calculation method presets and the conventions they carry.
//!
//! A preset fixes the twilight angles (or Isha interval), the per-prayer
//! minute offsets an authority publishes, and the high-latitude rule. The
//! madhab is not part of a preset; it is injected per request.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SalahError;

/// School of thought, which only changes the Asr shadow length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Madhab {
    /// Standard (Shafi, Maliki, Hanbali): shadow length 1.
    Shafi,
    /// Hanafi: shadow length 2.
    #[default]
    Hanafi,
}

impl Madhab {
    pub fn shadow_length(&self) -> f64 {
        match self {
            Madhab::Shafi => 1.0,
            Madhab::Hanafi => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Madhab::Shafi => "shafi",
            Madhab::Hanafi => "hanafi",
        }
    }
}

impl FromStr for Madhab {
    type Err = SalahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shafi" | "standard" => Ok(Madhab::Shafi),
            "hanafi" => Ok(Madhab::Hanafi),
            other => Err(SalahError::InvalidParameters {
                reason: format!("unknown madhab '{other}' (expected 'shafi' or 'hanafi')"),
            }),
        }
    }
}

impl std::fmt::Display for Madhab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How Fajr and Isha are bounded when twilight lasts all night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighLatitudeRule {
    MiddleOfTheNight,
    SeventhOfTheNight,
    #[default]
    TwilightAngle,
}

impl HighLatitudeRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighLatitudeRule::MiddleOfTheNight => "middle_of_the_night",
            HighLatitudeRule::SeventhOfTheNight => "seventh_of_the_night",
            HighLatitudeRule::TwilightAngle => "twilight_angle",
        }
    }
}

impl FromStr for HighLatitudeRule {
    type Err = SalahError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "middle_of_the_night" => Ok(HighLatitudeRule::MiddleOfTheNight),
            "seventh_of_the_night" => Ok(HighLatitudeRule::SeventhOfTheNight),
            "twilight_angle" => Ok(HighLatitudeRule::TwilightAngle),
            other => Err(SalahError::InvalidParameters {
                reason: format!(
                    "unknown high latitude rule '{other}' (expected 'middle_of_the_night', 'seventh_of_the_night' or 'twilight_angle')"
                ),
            }),
        }
    }
}

/// Fractions of the night used as the safe Fajr/Isha bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightPortions {
    pub fajr: f64,
    pub isha: f64,
}

/// How Isha is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun this many degrees below the horizon.
    Angle(f64),
    /// Fixed number of minutes after sunset.
    Interval(i64),
}

/// Minute offsets published by a method's authority, applied before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodAdjustments {
    pub fajr: i64,
    pub sunrise: i64,
    pub dhuhr: i64,
    pub asr: i64,
    pub maghrib: i64,
    pub isha: i64,
}

/// A complete parameter bundle for one calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationParameters {
    /// Registry name, e.g. `MWL`.
    pub name: String,
    pub fajr_angle: f64,
    pub isha: IshaRule,
    /// Maghrib by angle rather than at sunset (used by Tehran).
    pub maghrib_angle: Option<f64>,
    pub madhab: Madhab,
    pub high_latitude_rule: HighLatitudeRule,
    pub method_adjustments: MethodAdjustments,
    /// Moonsighting Committee: seasonal twilight bounds and the 1/7 rule above 55°N.
    pub moonsighting: bool,
}

impl CalculationParameters {
    fn new(name: &str, fajr_angle: f64, isha: IshaRule) -> Self {
        Self {
            name: name.to_string(),
            fajr_angle,
            isha,
            maghrib_angle: None,
            madhab: Madhab::default(),
            high_latitude_rule: HighLatitudeRule::default(),
            method_adjustments: MethodAdjustments::default(),
            moonsighting: false,
        }
    }

    pub fn with_madhab(mut self, madhab: Madhab) -> Self {
        self.madhab = madhab;
        self
    }

    pub fn with_high_latitude_rule(mut self, rule: HighLatitudeRule) -> Self {
        self.high_latitude_rule = rule;
        self
    }

    fn with_dhuhr_offset(mut self, minutes: i64) -> Self {
        self.method_adjustments.dhuhr = minutes;
        self
    }

    pub fn night_portions(&self) -> NightPortions {
        match self.high_latitude_rule {
            HighLatitudeRule::MiddleOfTheNight => NightPortions {
                fajr: 1.0 / 2.0,
                isha: 1.0 / 2.0,
            },
            HighLatitudeRule::SeventhOfTheNight => NightPortions {
                fajr: 1.0 / 7.0,
                isha: 1.0 / 7.0,
            },
            HighLatitudeRule::TwilightAngle => NightPortions {
                fajr: self.fajr_angle / 60.0,
                isha: match self.isha {
                    IshaRule::Angle(angle) => angle / 60.0,
                    IshaRule::Interval(_) => 0.0,
                },
            },
        }
    }

    /// Reject angle and interval values that cannot describe twilight.
    pub fn validate(&self) -> Result<(), SalahError> {
        let invalid = |reason: String| SalahError::InvalidParameters { reason };

        if !(0.0 < self.fajr_angle && self.fajr_angle < 30.0) {
            return Err(invalid(format!(
                "{}: fajr angle {} outside (0, 30)",
                self.name, self.fajr_angle
            )));
        }
        match self.isha {
            IshaRule::Angle(angle) if !(0.0 < angle && angle < 30.0) => {
                return Err(invalid(format!(
                    "{}: isha angle {angle} outside (0, 30)",
                    self.name
                )));
            }
            IshaRule::Interval(minutes) if !(1..=180).contains(&minutes) => {
                return Err(invalid(format!(
                    "{}: isha interval {minutes} min outside 1..=180",
                    self.name
                )));
            }
            _ => {}
        }
        if let Some(angle) = self.maghrib_angle
            && !(0.0 < angle && angle < 30.0)
        {
            return Err(invalid(format!(
                "{}: maghrib angle {angle} outside (0, 30)",
                self.name
            )));
        }
        Ok(())
    }
}

/// Constructor for a named preset. Construction may fail; the registry skips failures.
pub type PresetBuilder = fn() -> Result<CalculationParameters, SalahError>;

fn checked(params: CalculationParameters) -> Result<CalculationParameters, SalahError> {
    params.validate()?;
    Ok(params)
}

/// Muslim World League.
pub fn muslim_world_league() -> Result<CalculationParameters, SalahError> {
    checked(CalculationParameters::new("MWL", 18.0, IshaRule::Angle(17.0)).with_dhuhr_offset(1))
}

/// Islamic Society of North America.
pub fn north_america() -> Result<CalculationParameters, SalahError> {
    checked(CalculationParameters::new("ISNA", 15.0, IshaRule::Angle(15.0)).with_dhuhr_offset(1))
}

/// Egyptian General Authority of Survey.
pub fn egyptian() -> Result<CalculationParameters, SalahError> {
    checked(
        CalculationParameters::new("Egypt", 19.5, IshaRule::Angle(17.5)).with_dhuhr_offset(1),
    )
}

/// University of Islamic Sciences, Karachi.
pub fn karachi() -> Result<CalculationParameters, SalahError> {
    checked(
        CalculationParameters::new("Karachi", 18.0, IshaRule::Angle(18.0)).with_dhuhr_offset(1),
    )
}

/// Umm al-Qura University, Makkah. Isha 90 minutes after Maghrib.
pub fn umm_al_qura() -> Result<CalculationParameters, SalahError> {
    checked(CalculationParameters::new(
        "UmmAlQura",
        18.5,
        IshaRule::Interval(90),
    ))
}

/// Institute of Geophysics, University of Tehran.
pub fn tehran() -> Result<CalculationParameters, SalahError> {
    let mut params = CalculationParameters::new("Tehran", 17.7, IshaRule::Angle(14.0));
    params.maghrib_angle = Some(4.5);
    checked(params)
}

/// Moonsighting Committee Worldwide.
pub fn moonsighting_committee() -> Result<CalculationParameters, SalahError> {
    let mut params = CalculationParameters::new("Moonsighting", 18.0, IshaRule::Angle(18.0));
    params.method_adjustments.dhuhr = 5;
    params.method_adjustments.maghrib = 3;
    params.moonsighting = true;
    checked(params)
}

/// Makkah: the Umm al-Qura convention under its own name.
pub fn makkah() -> Result<CalculationParameters, SalahError> {
    checked(CalculationParameters::new(
        "Makkah",
        18.5,
        IshaRule::Interval(90),
    ))
}

/// Every preset in display order.
pub fn default_presets() -> Vec<(&'static str, PresetBuilder)> {
    vec![
        ("MWL", muslim_world_league as PresetBuilder),
        ("ISNA", north_america),
        ("Egypt", egyptian),
        ("Karachi", karachi),
        ("UmmAlQura", umm_al_qura),
        ("Tehran", tehran),
        ("Moonsighting", moonsighting_committee),
        ("Makkah", makkah),
    ]
}

/// Names accepted for the `method` setting.
pub const METHOD_NAMES: [&str; 8] = [
    "MWL",
    "ISNA",
    "Egypt",
    "Karachi",
    "UmmAlQura",
    "Tehran",
    "Moonsighting",
    "Makkah",
];

/// Look up the canonical spelling of a method name, ignoring case.
pub fn canonical_method_name(name: &str) -> Option<&'static str> {
    METHOD_NAMES
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(name.trim()))
}
