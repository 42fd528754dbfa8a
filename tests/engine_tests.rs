//! End-to-end runs of the engine through the public API: a request goes in,
//! a payload (or its JSON file) comes out.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use salahtime::error::SalahError;
use salahtime::geo::location::{LocationFix, LocationSource};
use salahtime::planner::{DayPlanner, PlannerSettings};
use salahtime::prayer::method::{CalculationParameters, default_presets};
use salahtime::prayer::{
    AdjustmentSet, Madhab, MethodRegistry, PrayerCalculator, PrayerKind, PrayerRequest,
    PrayerResponse,
};
use salahtime::schedule::next_event::UpcomingEvent;
use salahtime::state::ArtifactSink;
use tempfile::tempdir;

fn london() -> LocationFix {
    LocationFix {
        lat: 51.5074,
        lon: -0.1278,
        accuracy: None,
        label: "London".to_string(),
        source: LocationSource::Configured,
    }
}

fn solstice() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
}

fn request(adjustments: AdjustmentSet) -> PrayerRequest {
    PrayerRequest {
        location: london(),
        date: solstice(),
        timezone: chrono_tz::Europe::London,
        method: "MWL".to_string(),
        madhab: Madhab::Shafi,
        high_latitude_rule: None,
        adjustments,
        all_methods: false,
        calculated_at: Utc.with_ymd_and_hms(2024, 6, 21, 8, 0, 0).unwrap(),
    }
}

fn minutes_of_day(time: &str) -> u32 {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M").unwrap();
    parsed.signed_duration_since(NaiveTime::MIN).num_minutes() as u32
}

#[test]
fn test_london_solstice_end_to_end() {
    let calculator = PrayerCalculator::new(MethodRegistry::build());
    let payload = calculator.compute(&request(AdjustmentSet::default())).unwrap();
    let (name, result) = payload.primary().unwrap();
    assert_eq!(name, "MWL");

    let times = &result.times;
    assert!(times.fajr.starts_with("02:"), "fajr was {}", times.fajr);
    assert!(minutes_of_day(&times.sunrise) < 5 * 60);
    assert!(minutes_of_day(&times.maghrib) > 21 * 60);

    for kind in PrayerKind::day_order(false) {
        let value = times.get(kind);
        assert!(
            NaiveTime::parse_from_str(value, "%H:%M").is_ok(),
            "{} was {value}",
            kind.key()
        );
    }

    // 2024-06-21 is a Friday
    assert_eq!(times.jummah.as_deref(), Some(times.dhuhr.as_str()));
}

#[test]
fn test_fajr_adjustment_shifts_display_by_ten_minutes() {
    let calculator = PrayerCalculator::new(MethodRegistry::build());

    let baseline = calculator.compute(&request(AdjustmentSet::default())).unwrap();
    let mut adjustments = AdjustmentSet::default();
    adjustments.set(PrayerKind::Fajr, 10);
    let adjusted = calculator.compute(&request(adjustments)).unwrap();

    let (_, before) = baseline.primary().unwrap();
    let (_, after) = adjusted.primary().unwrap();
    assert_eq!(
        minutes_of_day(&after.times.fajr),
        minutes_of_day(&before.times.fajr) + 10
    );
    assert_eq!(after.times.dhuhr, before.times.dhuhr);
    assert_eq!(after.times.isha, before.times.isha);
    assert_eq!(adjusted.requested_adjustments.get(PrayerKind::Fajr), 10);
}

fn unavailable() -> Result<CalculationParameters, SalahError> {
    Err(SalahError::InvalidParameters {
        reason: "disabled".to_string(),
    })
}

#[test]
fn test_registry_survives_failing_presets() {
    let mut builders = default_presets();
    let mwl = builders.iter().position(|(name, _)| *name == "MWL").unwrap();
    let egypt = builders.iter().position(|(name, _)| *name == "Egypt").unwrap();
    builders[mwl].1 = unavailable;
    builders[egypt].1 = unavailable;

    let registry = MethodRegistry::build_from(&builders);
    assert_eq!(registry.len(), 6);

    let calculator = PrayerCalculator::new(registry);
    let payload = calculator.compute(&request(AdjustmentSet::default())).unwrap();
    let selection = payload.method_selection.as_ref().unwrap();
    assert!(selection.is_fallback());
    assert_eq!(selection.used(), "Moonsighting");
    assert_eq!(payload.method_requested, "MWL");
    assert!(payload.results.contains_key("Moonsighting"));
    assert!(!payload.results.contains_key("MWL"));

    // The serialized entry is found through `methodUsed`
    let json = serde_json::to_value(&payload).unwrap();
    let used = json["methodUsed"].as_str().unwrap();
    assert_eq!(used, "Moonsighting");
    assert!(json["results"][used]["times"]["fajr"].is_string());
    assert!(json["results"]["MWL"].is_null());
}

#[test]
fn test_planner_writes_widget_file() {
    let dir = tempdir().unwrap();
    let sink = ArtifactSink::new(dir.path().join("salah-widget-data.json"));
    let planner = DayPlanner::new(
        PrayerCalculator::new(MethodRegistry::build()),
        london(),
        chrono_tz::Europe::London,
    )
    .with_settings(PlannerSettings {
        method: "ISNA".to_string(),
        ..Default::default()
    });

    let now = Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap();
    sink.write(&planner.response(now)).unwrap();

    let raw = std::fs::read_to_string(sink.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["methodRequested"], "ISNA");
    assert_eq!(json["date"], "2024-06-21");
    assert_eq!(json["location"]["source"], "configured");
    assert!(json["results"]["ISNA"]["times"]["asr"].is_string());

    let Some(PrayerResponse::Payload(payload)) = sink.read().unwrap() else {
        panic!("expected a payload");
    };
    assert_eq!(payload.method_used.as_deref(), Some("ISNA"));
}

#[test]
fn test_planner_next_event_after_isha() {
    let planner = DayPlanner::new(
        PrayerCalculator::new(MethodRegistry::build()),
        london(),
        chrono_tz::Europe::London,
    );

    // 22:30 BST, after Maghrib
    let now = Utc.with_ymd_and_hms(2024, 6, 21, 21, 30, 0).unwrap();
    let status = planner.status(now).unwrap();
    assert!(now < status.next.instant());
    assert!((0.0..=1.0).contains(&status.progress));
    let previous = status.previous.expect("maghrib has passed");
    assert!(previous.instant <= now);
    assert!(matches!(status.next, UpcomingEvent::Today(_)));
}
