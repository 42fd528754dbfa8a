use super::*;
use crate::common::constants::*;
use crate::error::SalahError;
use crate::geo::location::{LocationFix, LocationSource};
use crate::prayer::calculator::{AdjustmentSet, PrayerCalculator, PrayerKind, PrayerRequest};
use crate::prayer::method::Madhab;
use crate::prayer::payload::PrayerResponse;
use crate::prayer::registry::MethodRegistry;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn london_response() -> PrayerResponse {
    let request = PrayerRequest {
        location: LocationFix {
            lat: 51.5074,
            lon: -0.1278,
            accuracy: None,
            label: FALLBACK_LABEL.to_string(),
            source: LocationSource::FallbackTimeout,
        },
        date: NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
        timezone: chrono_tz::Europe::London,
        method: "MWL".to_string(),
        madhab: Madhab::Shafi,
        high_latitude_rule: None,
        adjustments: AdjustmentSet::default(),
        all_methods: false,
        calculated_at: Utc.with_ymd_and_hms(2024, 6, 21, 9, 0, 0).unwrap(),
    };
    PrayerCalculator::new(MethodRegistry::build())
        .compute(&request)
        .into()
}

#[test]
fn test_memory_store_get_set() {
    let store = MemorySettingsStore::new();
    assert_eq!(store.get("missing"), None);

    store.set("key", json!({"a": 1})).unwrap();
    assert_eq!(store.get("key"), Some(json!({"a": 1})));

    store.set("key", json!(2)).unwrap();
    assert_eq!(store.get("key"), Some(json!(2)));
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = JsonFileSettingsStore::new(&path);
    assert_eq!(store.get("anything"), None);
    store.set("first", json!("one")).unwrap();
    store.set("second", json!([1, 2])).unwrap();

    let reopened = JsonFileSettingsStore::new(&path);
    assert_eq!(reopened.get("first"), Some(json!("one")));
    assert_eq!(reopened.get("second"), Some(json!([1, 2])));

    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(on_disk.is_object());
}

#[test]
fn test_file_store_tolerates_corrupt_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let store = JsonFileSettingsStore::new(&path);
    assert_eq!(store.get("salah_settings_v1"), None);

    // Saving replaces the corrupt document
    store.set("key", json!(true)).unwrap();
    assert_eq!(store.get("key"), Some(json!(true)));
}

#[test]
fn test_file_store_rejects_non_object_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let store = JsonFileSettingsStore::new(&path);
    assert_eq!(store.get("0"), None);
}

#[test]
fn test_salah_settings_first_run_defaults() {
    let store = MemorySettingsStore::new();
    let settings = SalahSettings::load(&store);
    assert_eq!(settings.method, "Moonsighting");
    assert_eq!(settings.madhab, Madhab::Hanafi);
    assert_eq!(settings.adjustments, AdjustmentSet::default());
}

#[test]
fn test_salah_settings_partial_adjustments_merge() {
    let store = MemorySettingsStore::new();
    store
        .set(
            SALAH_SETTINGS_KEY,
            json!({"method": "isna", "adjustments": {"fajr": 10}}),
        )
        .unwrap();

    let settings = SalahSettings::load(&store);
    assert_eq!(settings.method, "ISNA");
    assert_eq!(settings.madhab, Madhab::Hanafi);
    assert_eq!(settings.adjustments.get(PrayerKind::Fajr), 10);
    assert_eq!(settings.adjustments.get(PrayerKind::Isha), 0);
}

#[test]
fn test_salah_settings_bad_values_fall_back() {
    let store = MemorySettingsStore::new();
    store
        .set(
            SALAH_SETTINGS_KEY,
            json!({"method": "Lunar", "madhab": "maliki"}),
        )
        .unwrap();
    let settings = SalahSettings::load(&store);
    assert_eq!(settings.method, DEFAULT_METHOD);
    assert_eq!(settings.madhab, Madhab::Hanafi);

    store.set(SALAH_SETTINGS_KEY, json!("garbage")).unwrap();
    assert_eq!(SalahSettings::load(&store), SalahSettings::default());
}

#[test]
fn test_salah_settings_save_writes_full_document() {
    let store = MemorySettingsStore::new();
    let mut settings = SalahSettings {
        method: "Karachi".to_string(),
        madhab: Madhab::Shafi,
        ..Default::default()
    };
    settings.adjustments.set(PrayerKind::Maghrib, 3);
    settings.save(&store).unwrap();

    let stored = store.get(SALAH_SETTINGS_KEY).unwrap();
    assert_eq!(stored["method"], "Karachi");
    assert_eq!(stored["madhab"], "shafi");
    assert_eq!(stored["adjustments"]["maghrib"], 3);
    assert_eq!(stored["adjustments"]["fajr"], 0);

    assert_eq!(SalahSettings::load(&store), settings);
}

#[test]
fn test_quran_settings_defaults_and_merge() {
    let store = MemorySettingsStore::new();
    let defaults = QuranSettings::load(&store);
    assert_eq!(defaults.reciter, "ar.alafasy");
    assert!(!defaults.play_translation);
    assert!(defaults.use_offline_audio_when_available);

    store
        .set(QURAN_SETTINGS_KEY, json!({"playTranslation": true}))
        .unwrap();
    let merged = QuranSettings::load(&store);
    assert!(merged.play_translation);
    assert_eq!(merged.reciter, "ar.alafasy");

    store.set(QURAN_SETTINGS_KEY, json!({"reciter": 7})).unwrap();
    assert_eq!(QuranSettings::load(&store), QuranSettings::default());
}

#[test]
fn test_quran_settings_save_uses_camel_case() {
    let store = MemorySettingsStore::new();
    let settings = QuranSettings {
        reciter: "ar.husary".to_string(),
        ..Default::default()
    };
    settings.save(&store).unwrap();

    let stored = store.get(QURAN_SETTINGS_KEY).unwrap();
    assert_eq!(stored["reciter"], "ar.husary");
    assert_eq!(stored["useOfflineAudioWhenAvailable"], true);
}

#[test]
fn test_artifact_sink_replaces_whole_file() {
    let dir = tempdir().unwrap();
    let sink = ArtifactSink::new(dir.path().join("data").join(WIDGET_FILE_NAME));
    assert!(sink.read().unwrap().is_none());

    let response = london_response();
    sink.write(&response).unwrap();
    assert_eq!(sink.read().unwrap(), Some(response));

    let error: PrayerResponse = Err(SalahError::ComputationUnavailable {
        reason: "no calculation methods available".to_string(),
    })
    .into();
    sink.write(&error).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(sink.path()).unwrap()).unwrap();
    assert_eq!(raw["error"], true);
    assert!(raw.get("results").is_none());

    // No temp files left next to the artifact
    let entries = fs::read_dir(sink.path().parent().unwrap()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_artifact_payload_shape() {
    let dir = tempdir().unwrap();
    let sink = ArtifactSink::new(dir.path().join(WIDGET_FILE_NAME));
    sink.write(&london_response()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(sink.path()).unwrap()).unwrap();
    assert_eq!(raw["methodRequested"], "MWL");
    assert_eq!(raw["location"]["source"], "fallback_timeout");
    assert!(raw["results"]["MWL"]["times"]["fajr"].is_string());
}
