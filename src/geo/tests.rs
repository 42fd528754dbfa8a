#[cfg(test)]
mod coordinate_tests {
    use crate::error::SalahError;
    use crate::geo::coordinate::GeoCoordinate;

    #[test]
    fn test_coordinate_validation() {
        assert!(GeoCoordinate::new(40.7128, -74.0060).is_ok());
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());

        assert!(GeoCoordinate::new(91.0, 0.0).is_err());
        assert!(GeoCoordinate::new(-91.0, 0.0).is_err());
        assert!(GeoCoordinate::new(0.0, 181.0).is_err());
        assert!(GeoCoordinate::new(0.0, 360.0).is_err());
        assert!(GeoCoordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_invalid_coordinate_error_carries_values() {
        let err = GeoCoordinate::new(95.0, 10.0).unwrap_err();
        assert_eq!(
            err,
            SalahError::InvalidCoordinate {
                latitude: 95.0,
                longitude: 10.0
            }
        );
    }

    #[test]
    fn test_fallback_is_london() {
        let fallback = GeoCoordinate::fallback();
        assert_eq!(fallback.latitude, 51.5074);
        assert_eq!(fallback.longitude, -0.1278);
        assert_eq!(fallback.to_string(), "51.507°N, 0.128°W");
    }
}

#[cfg(test)]
mod solar_tests {
    use crate::geo::solar::*;
    use chrono::{NaiveDate, TimeZone, Timelike, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_julian_day_at_midnight() {
        assert_eq!(julian_day_at_midnight(date(2000, 1, 1)), 2_451_544.5);
        assert_eq!(julian_day_at_midnight(date(2024, 6, 21)), 2_460_482.5);
    }

    /// London on the summer solstice: sunrise about 03:43 UTC, sunset about 20:21 UTC.
    #[test]
    fn test_london_summer_solstice() {
        let times = sun_times(date(2024, 6, 21), 51.5074, -0.1278);
        let sunrise = times.sunrise.expect("sunrise should exist in London");
        let sunset = times.sunset.expect("sunset should exist in London");

        let lower = Utc.with_ymd_and_hms(2024, 6, 21, 3, 35, 0).unwrap();
        let upper = Utc.with_ymd_and_hms(2024, 6, 21, 3, 52, 0).unwrap();
        assert!(sunrise > lower && sunrise < upper, "sunrise was {sunrise}");

        let lower = Utc.with_ymd_and_hms(2024, 6, 21, 20, 12, 0).unwrap();
        let upper = Utc.with_ymd_and_hms(2024, 6, 21, 20, 30, 0).unwrap();
        assert!(sunset > lower && sunset < upper, "sunset was {sunset}");
    }

    #[test]
    fn test_equator_has_twelve_hour_day() {
        let times = sun_times(date(2024, 3, 20), 0.0, 0.0);
        let sunrise = times.sunrise.unwrap();
        let sunset = times.sunset.unwrap();
        let day_minutes = (sunset - sunrise).num_minutes();
        assert!((720..=735).contains(&day_minutes), "day was {day_minutes} min");
        assert_eq!(sunrise.hour(), 6);
    }

    #[test]
    fn test_polar_day_and_night_are_indeterminate() {
        // Tromsø: midnight sun in June, polar night in December
        let summer = sun_times(date(2024, 6, 21), 69.6492, 18.9553);
        assert_eq!(summer.sunrise, None);
        assert_eq!(summer.sunset, None);

        let winter = sun_times(date(2024, 12, 21), 69.6492, 18.9553);
        assert_eq!(winter.sunrise, None);
        assert_eq!(winter.sunset, None);
    }

    /// Apia keeps UTC+13 at 171.8°W, so the local day's noon sits late in
    /// the previous UTC day.
    #[test]
    fn test_local_day_west_of_the_date_line() {
        let tz = chrono_tz::Pacific::Apia;
        let day = date(2024, 6, 18);

        let naive = sun_times(day, -13.8333, -171.7667);
        assert_eq!(naive.solar_noon.with_timezone(&tz).date_naive(), date(2024, 6, 19));

        let local = sun_times_local(day, -13.8333, -171.7667, &tz);
        assert_eq!(local.solar_noon.with_timezone(&tz).date_naive(), day);
        let sunrise = local.sunrise.unwrap().with_timezone(&tz);
        let sunset = local.sunset.unwrap().with_timezone(&tz);
        assert_eq!(sunrise.date_naive(), day);
        assert_eq!(sunset.date_naive(), day);
        assert!((6..=7).contains(&sunrise.hour()), "sunrise was {sunrise}");
        assert!((17..=18).contains(&sunset.hour()), "sunset was {sunset}");
    }

    #[test]
    fn test_local_day_matches_utc_day_elsewhere() {
        let day = date(2024, 6, 21);
        assert_eq!(
            sun_times_local(day, 51.5074, -0.1278, &chrono_tz::Europe::London),
            sun_times(day, 51.5074, -0.1278)
        );
        // New Zealand summer time puts local noon near 00:00 UTC
        let wellington = date(2024, 12, 21);
        let auckland = chrono_tz::Pacific::Auckland;
        let local = sun_times_local(wellington, -41.2865, 174.7762, &auckland);
        assert_eq!(local.solar_noon.with_timezone(&auckland).date_naive(), wellington);
    }

    /// Agree with an independent implementation to within a few minutes.
    #[test]
    fn test_agrees_with_sunrise_crate() {
        use sunrise::{Coordinates, SolarDay, SolarEvent};

        let cases = [
            (51.5074, -0.1278, date(2024, 6, 21)),
            (40.7128, -74.0060, date(2024, 12, 21)),
            (-33.8688, 151.2093, date(2024, 3, 1)),
            (21.4225, 39.8262, date(2024, 9, 15)),
        ];

        for (lat, lon, day) in cases {
            let ours = sun_times(day, lat, lon);
            let coord = Coordinates::new(lat, lon).unwrap();
            let solar_day = SolarDay::new(coord, day);
            let sunrise = solar_day.event_time(SolarEvent::Sunrise);
            let sunset = solar_day.event_time(SolarEvent::Sunset);

            let sunrise_diff = (ours.sunrise.unwrap() - sunrise).num_seconds().abs();
            let sunset_diff = (ours.sunset.unwrap() - sunset).num_seconds().abs();
            assert!(
                sunrise_diff <= 300,
                "sunrise differs by {sunrise_diff}s at ({lat}, {lon})"
            );
            assert!(
                sunset_diff <= 300,
                "sunset differs by {sunset_diff}s at ({lat}, {lon})"
            );
        }
    }
}

#[cfg(test)]
mod timezone_tests {
    use crate::geo::coordinate::GeoCoordinate;
    use crate::geo::timezone::*;
    use chrono_tz::{America, Asia, Europe};

    #[test]
    fn test_timezone_detection() {
        assert_eq!(timezone_for_coordinate(40.7128, -74.0060), America::New_York);
        assert_eq!(timezone_for_coordinate(51.5074, -0.1278), Europe::London);
        assert_eq!(timezone_for_coordinate(35.6762, 139.6503), Asia::Tokyo);
        assert_eq!(timezone_for_coordinate(21.4225, 39.8262), Asia::Riyadh);
    }

    #[test]
    fn test_override_wins_over_lookup() {
        let london = GeoCoordinate::fallback();
        assert_eq!(resolve_timezone(&london, None).unwrap(), Europe::London);
        assert_eq!(
            resolve_timezone(&london, Some("Asia/Karachi")).unwrap(),
            Asia::Karachi
        );
        assert!(resolve_timezone(&london, Some("Mars/Olympus_Mons")).is_err());
    }
}

#[cfg(test)]
mod location_tests {
    use crate::geo::coordinate::GeoCoordinate;
    use crate::geo::location::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn reading(lat: f64, lon: f64) -> DeviceReading {
        DeviceReading {
            coordinate: GeoCoordinate::new(lat, lon).unwrap(),
            accuracy: Some(12.0),
        }
    }

    #[test]
    fn test_configured_coordinate_skips_provider() {
        let mut mock = MockLocationProvider::new();
        mock.expect_current_coordinate().never();

        let fix = LocationResolver::new(Duration::from_millis(200))
            .with_configured(Some(GeoCoordinate::new(24.8607, 67.0011).unwrap()))
            .with_provider(Arc::new(mock))
            .resolve();

        assert_eq!(fix.source, LocationSource::Configured);
        assert_eq!(fix.lat, 24.8607);
    }

    #[test]
    fn test_device_fix_is_used() {
        let mut mock = MockLocationProvider::new();
        mock.expect_current_coordinate()
            .times(1)
            .returning(|_| Ok(reading(24.8607, 67.0011)));

        let fix = LocationResolver::new(Duration::from_secs(2))
            .with_provider(Arc::new(mock))
            .resolve();

        assert_eq!(fix.source, LocationSource::Device);
        assert_eq!(fix.label, "Device location");
        assert_eq!(fix.accuracy, Some(12.0));
    }

    #[test]
    fn test_permission_denied_falls_back() {
        let mut mock = MockLocationProvider::new();
        mock.expect_current_coordinate()
            .returning(|_| Err(LocationError::PermissionDenied));

        let fix = LocationResolver::new(Duration::from_secs(2))
            .with_provider(Arc::new(mock))
            .resolve();

        assert_eq!(fix.source, LocationSource::FallbackNoPermission);
        assert_eq!(fix.label, "London (fallback)");
        assert_eq!(fix.coordinate(), GeoCoordinate::fallback());
    }

    #[test]
    fn test_provider_error_falls_back() {
        let mut mock = MockLocationProvider::new();
        mock.expect_current_coordinate()
            .returning(|_| Err(LocationError::Failed("gps offline".to_string())));

        let fix = LocationResolver::new(Duration::from_secs(2))
            .with_provider(Arc::new(mock))
            .resolve();

        assert_eq!(fix.source, LocationSource::FallbackError);
        assert!(fix.source.is_fallback());
    }

    #[test]
    fn test_missing_provider_is_no_permission() {
        let fix = LocationResolver::new(Duration::from_millis(100)).resolve();
        assert_eq!(fix.source, LocationSource::FallbackNoPermission);
    }

    #[test]
    fn test_slow_provider_times_out() {
        struct SlowProvider;
        impl LocationProvider for SlowProvider {
            fn current_coordinate(
                &self,
                _timeout: Duration,
            ) -> Result<DeviceReading, LocationError> {
                std::thread::sleep(Duration::from_millis(800));
                Ok(DeviceReading {
                    coordinate: GeoCoordinate::fallback(),
                    accuracy: None,
                })
            }
        }

        let started = Instant::now();
        let fix = LocationResolver::new(Duration::from_millis(50))
            .with_provider(Arc::new(SlowProvider))
            .resolve();

        assert_eq!(fix.source, LocationSource::FallbackTimeout);
        assert!(started.elapsed() < Duration::from_millis(700));
    }

    #[test]
    fn test_location_source_serializes_snake_case() {
        let json = serde_json::to_string(&LocationSource::FallbackNoPermission).unwrap();
        assert_eq!(json, "\"fallback_no_permission\"");
    }
}
