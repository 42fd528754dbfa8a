//! `salahtime qibla`: bearing and distance to the Kaaba.
//!
//! A heading given with `--heading` is treated as a device held still: the
//! same reading is fed to a compass session until the smoothed estimate has
//! settled, and the remaining turn is reported.

use anyhow::Result;

use super::{CommandEnv, describe_location, resolve_location};
use crate::args::CommandOptions;
use crate::common::utils::format_distance;
use crate::geo::coordinate::GeoCoordinate;
use crate::qibla::bearing::{circular_difference, qibla_from};
use crate::qibla::session::{
    FixedHeadingHub, HeadingSession, QiblaReading, SensorEvent, SessionState,
};

const SETTLE_TOLERANCE_DEGREES: f64 = 0.05;
const MAX_SETTLE_SAMPLES: usize = 64;

pub fn handle_qibla_command(options: CommandOptions, heading: Option<f64>) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;
    let location = resolve_location(&env.options, &env.config)?;
    let reading = compass_reading(&location.coordinate(), heading);

    log_block_start!("Qibla from {}", describe_location(&location));
    log_indented!("Bearing: {:.1}° from true north", reading.bearing_degrees);
    log_indented!("Distance: {}", format_distance(reading.distance_meters));

    match (reading.heading_degrees, reading.offset_degrees) {
        (Some(heading), Some(offset)) => {
            log_block_start!("Heading: {heading:.1}° ({})", reading.source);
            if reading.aligned {
                log_indented!("Facing the qibla");
            } else if offset > 0.0 {
                log_indented!("Turn right {offset:.1}°");
            } else {
                log_indented!("Turn left {:.1}°", offset.abs());
            }
        }
        _ => log_indented!(
            "No heading available; face {:.0}° from north",
            reading.bearing_degrees
        ),
    }
    log_end!();
    Ok(())
}

/// Run a compass session against a fixed heading and return the settled
/// reading. Without a heading the reading is bearing-only.
pub fn compass_reading(from: &GeoCoordinate, heading: Option<f64>) -> QiblaReading {
    let mut session = HeadingSession::new(qibla_from(from));
    let state = session.open(&FixedHeadingHub::new(heading));
    session.pump();

    if let (SessionState::Tracking(_), Some(degrees)) = (state, heading) {
        for _ in 0..MAX_SETTLE_SAMPLES {
            let settled = session.snapshot().heading_degrees.is_some_and(|estimate| {
                circular_difference(degrees, estimate).abs() <= SETTLE_TOLERANCE_DEGREES
            });
            if settled {
                break;
            }
            session.handle_event(SensorEvent::Heading {
                degrees,
                accuracy: None,
            });
        }
    }

    let reading = session.snapshot();
    session.close();
    reading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> GeoCoordinate {
        GeoCoordinate::new(51.5074, -0.1278).unwrap()
    }

    #[test]
    fn test_reading_without_heading_is_bearing_only() {
        let reading = compass_reading(&london(), None);
        assert!((reading.bearing_degrees - 118.99).abs() < 0.05);
        assert_eq!(reading.heading_degrees, None);
        assert_eq!(reading.source, "none");
        assert!(!reading.aligned);
    }

    #[test]
    fn test_fixed_heading_settles() {
        let reading = compass_reading(&london(), Some(121.0));
        let heading = reading.heading_degrees.unwrap();
        assert!((heading - 121.0).abs() <= SETTLE_TOLERANCE_DEGREES);
        assert_eq!(reading.source, "location");
        assert!(reading.aligned);
        // Bearing is about 119, so the turn is to the left
        assert!(reading.offset_degrees.unwrap() < 0.0);
    }

    #[test]
    fn test_fixed_heading_across_north() {
        let reading = compass_reading(&london(), Some(350.0));
        assert!((reading.heading_degrees.unwrap() - 350.0).abs() <= SETTLE_TOLERANCE_DEGREES);
        assert!(!reading.aligned);
        assert!(reading.offset_degrees.unwrap() > 0.0);
    }
}
