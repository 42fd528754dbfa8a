//! Small formatting helpers shared by the CLI commands and the payload builder.

use std::path::Path;
use std::time::Duration;

/// Format a countdown as `HH:MM:SS`. Zero renders as `00:00:00`.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Format a distance for display: kilometres with one decimal from 1 km up,
/// whole metres below that.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

/// Replace the home directory prefix with `~` so logs don't leak user names.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Format a coordinate pair as `51.507°N, 0.128°W`.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    let lat_dir = if latitude >= 0.0 { "N" } else { "S" };
    let lon_dir = if longitude >= 0.0 { "E" } else { "W" };
    format!(
        "{:.3}°{}, {:.3}°{}",
        latitude.abs(),
        lat_dir,
        longitude.abs(),
        lon_dir
    )
}

/// Whether a process with `pid` exists, by checking `/proc/{pid}`.
pub fn is_process_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::ZERO), "00:00:00");
        assert_eq!(format_remaining(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_remaining(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_remaining(Duration::from_secs(26 * 3600)), "26:00:00");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(4_790_123.0), "4790.1 km");
    }

    #[test]
    fn test_format_coordinates() {
        assert_eq!(
            format_coordinates(51.5074, -0.1278),
            "51.507°N, 0.128°W"
        );
        assert_eq!(format_coordinates(-33.9, 18.4), "33.900°S, 18.400°E");
    }

    #[test]
    fn test_is_process_running() {
        assert!(is_process_running(std::process::id()));
        assert!(!is_process_running(u32::MAX));
    }
}
