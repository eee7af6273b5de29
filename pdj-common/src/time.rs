//! Time display and conversion helpers

use std::time::Duration;

/// Format seconds as `M:SS` for clip window display.
///
/// Fractional seconds are truncated, matching how clip windows are shown to
/// the user ("0:45 - 1:10").
pub fn format_clip_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let minutes = total / 60;
    let secs = total % 60;
    format!("{}:{:02}", minutes, secs)
}

/// Format a clip window as `M:SS - M:SS`.
pub fn format_window(start_seconds: f64, end_seconds: f64) -> String {
    format!(
        "{} - {}",
        format_clip_time(start_seconds),
        format_clip_time(end_seconds)
    )
}

/// Convert fractional seconds to whole milliseconds (truncating).
pub fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0) as u64
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
