//! Timestamp helpers.
//!
//! Timestamps are stored as UTC milliseconds and only converted to a
//! fixed display offset when rendered.

use chrono::{DateTime, FixedOffset, Utc};

/// Current UTC time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format the span between two timestamps as `M min S sec`.
///
/// Negative spans (clock skew) render as zero.
pub fn format_duration(start_ms: i64, end_ms: i64) -> String {
    let total_secs = ((end_ms - start_ms) / 1000).max(0);
    format!("{} min {} sec", total_secs / 60, total_secs % 60)
}

/// Build a display offset from minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Render a stored timestamp as `dd.mm.yyyy HH:MM:SS` in the given offset
pub fn format_local(ms: i64, offset: FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(utc) => utc.with_timezone(&offset).format("%d.%m.%Y %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Compact timestamp for file names (`YYYYmmdd_HHMMSS`)
pub fn file_stamp(ms: i64, offset: FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(utc) => utc.with_timezone(&offset).format("%Y%m%d_%H%M%S").to_string(),
        None => "unknown".to_string(),
    }
}

/// Offset label such as `UTC+03:00`
pub fn offset_label(offset: FixedOffset) -> String {
    format!("UTC{}", offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0, 125_000), "2 min 5 sec");
        assert_eq!(format_duration(0, 999), "0 min 0 sec");
        assert_eq!(format_duration(10_000, 0), "0 min 0 sec");
    }

    #[test]
    fn test_format_local_applies_offset() {
        let moscow = offset_from_minutes(180).unwrap();
        // 2024-01-01T00:00:00Z
        assert_eq!(format_local(1_704_067_200_000, moscow), "01.01.2024 03:00:00");
        assert_eq!(file_stamp(1_704_067_200_000, moscow), "20240101_030000");
        assert_eq!(offset_label(moscow), "UTC+03:00");
    }

    #[test]
    fn test_offset_bounds() {
        assert!(offset_from_minutes(-720).is_some());
        assert!(offset_from_minutes(24 * 60).is_none());
    }
}
