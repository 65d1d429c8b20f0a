use chrono::{DateTime, Utc};
use helpdesk_types::parse_timestamp;

pub const JUST_NOW: &str = "Just now";

/// Relative label for a message timestamp
///
/// Unparseable and future timestamps render as "Just now" rather than failing.
pub fn format_timestamp(raw: &str, now: DateTime<Utc>) -> String {
    let Some(timestamp) = parse_timestamp(raw) else {
        return JUST_NOW.to_string();
    };

    let elapsed = now.signed_duration_since(timestamp).num_seconds();
    match elapsed {
        s if s < 60 => JUST_NOW.to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        _ => timestamp.format("%b %-d, %H:%M").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_labels() {
        assert_eq!(format_timestamp("2024-03-01T11:59:30Z", now()), "Just now");
        assert_eq!(format_timestamp("2024-03-01T11:45:00Z", now()), "15m ago");
        assert_eq!(format_timestamp("2024-03-01T09:00:00Z", now()), "3h ago");
        assert_eq!(format_timestamp("2024-02-27T08:05:00Z", now()), "Feb 27, 08:05");
    }

    #[test]
    fn test_offsets_are_normalized() {
        assert_eq!(format_timestamp("2024-03-01T06:30:00-05:00", now()), "30m ago");
    }

    #[test]
    fn test_offsetless_timestamps_read_as_utc() {
        assert_eq!(format_timestamp("2024-03-01T11:45:00.000", now()), "15m ago");
        assert_eq!(format_timestamp("2024-02-27T08:05:00", now()), "Feb 27, 08:05");
    }

    #[test]
    fn test_malformed_falls_back() {
        assert_eq!(format_timestamp("", now()), JUST_NOW);
        assert_eq!(format_timestamp("[object Object]", now()), JUST_NOW);
    }

    #[test]
    fn test_future_falls_back() {
        assert_eq!(format_timestamp("2024-03-01T13:00:00Z", now()), JUST_NOW);
    }
}
