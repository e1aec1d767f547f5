use chrono::{DateTime, SecondsFormat, Utc};

pub fn now_secs() -> u64 {
    Utc::now().timestamp() as u64
}

pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Formats a unix timestamp in milliseconds as RFC 3339 in UTC, e.g.
/// `2024-05-01T08:00:00.123Z`.
pub fn format_timestamp(millis: u64) -> String {
    let time = DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_default();
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
