//! Wall-clock timestamps.
//!
//! Everything persisted or compared across processes uses unix seconds.

use chrono::Utc;

/// Unix timestamp in whole seconds.
pub type Timestamp = i64;

/// Current unix time in seconds.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().timestamp()
}

/// Format a timestamp for log lines; out-of-range values render as `-`.
#[must_use]
pub fn display(ts: Timestamp) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_recent() {
        // 2023-01-01T00:00:00Z
        assert!(now() > 1_672_531_200);
    }

    #[test]
    fn test_display() {
        assert_eq!(display(0), "1970-01-01 00:00:00");
        assert_eq!(display(i64::MAX), "-");
    }
}
