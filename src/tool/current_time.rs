use chrono::{DateTime, Utc};

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Minute-granularity bucket used in cache keys. Caps worst-case staleness
/// for logically identical queries at ~60s beyond the nominal TTL.
pub fn minute_bucket() -> i64 {
    unix_now() / 60
}

/// Current UTC timestamp, RFC 3339 formatted.
pub fn utc_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_bucket_floors_seconds() {
        let bucket = minute_bucket();
        let now = unix_now();
        assert!(bucket <= now / 60);
        assert!(bucket >= now / 60 - 1);
    }
}
