use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Mutex;

/// Hands out server timestamps that never repeat and never go backwards.
///
/// Stamps have microsecond resolution, matching what PostgreSQL keeps in a
/// `timestamptz`, so the stored order and the broadcast order agree.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.stamp(Utc::now())
    }

    fn stamp(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let wall = truncate_to_micros(wall);
        // A poisoned lock still holds a valid timestamp.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::microseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros = ts.timestamp_micros();
    DateTime::from_timestamp_micros(micros).unwrap_or(ts)
}

/// ISO-8601 UTC with microseconds and a `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serde adapter for [`format_timestamp`]
pub mod iso_micros {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamps_are_strictly_increasing_when_wall_clock_stalls() {
        let clock = MonotonicClock::new();
        let wall = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();

        let a = clock.stamp(wall);
        let b = clock.stamp(wall);
        let c = clock.stamp(wall - Duration::seconds(3));

        assert_eq!(a, wall);
        assert_eq!(b, wall + Duration::microseconds(1));
        assert_eq!(c, wall + Duration::microseconds(2));
    }

    #[test]
    fn live_clock_never_repeats() {
        let clock = MonotonicClock::new();
        let stamps: Vec<_> = (0..1000).map(|_| clock.now()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn formats_with_micros_and_zulu() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
            + Duration::microseconds(123_456);
        assert_eq!(format_timestamp(&ts), "2026-10-16T09:30:00.123456Z");
    }
}
