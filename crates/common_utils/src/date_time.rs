//! Time as a port (C3), not a direct `OffsetDateTime::now_utc()` call, so
//! rate-limit windows, idempotency TTLs, and the CyberSource `Date` header
//! all read from one pinnable source in tests.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use time::OffsetDateTime;

/// Abstracts "what time is it" so sliding-window rate limiting,
/// idempotency expiry, and HTTP-Signature dates can all be driven by a
/// pinned clock in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> OffsetDateTime;

    fn unix_timestamp(&self) -> i64 {
        self.now().unix_timestamp()
    }
}

/// The real clock, backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock pinned to a fixed instant, advanced explicitly. Shared via `Arc`
/// so a test can hold a handle to the same clock the app under test uses.
#[derive(Debug, Clone)]
pub struct FrozenClock {
    unix_seconds: Arc<AtomicI64>,
}

impl FrozenClock {
    pub fn at(unix_seconds: i64) -> Self {
        Self {
            unix_seconds: Arc::new(AtomicI64::new(unix_seconds)),
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.unix_seconds.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, unix_seconds: i64) {
        self.unix_seconds.store(unix_seconds, Ordering::SeqCst);
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.unix_seconds.load(Ordering::SeqCst))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// RFC 1123 ("GMT") formatting, as CyberSource's HTTP-Signature `date`
/// header requires (§4.6 step 2).
pub fn format_rfc1123(instant: OffsetDateTime) -> String {
    let weekday = match instant.weekday() {
        time::Weekday::Monday => "Mon",
        time::Weekday::Tuesday => "Tue",
        time::Weekday::Wednesday => "Wed",
        time::Weekday::Thursday => "Thu",
        time::Weekday::Friday => "Fri",
        time::Weekday::Saturday => "Sat",
        time::Weekday::Sunday => "Sun",
    };
    let month = match instant.month() {
        time::Month::January => "Jan",
        time::Month::February => "Feb",
        time::Month::March => "Mar",
        time::Month::April => "Apr",
        time::Month::May => "May",
        time::Month::June => "Jun",
        time::Month::July => "Jul",
        time::Month::August => "Aug",
        time::Month::September => "Sep",
        time::Month::October => "Oct",
        time::Month::November => "Nov",
        time::Month::December => "Dec",
    };
    format!(
        "{weekday}, {day:02} {month} {year} {hour:02}:{minute:02}:{second:02} GMT",
        day = instant.day(),
        year = instant.year(),
        hour = instant.hour(),
        minute = instant.minute(),
        second = instant.second(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_advances_deterministically() {
        let clock = FrozenClock::at(1_700_000_000);
        assert_eq!(clock.unix_timestamp(), 1_700_000_000);
        clock.advance(60);
        assert_eq!(clock.unix_timestamp(), 1_700_000_060);
    }

    #[test]
    fn rfc1123_matches_known_instant() {
        // 2024-01-01T00:00:00Z is a Monday.
        let instant = OffsetDateTime::from_unix_timestamp(1_704_067_200).unwrap();
        assert_eq!(format_rfc1123(instant), "Mon, 01 Jan 2024 00:00:00 GMT");
    }
}
