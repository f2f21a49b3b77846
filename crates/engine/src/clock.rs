//! Clock/timezone provider seam.
//!
//! All wall-clock reads and local↔UTC conversions in the engine go through
//! [`Clock`], so tests can pin the clock and the daemon can run against the
//! system-local timezone or an explicit IANA override.

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
    fn now_local(&self) -> NaiveDateTime;
    /// Convert a local wall-clock value to UTC. Returns `None` when the
    /// local time does not exist (spring-forward gap); an ambiguous
    /// fall-back time maps to its earliest (pre-transition) occurrence.
    fn local_to_utc(&self, local: &NaiveDateTime) -> Option<DateTime<Utc>>;
}

/// Parse a timezone string into a `chrono_tz::Tz`, falling back to UTC.
pub fn parse_tz(tz: &str) -> chrono_tz::Tz {
    tz.parse::<chrono_tz::Tz>().unwrap_or(chrono_tz::UTC)
}

fn resolve_local<Z: TimeZone>(result: LocalResult<DateTime<Z>>) -> Option<DateTime<Utc>> {
    match result {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SystemClock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Production clock: the system-local timezone, or a configured IANA zone.
#[derive(Clone, Copy, Debug)]
pub enum SystemClock {
    Local,
    Tz(chrono_tz::Tz),
}

impl SystemClock {
    pub fn from_config(timezone: Option<&str>) -> Self {
        match timezone {
            Some(name) => Self::Tz(parse_tz(name)),
            None => Self::Local,
        }
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        match self {
            Self::Local => Local::now().naive_local(),
            Self::Tz(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }

    fn local_to_utc(&self, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => resolve_local(Local.from_local_datetime(local)),
            Self::Tz(tz) => resolve_local(tz.from_local_datetime(local)),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Test clock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
