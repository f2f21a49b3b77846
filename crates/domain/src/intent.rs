//! Timer intent model — the user-declared expiration policy.
//!
//! An intent is immutable per evaluation: the resolver never mutates it, the
//! runtime populates `pinned_start`/`cached_deadline` at arm time and clears
//! them when the configuration changes or the feature is disabled.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shortest allowed `Duration` timer, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 5;
/// Longest allowed `Duration` timer, in minutes (24 hours).
pub const MAX_DURATION_MINUTES: u32 = 1440;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimerMode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Keep awake until explicitly disabled.
    #[default]
    Indefinite,
    /// Keep awake for a fixed number of minutes from arm time.
    Duration,
    /// Keep awake until the next local occurrence of a time of day.
    UntilTime,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimeOfDay
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A wall-clock hour/minute target. Only hour and minute carry meaning;
/// seconds and dates are never part of an `UntilTime` target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        let tod = Self { hour, minute };
        tod.validate()?;
        Ok(tod)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 || self.minute > 59 {
            return Err(Error::InvalidIntent(format!(
                "time of day {:02}:{:02} out of range",
                self.hour, self.minute
            )));
        }
        Ok(())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    /// Parse `"HH:MM"` (24-hour).
    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidIntent(format!("expected HH:MM, got '{s}'")))?;
        let hour: u8 = h
            .parse()
            .map_err(|_| Error::InvalidIntent(format!("invalid hour '{h}'")))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| Error::InvalidIntent(format!("invalid minute '{m}'")))?;
        Self::new(hour, minute)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimerIntent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimerIntent {
    pub mode: TimerMode,
    /// Meaningful only for `Duration`; valid range 5..=1440.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    /// Meaningful only for `UntilTime`.
    #[serde(default)]
    pub until: TimeOfDay,
    /// Local wall clock captured when the timer was armed. Kept for
    /// reconstructing a deadline from state persisted by older versions
    /// that stored no UTC cache.
    #[serde(default)]
    pub pinned_start: Option<NaiveDateTime>,
    /// Resolved UTC deadline; authoritative once present.
    #[serde(default)]
    pub cached_deadline: Option<DateTime<Utc>>,
}

fn default_duration_minutes() -> u32 {
    60
}

impl Default for TimerIntent {
    fn default() -> Self {
        Self {
            mode: TimerMode::Indefinite,
            duration_minutes: default_duration_minutes(),
            until: TimeOfDay::default(),
            pinned_start: None,
            cached_deadline: None,
        }
    }
}

impl TimerIntent {
    /// A timer that runs for `minutes` from arm time.
    pub fn for_minutes(minutes: u32) -> Self {
        Self {
            mode: TimerMode::Duration,
            duration_minutes: minutes,
            ..Self::default()
        }
    }

    /// A timer that runs until the next local occurrence of `until`.
    pub fn until(until: TimeOfDay) -> Self {
        Self {
            mode: TimerMode::UntilTime,
            until,
            ..Self::default()
        }
    }

    /// Check well-formedness. Callers loading persisted state must reset to
    /// `TimerIntent::default()` on error rather than resolve a malformed
    /// intent.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            TimerMode::Indefinite => {
                if self.cached_deadline.is_some() {
                    return Err(Error::InvalidIntent(
                        "indefinite timer must not carry a deadline".into(),
                    ));
                }
                Ok(())
            }
            TimerMode::Duration => {
                if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes)
                {
                    return Err(Error::InvalidIntent(format!(
                        "duration {} minutes out of range {}..={}",
                        self.duration_minutes, MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
                    )));
                }
                Ok(())
            }
            TimerMode::UntilTime => self.until.validate(),
        }
    }

    /// Drop the runtime fields (`pinned_start`, `cached_deadline`). Called
    /// whenever mode/parameters change or the feature is disabled.
    pub fn clear_runtime(&mut self) {
        self.pinned_start = None;
        self.cached_deadline = None;
    }
}
