//! Deadline resolver — pure translation of a timer intent into a UTC
//! instant, with duration and time-of-day semantics that survive DST
//! transitions, clock adjustments and process restarts.

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};

use sw_domain::{Result, TimeOfDay, TimerIntent, TimerMode};

use crate::clock::Clock;

/// Upper bound on one-minute forward probes when an `UntilTime` target
/// falls into a spring-forward gap. Three hours covers every known DST
/// offset change; a longer gap degrades to the local-as-UTC fallback.
pub const DST_PROBE_LIMIT: u32 = 180;

/// Time left until a deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Remaining {
    /// Indefinite timers never expire.
    Infinite,
    /// Rounded-up count until the deadline; 0 means expired.
    Finite(u64),
}

impl Remaining {
    pub fn is_zero(&self) -> bool {
        matches!(self, Remaining::Finite(0))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resolve an intent to its UTC deadline, or `None` for `Indefinite`.
///
/// A present `cached_deadline` is authoritative for both `Duration` and
/// `UntilTime`: re-resolution from wall-clock time happens only when the
/// cache is absent (first arm, or the intent changed). Malformed intents
/// are rejected, never coerced.
pub fn resolve(intent: &TimerIntent, clock: &dyn Clock) -> Result<Option<DateTime<Utc>>> {
    intent.validate()?;
    match intent.mode {
        TimerMode::Indefinite => Ok(None),
        TimerMode::Duration => {
            if let Some(deadline) = intent.cached_deadline {
                // Duration timers are pinned at arm time; they must not
                // recompute as wall time passes.
                return Ok(Some(deadline));
            }
            let span = TimeDelta::minutes(i64::from(intent.duration_minutes));
            let start = match intent.pinned_start {
                Some(local_start) => pinned_start_utc(&local_start, clock),
                None => clock.now_utc(),
            };
            Ok(Some(start + span))
        }
        TimerMode::UntilTime => {
            if let Some(deadline) = intent.cached_deadline {
                return Ok(Some(deadline));
            }
            Ok(Some(next_occurrence_utc(intent.until, clock)))
        }
    }
}

/// Milliseconds until the deadline: `max(0, deadline − now)` rounded up.
pub fn remaining_ms(intent: &TimerIntent, clock: &dyn Clock) -> Result<Remaining> {
    match resolve(intent, clock)? {
        None => Ok(Remaining::Infinite),
        Some(deadline) => Ok(Remaining::Finite(millis_until(deadline, clock.now_utc()))),
    }
}

/// Whole-seconds view of `remaining_ms`, also rounded up (display use).
pub fn remaining_secs(intent: &TimerIntent, clock: &dyn Clock) -> Result<Remaining> {
    match remaining_ms(intent, clock)? {
        Remaining::Infinite => Ok(Remaining::Infinite),
        Remaining::Finite(ms) => Ok(Remaining::Finite(ms.div_ceil(1000))),
    }
}

/// False for `Indefinite`; otherwise true exactly when the deadline has
/// been reached.
pub fn is_expired(intent: &TimerIntent, clock: &dyn Clock) -> Result<bool> {
    Ok(remaining_ms(intent, clock)?.is_zero())
}

/// Capture arm-time runtime state on the intent: the local start and the
/// authoritative UTC deadline. `Indefinite` clears both fields instead.
pub fn pin(intent: &mut TimerIntent, clock: &dyn Clock) -> Result<()> {
    intent.validate()?;
    match intent.mode {
        TimerMode::Indefinite => intent.clear_runtime(),
        TimerMode::Duration => {
            intent.pinned_start = Some(clock.now_local());
            intent.cached_deadline =
                Some(clock.now_utc() + TimeDelta::minutes(i64::from(intent.duration_minutes)));
        }
        TimerMode::UntilTime => {
            intent.pinned_start = Some(clock.now_local());
            intent.cached_deadline = Some(next_occurrence_utc(intent.until, clock));
        }
    }
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Internals
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a legacy pinned local start to UTC. An unrepresentable local
/// value (persisted inside a DST gap) degrades to treating it as UTC,
/// keeping resolution deterministic instead of failing the arm.
fn pinned_start_utc(local_start: &NaiveDateTime, clock: &dyn Clock) -> DateTime<Utc> {
    match clock.local_to_utc(local_start) {
        Some(utc) => utc,
        None => {
            tracing::warn!(
                %local_start,
                "pinned start unrepresentable in local timezone, treating it as UTC"
            );
            Utc.from_utc_datetime(local_start)
        }
    }
}

/// Next local occurrence of `target` as a UTC instant.
///
/// Comparison is time-of-day only, hour then minute, and strictly future:
/// when the current hour/minute equals the target the occurrence is
/// tomorrow, so a firing at the exact boundary never re-triggers within
/// the same minute.
fn next_occurrence_utc(target: TimeOfDay, clock: &dyn Clock) -> DateTime<Utc> {
    let now_local = clock.now_local();
    let target_time =
        NaiveTime::from_hms_opt(u32::from(target.hour), u32::from(target.minute), 0)
            .unwrap_or_else(|| now_local.time());

    let next_day =
        (u32::from(target.hour), u32::from(target.minute)) <= (now_local.hour(), now_local.minute());
    let mut target_local = NaiveDateTime::new(now_local.date(), target_time);
    if next_day {
        target_local = target_local
            .checked_add_days(Days::new(1))
            .unwrap_or(target_local);
    }

    // Spring-forward gaps make some local minutes unrepresentable; probe
    // forward for the first minute the timezone provider accepts.
    let mut probe = target_local;
    for _ in 0..=DST_PROBE_LIMIT {
        if let Some(utc) = clock.local_to_utc(&probe) {
            return utc;
        }
        probe = probe + TimeDelta::minutes(1);
    }

    tracing::warn!(
        %target_local,
        "no representable local time within the probe window, treating target as UTC"
    );
    Utc.from_utc_datetime(&target_local)
}

/// Rounded-up milliseconds from `now` to `deadline`. A deadline strictly
/// in the future never reports zero; implausibly distant deadlines
/// saturate instead of overflowing.
fn millis_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let diff = deadline.signed_duration_since(now);
    if diff <= TimeDelta::zero() {
        return 0;
    }
    match diff.num_nanoseconds() {
        Some(ns) => (ns as u64).div_ceil(1_000_000),
        None => u64::MAX,
    }
}
