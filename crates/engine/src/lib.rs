//! Expiration-timer engine: deadline resolution and chunked re-arming.
//!
//! The engine converts a [`sw_domain::TimerIntent`] into a UTC deadline
//! ([`resolver`]) and keeps exactly one outstanding registration against a
//! bounded host timer facility ([`scheduler`]). It owns no UI, persistence
//! I/O or process lifecycle; those arrive through the [`clock::Clock`] and
//! [`scheduler::HostTimer`] seams.

pub mod clock;
pub mod resolver;
pub mod scheduler;

pub use clock::{parse_tz, Clock, SystemClock};
pub use resolver::{
    is_expired, pin, remaining_ms, remaining_secs, resolve, Remaining, DST_PROBE_LIMIT,
};
pub use scheduler::{
    ArmOutcome, HostTimer, RearmScheduler, SchedulerState, LONG_REARM_CHUNK_MS,
    MAX_HOST_INTERVAL_MS,
};
