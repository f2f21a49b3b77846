//! Rearm scheduler — keeps exactly one outstanding registration against a
//! host timer facility with a bounded maximum interval, re-arming in
//! chunks for long waits and re-validating true expiry on every fire.

use sw_domain::{Result, TimerIntent};

use crate::clock::Clock;
use crate::resolver::{self, Remaining};

/// Largest interval the host timer facility can represent (2^31 − 1 ms).
pub const MAX_HOST_INTERVAL_MS: u64 = 0x7FFF_FFFF;

/// Chunk used when the true remaining time exceeds the host maximum.
/// Only legacy or corrupted far-future deadlines reach this path.
pub const LONG_REARM_CHUNK_MS: u64 = 10 * 60 * 1000;

/// One-shot timer facility owned by the host environment. The scheduler
/// never passes an interval above [`MAX_HOST_INTERVAL_MS`].
pub trait HostTimer {
    type Handle;
    fn register(&mut self, interval_ms: u64) -> Result<Self::Handle>;
    fn cancel(&mut self, handle: Self::Handle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Disabled,
    Armed,
    Expired,
}

/// Result of an `arm`/`on_fire` transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Indefinite intent: nothing registered, nothing to expire.
    Disarmed,
    Armed { interval_ms: u64 },
    Expired,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RearmScheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// At most one registration is ever outstanding: `arm` and `disable` both
/// cancel before acting, and the scheduler is driven from a single
/// serialized event stream.
pub struct RearmScheduler<T: HostTimer> {
    host: T,
    handle: Option<T::Handle>,
    state: SchedulerState,
}

impl<T: HostTimer> RearmScheduler<T> {
    pub fn new(host: T) -> Self {
        Self {
            host,
            handle: None,
            state: SchedulerState::Disabled,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn host(&self) -> &T {
        &self.host
    }

    /// Cancel any outstanding registration and arm for the intent's
    /// remaining time. Zero remaining expires synchronously without
    /// registering a timer.
    ///
    /// A refused registration surfaces as `Error::Registration` and leaves
    /// the scheduler `Disabled`; the caller retries on its next event.
    pub fn arm(&mut self, intent: &TimerIntent, clock: &dyn Clock) -> Result<ArmOutcome> {
        self.cancel_outstanding();
        let remaining = match resolver::remaining_ms(intent, clock)? {
            Remaining::Infinite => {
                self.state = SchedulerState::Disabled;
                return Ok(ArmOutcome::Disarmed);
            }
            Remaining::Finite(ms) => ms,
        };
        if remaining == 0 {
            self.state = SchedulerState::Expired;
            return Ok(ArmOutcome::Expired);
        }

        let interval_ms = interval_for(remaining);
        match self.host.register(interval_ms) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = SchedulerState::Armed;
                tracing::debug!(interval_ms, remaining_ms = remaining, "armed expiration timer");
                Ok(ArmOutcome::Armed { interval_ms })
            }
            Err(err) => {
                self.state = SchedulerState::Disabled;
                Err(err)
            }
        }
    }

    /// Handle a fire event. A fire is a checkpoint, not proof of expiry:
    /// chunked re-arms and clock adjustments both produce early fires, so
    /// expiry is re-validated against the real clock before reporting it.
    /// A not-yet-expired fire re-arms with freshly computed remaining time.
    pub fn on_fire(&mut self, intent: &TimerIntent, clock: &dyn Clock) -> Result<ArmOutcome> {
        // The one-shot registration is consumed by firing.
        self.handle = None;
        if resolver::is_expired(intent, clock)? {
            self.state = SchedulerState::Expired;
            tracing::info!("expiration timer reached its deadline");
            return Ok(ArmOutcome::Expired);
        }
        self.arm(intent, clock)
    }

    /// Cancel the outstanding registration, from any state.
    pub fn disable(&mut self) {
        self.cancel_outstanding();
        self.state = SchedulerState::Disabled;
    }

    fn cancel_outstanding(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.host.cancel(handle);
        }
    }
}

fn interval_for(remaining_ms: u64) -> u64 {
    if remaining_ms > MAX_HOST_INTERVAL_MS {
        LONG_REARM_CHUNK_MS
    } else {
        remaining_ms.max(1)
    }
}
