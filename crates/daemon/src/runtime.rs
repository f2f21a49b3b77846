//! Single-owner timer loop.
//!
//! One task owns the committed intent, the store, the scheduler and the
//! clock; every event — fire, intent edit, disable, shutdown — flows
//! through one channel, so a fire always observes the most recently
//! committed intent and no two registrations can race.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use sw_domain::{TimerIntent, TimerMode};
use sw_engine::{pin, ArmOutcome, Clock, RearmScheduler};

use crate::host::TokioTimer;
use crate::store::IntentStore;

#[derive(Debug)]
pub enum Event {
    /// The outstanding host timer registration fired.
    TimerFired,
    /// Replace the committed intent (user edit); re-arms from scratch.
    Apply(TimerIntent),
    /// Turn the timer feature off and clear its runtime state.
    Disable,
    Shutdown,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Notifier
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Notification collaborator: told about expiry, and about arm/disarm
/// for observability.
pub trait Notifier {
    fn on_expired(&self);
    fn on_armed(&self, _interval_ms: u64) {}
    fn on_disarmed(&self) {}
}

/// Default notifier: structured log lines.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_expired(&self) {
        tracing::info!("keep-awake timer expired, reverting");
    }

    fn on_armed(&self, interval_ms: u64) {
        tracing::info!(interval_ms, "keep-awake timer armed");
    }

    fn on_disarmed(&self) {
        tracing::info!("keep-awake timer disarmed");
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimerLoop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TimerLoop<C: Clock, N: Notifier> {
    intent: TimerIntent,
    scheduler: RearmScheduler<TokioTimer>,
    store: IntentStore,
    clock: C,
    notifier: N,
    events: UnboundedReceiver<Event>,
}

impl<C: Clock, N: Notifier> TimerLoop<C, N> {
    /// Load the persisted intent and wire the scheduler to a fresh event
    /// channel. The returned sender feeds the loop (and the host timer
    /// holds a clone of it for fire delivery).
    pub fn new(store: IntentStore, clock: C, notifier: N) -> (Self, UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let intent = store.load();
        let scheduler = RearmScheduler::new(TokioTimer::new(tx.clone()));
        (
            Self {
                intent,
                scheduler,
                store,
                clock,
                notifier,
                events: rx,
            },
            tx,
        )
    }

    /// Arm from the committed (or overridden) intent and serve events
    /// until the timer expires or a shutdown arrives.
    pub async fn run(mut self, override_intent: Option<TimerIntent>) {
        let initial = override_intent.unwrap_or_else(|| self.intent.clone());
        if self.commit(initial) {
            return;
        }
        while let Some(event) = self.events.recv().await {
            let done = match event {
                Event::TimerFired => self.handle_fire(),
                Event::Apply(intent) => self.commit(intent),
                Event::Disable => {
                    self.disable();
                    false
                }
                Event::Shutdown => true,
            };
            if done {
                break;
            }
        }
    }

    /// Commit a new intent, capture arm-time state if needed, persist and
    /// arm. Returns true when the intent is already expired.
    fn commit(&mut self, intent: TimerIntent) -> bool {
        self.intent = intent;
        if let Err(e) = self.intent.validate() {
            tracing::warn!(error = %e, "malformed timer intent, resetting to indefinite");
            self.intent = TimerIntent::default();
        }
        self.ensure_pinned();
        self.store.save(&self.intent);
        self.arm()
    }

    /// Capture arm-time state when none was persisted. A duration intent
    /// carrying a legacy pinned start but no cache keeps its start, so
    /// the resolver reconstructs the originally armed deadline.
    fn ensure_pinned(&mut self) {
        let needs_pin = match self.intent.mode {
            TimerMode::Indefinite => false,
            TimerMode::Duration => {
                self.intent.cached_deadline.is_none() && self.intent.pinned_start.is_none()
            }
            TimerMode::UntilTime => self.intent.cached_deadline.is_none(),
        };
        if needs_pin {
            if let Err(e) = pin(&mut self.intent, &self.clock) {
                tracing::warn!(error = %e, "failed to pin timer state");
            }
        }
    }

    fn arm(&mut self) -> bool {
        match self.scheduler.arm(&self.intent, &self.clock) {
            Ok(ArmOutcome::Armed { interval_ms }) => {
                self.notifier.on_armed(interval_ms);
                false
            }
            Ok(ArmOutcome::Disarmed) => {
                self.notifier.on_disarmed();
                false
            }
            Ok(ArmOutcome::Expired) => {
                self.expire();
                true
            }
            Err(e) => {
                // Non-fatal: retried on the next user-visible event.
                tracing::warn!(error = %e, "host timer registration failed, timer idle until the next event");
                false
            }
        }
    }

    fn handle_fire(&mut self) -> bool {
        match self.scheduler.on_fire(&self.intent, &self.clock) {
            Ok(ArmOutcome::Expired) => {
                self.expire();
                true
            }
            Ok(ArmOutcome::Armed { interval_ms }) => {
                // Checkpoint fire: clock jump or chunked long wait.
                self.notifier.on_armed(interval_ms);
                false
            }
            Ok(ArmOutcome::Disarmed) => false,
            Err(e) => {
                tracing::warn!(error = %e, "re-arm after fire failed");
                false
            }
        }
    }

    fn expire(&mut self) {
        self.scheduler.disable();
        self.intent.clear_runtime();
        self.store.save(&self.intent);
        self.notifier.on_expired();
    }

    fn disable(&mut self) {
        self.scheduler.disable();
        self.intent.clear_runtime();
        self.store.save(&self.intent);
        self.notifier.on_disarmed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};
    use sw_engine::SystemClock;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        expired: Arc<AtomicBool>,
        armed: Arc<AtomicU64>,
    }

    impl Notifier for RecordingNotifier {
        fn on_expired(&self) {
            self.expired.store(true, Ordering::SeqCst);
        }

        fn on_armed(&self, _interval_ms: u64) {
            self.armed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn near_deadline_intent(in_ms: i64) -> TimerIntent {
        let mut intent = TimerIntent::for_minutes(60);
        intent.cached_deadline = Some(Utc::now() + TimeDelta::milliseconds(in_ms));
        intent
    }

    #[tokio::test]
    async fn loop_expires_notifies_and_persists_cleared_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        store.save(&near_deadline_intent(50));

        let notifier = RecordingNotifier::default();
        let (timer_loop, _tx) = TimerLoop::new(
            IntentStore::new(dir.path()),
            SystemClock::Tz(chrono_tz::UTC),
            notifier.clone(),
        );

        tokio::time::timeout(Duration::from_secs(5), timer_loop.run(None))
            .await
            .expect("loop must finish once the timer expires");

        assert!(notifier.expired.load(Ordering::SeqCst));
        assert_eq!(notifier.armed.load(Ordering::SeqCst), 1);

        let reloaded = IntentStore::new(dir.path()).load();
        assert!(reloaded.cached_deadline.is_none());
        assert!(reloaded.pinned_start.is_none());
    }

    #[tokio::test]
    async fn override_intent_replaces_stale_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        // Persisted deadline already in the past.
        store.save(&near_deadline_intent(-1000));

        let notifier = RecordingNotifier::default();
        let (timer_loop, tx) = TimerLoop::new(
            IntentStore::new(dir.path()),
            SystemClock::Tz(chrono_tz::UTC),
            notifier.clone(),
        );

        let handle = tokio::spawn(timer_loop.run(Some(near_deadline_intent(50))));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop must finish")
            .unwrap();

        // The override armed and then expired; the stale state never won.
        assert_eq!(notifier.armed.load(Ordering::SeqCst), 1);
        assert!(notifier.expired.load(Ordering::SeqCst));
        drop(tx);
    }

    #[tokio::test]
    async fn shutdown_event_stops_an_indefinite_loop() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let (timer_loop, tx) = TimerLoop::new(
            IntentStore::new(dir.path()),
            SystemClock::Tz(chrono_tz::UTC),
            notifier.clone(),
        );

        let handle = tokio::spawn(timer_loop.run(None));
        tx.send(Event::Shutdown).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop must exit on shutdown")
            .unwrap();
        assert!(!notifier.expired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn disable_clears_runtime_state_but_keeps_serving() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        store.save(&near_deadline_intent(60_000));

        let notifier = RecordingNotifier::default();
        let (timer_loop, tx) = TimerLoop::new(
            IntentStore::new(dir.path()),
            SystemClock::Tz(chrono_tz::UTC),
            notifier.clone(),
        );

        let handle = tokio::spawn(timer_loop.run(None));
        tx.send(Event::Disable).unwrap();
        // Give the loop a moment to process, then confirm it still serves.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let reloaded = IntentStore::new(dir.path()).load();
        assert!(reloaded.cached_deadline.is_none());

        tx.send(Event::Shutdown).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop must exit on shutdown")
            .unwrap();
        assert!(!notifier.expired.load(Ordering::SeqCst));
    }
}
