//! Per-identity alert escalation.
//!
//! Each `(severity, message)` pair owns one state machine:
//! `Unseen → Active → (Suppressed | Completed)`. First delivery displays
//! immediately and arms a repeat timer; each fire re-displays with an
//! incremented occurrence counter up to the fixed maximum. User suppression
//! cancels the timer and permanently ignores the identity until a global
//! clear. `clear_all` cancels every timer before discarding the registry, so
//! a clear racing a timer fire can never act on a freed record.
//!
//! Timers are threads parked on a crossbeam cancel channel; every armed timer
//! ends in exactly one of: fires to completion, cancelled by suppression,
//! cancelled by clear, cancelled by teardown (`Drop`).

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use tracing::debug;

use crate::core::events::Severity;

/// Fixed number of displays per identity, including the immediate first one.
pub const MAX_OCCURRENCES: u32 = 3;

/// Reference repeat interval between displays.
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Deduplication key for recurring notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertIdentity {
    /// Severity half of the key.
    pub severity: Severity,
    /// Exact message text; formatting changes change identity.
    pub message: String,
}

impl AlertIdentity {
    /// Builds the key for a delivered notification.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// One display handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    /// Severity of the underlying determination.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// 1-based display count for this identity.
    pub occurrence: u32,
    /// Total displays this identity will receive unless suppressed.
    pub max_occurrences: u32,
}

/// Presentation-layer surface the escalator displays through.
pub trait AlertSink: Send + Sync {
    /// Shows one occurrence of an alert.
    fn display(&self, alert: &ActiveAlert);
    /// Removes any currently displayed banner; called on global clear.
    fn dismiss_all(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityState {
    Active { occurrence: u32 },
    Suppressed,
    Completed,
}

#[derive(Default)]
struct Registry {
    states: HashMap<AlertIdentity, IdentityState>,
    cancels: HashMap<AlertIdentity, Sender<()>>,
}

struct Inner {
    registry: Mutex<Registry>,
    sink: Arc<dyn AlertSink>,
    interval: Duration,
}

impl Inner {
    /// One timer fire. Returns `false` when the timer thread should stop.
    fn fire(&self, identity: &AlertIdentity) -> bool {
        let mut guard = self.registry.lock();
        let registry = &mut *guard;
        let Some(state) = registry.states.get_mut(identity) else {
            // Cleared while the timer was parked.
            return false;
        };
        match *state {
            IdentityState::Suppressed | IdentityState::Completed => {
                registry.cancels.remove(identity);
                false
            }
            IdentityState::Active { occurrence } => {
                let next = occurrence + 1;
                let completed = next >= MAX_OCCURRENCES;
                *state = if completed {
                    IdentityState::Completed
                } else {
                    IdentityState::Active { occurrence: next }
                };
                if completed {
                    registry.cancels.remove(identity);
                }
                let alert = ActiveAlert {
                    severity: identity.severity,
                    message: identity.message.clone(),
                    occurrence: next,
                    max_occurrences: MAX_OCCURRENCES,
                };
                drop(guard);
                self.sink.display(&alert);
                !completed
            }
        }
    }
}

/// Owns the identity registry and its repeat timers.
pub struct AlertEscalator {
    inner: Arc<Inner>,
}

impl AlertEscalator {
    /// Creates an escalator with the reference 60-second repeat interval.
    #[must_use]
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self::with_interval(sink, DEFAULT_REPEAT_INTERVAL)
    }

    /// Creates an escalator with a custom repeat interval.
    #[must_use]
    pub fn with_interval(sink: Arc<dyn AlertSink>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                sink,
                interval,
            }),
        }
    }

    /// Delivers a notification. A fresh identity displays immediately and
    /// arms its repeat timer; an Active or Suppressed identity is a no-op; a
    /// Completed identity restarts as fresh.
    pub fn deliver(&self, severity: Severity, message: &str) {
        let identity = AlertIdentity::new(severity, message);
        {
            let mut registry = self.inner.registry.lock();
            match registry.states.get(&identity) {
                Some(IdentityState::Active { .. } | IdentityState::Suppressed) => return,
                Some(IdentityState::Completed) | None => {}
            }
            registry
                .states
                .insert(identity.clone(), IdentityState::Active { occurrence: 1 });
            let (cancel_tx, cancel_rx) = bounded(1);
            registry.cancels.insert(identity.clone(), cancel_tx);

            let inner = Arc::clone(&self.inner);
            let timer_identity = identity.clone();
            thread::spawn(move || {
                loop {
                    match cancel_rx.recv_timeout(inner.interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            if !inner.fire(&timer_identity) {
                                break;
                            }
                        }
                    }
                }
            });
        }
        self.inner.sink.display(&ActiveAlert {
            severity,
            message: message.to_string(),
            occurrence: 1,
            max_occurrences: MAX_OCCURRENCES,
        });
    }

    /// User's "ignore" response: cancels the timer and permanently ignores
    /// this identity until a global clear.
    pub fn suppress(&self, severity: Severity, message: &str) {
        let identity = AlertIdentity::new(severity, message);
        let mut registry = self.inner.registry.lock();
        registry.states.insert(identity.clone(), IdentityState::Suppressed);
        if let Some(cancel) = registry.cancels.remove(&identity) {
            let _ = cancel.try_send(());
        }
        debug!(message, "alert identity suppressed");
    }

    /// Cancels every live timer, discards all identity records and the
    /// suppression set, and dismisses any displayed banner. Used for the
    /// manual "clear alerts" action and before re-applying changed settings.
    pub fn clear_all(&self) {
        {
            let mut registry = self.inner.registry.lock();
            // Timers must be cancelled before records are discarded.
            for (_, cancel) in registry.cancels.drain() {
                let _ = cancel.try_send(());
            }
            registry.states.clear();
        }
        self.inner.sink.dismiss_all();
    }

    /// Number of identities currently tracked (any state).
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        self.inner.registry.lock().states.len()
    }
}

impl Drop for AlertEscalator {
    fn drop(&mut self) {
        self.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::{ActiveAlert, AlertEscalator, AlertSink, MAX_OCCURRENCES};
    use crate::core::events::Severity;

    #[derive(Default)]
    struct RecordingSink {
        displayed: Mutex<Vec<ActiveAlert>>,
        dismissals: AtomicUsize,
    }

    impl AlertSink for RecordingSink {
        fn display(&self, alert: &ActiveAlert) {
            self.displayed.lock().push(alert.clone());
        }
        fn dismiss_all(&self) {
            self.dismissals.fetch_add(1, Ordering::SeqCst);
        }
    }

    const TICK: Duration = Duration::from_millis(25);

    fn escalator(sink: &Arc<RecordingSink>) -> AlertEscalator {
        AlertEscalator::with_interval(Arc::clone(sink) as Arc<dyn AlertSink>, TICK)
    }

    /// Long enough for every armed timer to run out its three occurrences.
    fn settle() {
        thread::sleep(TICK * (MAX_OCCURRENCES + 3));
    }

    #[test]
    fn first_delivery_displays_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "over the limit");
        let displayed = sink.displayed.lock();
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].occurrence, 1);
        assert_eq!(displayed[0].max_occurrences, 3);
    }

    #[test]
    fn unacknowledged_alert_displays_exactly_three_times() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "over the limit");
        settle();
        settle();
        let displayed = sink.displayed.lock();
        assert_eq!(displayed.len(), 3, "three displays, then silence");
        let occurrences: Vec<u32> = displayed.iter().map(|a| a.occurrence).collect();
        assert_eq!(occurrences, vec![1, 2, 3]);
        drop(displayed);
        assert_eq!(escalator.tracked_identities(), 1, "completed record retained");
    }

    #[test]
    fn redelivery_while_active_is_a_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "same message");
        escalator.deliver(Severity::Error, "same message");
        assert_eq!(sink.displayed.lock().len(), 1);
        settle();
        assert_eq!(sink.displayed.lock().len(), 3, "no doubled timer");
    }

    #[test]
    fn distinct_severity_is_a_distinct_identity() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "same message");
        escalator.deliver(Severity::Warning, "same message");
        assert_eq!(sink.displayed.lock().len(), 2);
        assert_eq!(escalator.tracked_identities(), 2);
    }

    #[test]
    fn suppression_stops_scheduled_and_new_displays() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "noisy");
        escalator.suppress(Severity::Error, "noisy");
        settle();
        assert_eq!(sink.displayed.lock().len(), 1, "no display after suppression");

        escalator.deliver(Severity::Error, "noisy");
        settle();
        assert_eq!(sink.displayed.lock().len(), 1, "suppressed identity stays ignored");
    }

    #[test]
    fn clear_all_cancels_timers_and_dismisses_banner() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "first");
        escalator.deliver(Severity::Warning, "second");
        escalator.clear_all();
        settle();
        assert_eq!(sink.displayed.lock().len(), 2, "only the immediate displays");
        assert_eq!(sink.dismissals.load(Ordering::SeqCst), 1);
        assert_eq!(escalator.tracked_identities(), 0);
    }

    #[test]
    fn clear_all_resets_suppression() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "noisy");
        escalator.suppress(Severity::Error, "noisy");
        escalator.clear_all();

        escalator.deliver(Severity::Error, "noisy");
        assert_eq!(sink.displayed.lock().len(), 2, "fresh start after clear");
        assert_eq!(sink.displayed.lock()[1].occurrence, 1);
    }

    #[test]
    fn completed_identity_restarts_on_redelivery() {
        let sink = Arc::new(RecordingSink::default());
        let escalator = escalator(&sink);
        escalator.deliver(Severity::Error, "recurring");
        settle();
        assert_eq!(sink.displayed.lock().len(), 3);

        escalator.deliver(Severity::Error, "recurring");
        assert_eq!(sink.displayed.lock().len(), 4);
        assert_eq!(sink.displayed.lock()[3].occurrence, 1);
    }

    #[test]
    fn drop_cancels_outstanding_timers() {
        let sink = Arc::new(RecordingSink::default());
        {
            let escalator = escalator(&sink);
            escalator.deliver(Severity::Error, "short lived");
        }
        settle();
        assert_eq!(sink.displayed.lock().len(), 1, "no fire after teardown");
        assert_eq!(sink.dismissals.load(Ordering::SeqCst), 1);
    }
}
