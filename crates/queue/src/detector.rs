//! Background polling state machine that watches the waiting-item count.
//!
//! [`UpdateDetector`] periodically probes the store for the number of items
//! in the waiting tab and compares it against a baseline supplied by the
//! queue controller. When the count grows past the baseline, the surplus is
//! surfaced as a pending delta (a "N new items" badge) without disturbing
//! the page the reviewer is looking at.
//!
//! The detector holds at most one live timer at any time: starting,
//! stopping, pausing and dropping all cancel the previous poll task before
//! doing anything else.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use revq_core::store::ReviewStore;

use crate::events::{ReviewEvent, ReviewEvents};

/// Lifecycle of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorState {
    /// No timer exists.
    Idle,
    /// A poll task is live and checking on its interval.
    Polling,
    /// The console is not visible; the timer is cancelled until `resume`.
    Suspended,
}

/// Snapshot of what the detector currently knows.
///
/// `pending_delta` is always `max(0, latest observed count - known_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollingBaseline {
    /// The waiting-item count the console has last rendered.
    pub known_count: i64,
    /// How many items arrived beyond the baseline.
    pub pending_delta: i64,
}

/// Counters shared between the detector handle and its poll task.
struct Shared {
    baseline: AtomicI64,
    latest: AtomicI64,
    delta: watch::Sender<i64>,
}

impl Shared {
    /// Record a fresh count observation and recompute the delta.
    fn apply_count(&self, count: i64, events: &ReviewEvents) -> i64 {
        self.latest.store(count, Ordering::SeqCst);
        self.recompute_delta(events)
    }

    /// Recompute `pending_delta` from the stored baseline and latest
    /// count, publishing an event when the delta changes to a positive
    /// value.
    fn recompute_delta(&self, events: &ReviewEvents) -> i64 {
        let baseline = self.baseline.load(Ordering::SeqCst);
        let latest = self.latest.load(Ordering::SeqCst);
        let delta = (latest - baseline).max(0);

        let previous = self.delta.send_replace(delta);
        if delta > 0 && delta != previous {
            events.publish(ReviewEvent::NewItemsDetected {
                pending_delta: delta,
                latest_count: latest,
            });
        }
        delta
    }
}

struct Inner {
    state: DetectorState,
    interval: Duration,
    poll: Option<CancellationToken>,
}

/// Background new-item detector for the waiting tab.
///
/// All methods take `&self`; the handle is designed to live in an `Arc`
/// shared between the controller and the HTTP surface.
pub struct UpdateDetector {
    store: Arc<dyn ReviewStore>,
    events: ReviewEvents,
    shared: Arc<Shared>,
    inner: Mutex<Inner>,
}

impl UpdateDetector {
    pub fn new(store: Arc<dyn ReviewStore>, events: ReviewEvents) -> Self {
        let (delta, _) = watch::channel(0);
        Self {
            store,
            events,
            shared: Arc::new(Shared {
                baseline: AtomicI64::new(0),
                latest: AtomicI64::new(0),
                delta,
            }),
            inner: Mutex::new(Inner {
                state: DetectorState::Idle,
                interval: Duration::from_secs(revq_core::review::DEFAULT_POLL_INTERVAL_SECS),
                poll: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DetectorState {
        self.lock_inner().state
    }

    /// Current baseline and pending delta.
    pub fn baseline(&self) -> PollingBaseline {
        PollingBaseline {
            known_count: self.shared.baseline.load(Ordering::SeqCst),
            pending_delta: *self.shared.delta.borrow(),
        }
    }

    /// Watch the pending delta as it changes.
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.shared.delta.subscribe()
    }

    /// Begin polling against `baseline_count` every `interval`.
    ///
    /// The first check fires one full interval from now, never
    /// immediately: the caller has just rendered fresh data, so an
    /// immediate check would be redundant. Any previously running timer
    /// is cancelled first.
    pub fn start(&self, baseline_count: i64, interval: Duration) {
        let mut inner = self.lock_inner();
        self.shared.baseline.store(baseline_count, Ordering::SeqCst);
        self.shared.latest.store(baseline_count, Ordering::SeqCst);
        self.shared.delta.send_replace(0);

        inner.interval = interval;
        self.spawn_poll(&mut inner, false);
        inner.state = DetectorState::Polling;

        tracing::debug!(
            baseline_count,
            interval_secs = interval.as_secs(),
            "Update detector polling started",
        );
    }

    /// Replace the baseline without resetting the poll schedule.
    ///
    /// Called whenever the controller reloads the waiting tab, so a stale
    /// baseline cannot manufacture false deltas. The reloaded total is
    /// itself a fresh observation of the waiting count, so the latest
    /// count moves with it.
    pub fn update_baseline(&self, count: i64) {
        self.shared.baseline.store(count, Ordering::SeqCst);
        self.shared.latest.store(count, Ordering::SeqCst);
        self.shared.recompute_delta(&self.events);
    }

    /// Suspend polling (console became invisible).
    ///
    /// No tick fires between `pause` and the matching [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut inner = self.lock_inner();
        if inner.state != DetectorState::Polling {
            return;
        }
        cancel_poll(&mut inner);
        inner.state = DetectorState::Suspended;
        tracing::debug!("Update detector suspended");
    }

    /// Resume polling after a suspension.
    ///
    /// Unlike [`start`](Self::start), this performs exactly one immediate
    /// check (the console may have missed arrivals while hidden) before
    /// falling back to the regular interval.
    pub fn resume(&self, baseline_count: i64) {
        let mut inner = self.lock_inner();
        if inner.state != DetectorState::Suspended {
            tracing::debug!(state = ?inner.state, "Resume ignored outside the suspended state");
            return;
        }
        self.shared.baseline.store(baseline_count, Ordering::SeqCst);
        self.spawn_poll(&mut inner, true);
        inner.state = DetectorState::Polling;
        tracing::debug!(baseline_count, "Update detector resumed");
    }

    /// Zero the pending delta and adopt the latest observed count as the
    /// new baseline. Idempotent; the polling state is untouched.
    pub fn reset(&self) {
        let latest = self.shared.latest.load(Ordering::SeqCst);
        self.shared.baseline.store(latest, Ordering::SeqCst);
        self.shared.delta.send_replace(0);
    }

    /// Cancel the timer and return to [`DetectorState::Idle`].
    ///
    /// Must be called on teardown; a count check still in flight when the
    /// timer is cancelled has its result discarded.
    pub fn stop(&self) {
        let mut inner = self.lock_inner();
        cancel_poll(&mut inner);
        if inner.state != DetectorState::Idle {
            inner.state = DetectorState::Idle;
            tracing::debug!("Update detector stopped");
        }
    }

    // ---- private helpers ----

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // The lock is only held for field updates, never across an await;
        // a poisoned lock still carries consistent state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn the poll task, cancelling any predecessor so that at most
    /// one timer is ever live.
    fn spawn_poll(&self, inner: &mut Inner, immediate_first: bool) {
        cancel_poll(inner);

        let cancel = CancellationToken::new();
        let task = PollTask {
            store: Arc::clone(&self.store),
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            cancel: cancel.clone(),
            interval: inner.interval,
        };
        tokio::spawn(task.run(immediate_first));
        inner.poll = Some(cancel);
    }
}

impl Drop for UpdateDetector {
    fn drop(&mut self) {
        let mut inner = self.lock_inner();
        cancel_poll(&mut inner);
    }
}

fn cancel_poll(inner: &mut Inner) {
    if let Some(cancel) = inner.poll.take() {
        cancel.cancel();
    }
}

/// The spawned half of the detector: one task per `start`/`resume`.
struct PollTask {
    store: Arc<dyn ReviewStore>,
    shared: Arc<Shared>,
    events: ReviewEvents,
    cancel: CancellationToken,
    interval: Duration,
}

impl PollTask {
    async fn run(self, immediate_first: bool) {
        if immediate_first {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = self.check_once() => {}
            }
        }

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
        // A tick that lands while the previous check is still in flight
        // is skipped, not queued.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {
                    tokio::select! {
                        // Cancellation mid-check discards the in-flight result.
                        _ = self.cancel.cancelled() => return,
                        _ = self.check_once() => {}
                    }
                }
            }
        }
    }

    /// One waiting-count check. Failures are logged and swallowed; a
    /// transient backend hiccup must not kill the polling loop.
    async fn check_once(&self) {
        match self.store.waiting_count().await {
            Ok(count) => {
                let delta = self.shared.apply_count(count, &self.events);
                if delta > 0 {
                    tracing::debug!(
                        pending_delta = delta,
                        latest_count = count,
                        "Waiting queue grew past the baseline",
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Waiting-count check failed; will retry next tick");
            }
        }
    }
}
