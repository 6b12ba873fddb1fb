//! Emergency SOS trigger.
//!
//! Confirming an SOS starts a short countdown that can still be cancelled.
//! When it runs out the device position is requested and the alert either
//! goes out live to every contact or, when the device turned out to be
//! offline, lands in the offline queue.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::delivery::{live_alert_message, DeliveryChannel, NotificationSink};
use crate::feedback::{Feedback, FeedbackSink};
use crate::geolocation::Geolocator;
use crate::models::{Coordinates, RecordId};
use crate::queue::{CaptureOutcome, OfflineAlertQueue};

pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

const NO_LOCATION_MESSAGE: &str =
    "EMERGENCY: I need help. My location could not be determined, please try to reach me.";

/// Where the trigger is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "remaining", rename_all = "snake_case")]
pub enum SosPhase {
    Idle,
    /// Seconds left before the alert is sent
    CountingDown(u32),
    Dispatching,
    Finished,
}

/// What a single activation ended with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SosOutcome {
    /// Cancelled before the countdown ran out; nothing was sent
    Cancelled,
    /// Another activation is already in progress
    AlreadyActive,
    /// Live alert sent with the current position
    AlertSent {
        position: Coordinates,
        delivered: usize,
    },
    /// Device was offline; the position waits in the queue
    Queued(RecordId),
    /// The position could not be determined
    LocationUnavailable { delivered: usize },
}

/// Countdown-then-alert state machine bound to an offline queue.
pub struct SosTrigger<N: NotificationSink, G: Geolocator> {
    queue: Arc<OfflineAlertQueue<N>>,
    geolocator: G,
    feedback: Arc<dyn FeedbackSink>,
    countdown_secs: u32,
    phase: watch::Sender<SosPhase>,
}

impl<N: NotificationSink, G: Geolocator> SosTrigger<N, G> {
    pub fn new(
        queue: Arc<OfflineAlertQueue<N>>,
        geolocator: G,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Self {
        let (phase, _rx) = watch::channel(SosPhase::Idle);
        Self {
            queue,
            geolocator,
            feedback,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            phase,
        }
    }

    #[must_use]
    pub const fn with_countdown(mut self, secs: u32) -> Self {
        self.countdown_secs = secs;
        self
    }

    pub fn phase(&self) -> SosPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SosPhase> {
        self.phase.subscribe()
    }

    /// Run the countdown and send the alert unless `cancel` fires first.
    pub async fn activate(&self, cancel: CancellationToken) -> SosOutcome {
        let started = self.phase.send_if_modified(|phase| {
            if matches!(phase, SosPhase::CountingDown(_) | SosPhase::Dispatching) {
                false
            } else {
                *phase = SosPhase::CountingDown(self.countdown_secs);
                true
            }
        });
        if !started {
            tracing::debug!("SOS already active; ignoring activation");
            return SosOutcome::AlreadyActive;
        }

        // Whatever the caller sees now may be stale by the time a fix arrives
        let believed_online = self.queue.is_online();
        tracing::info!(countdown = self.countdown_secs, "SOS countdown started");

        let mut remaining = self.countdown_secs;
        let mut ticker = interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
        while remaining > 0 {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(remaining, "SOS cancelled");
                    self.phase.send_replace(SosPhase::Idle);
                    return SosOutcome::Cancelled;
                }

                _ = ticker.tick() => {
                    remaining -= 1;
                    if remaining > 0 {
                        self.phase.send_replace(SosPhase::CountingDown(remaining));
                    }
                }
            }
        }

        self.phase.send_replace(SosPhase::Dispatching);
        let outcome = self.dispatch(believed_online).await;
        self.phase.send_replace(SosPhase::Finished);
        outcome
    }

    async fn dispatch(&self, believed_online: bool) -> SosOutcome {
        let position = match self.geolocator.locate().await {
            Ok(position) => position,
            Err(error) => {
                tracing::warn!("SOS triggered without a location: {error}");
                return self.dispatch_without_location().await;
            }
        };
        tracing::info!(%position, "SOS triggered with location");

        match self
            .queue
            .capture_and_maybe_queue(position, believed_online)
            .await
        {
            CaptureOutcome::Queued(id) => SosOutcome::Queued(id),
            CaptureOutcome::DeliverLive => {
                let delivered = self.alert_contacts(&live_alert_message(position)).await;
                if delivered > 0 {
                    self.feedback.notify(Feedback::AlertSent { delivered });
                } else {
                    self.notify_failure().await;
                }
                SosOutcome::AlertSent {
                    position,
                    delivered,
                }
            }
        }
    }

    async fn dispatch_without_location(&self) -> SosOutcome {
        if !self.queue.is_online() {
            self.notify_failure().await;
            return SosOutcome::LocationUnavailable { delivered: 0 };
        }

        let delivered = self.alert_contacts(NO_LOCATION_MESSAGE).await;
        if delivered > 0 {
            self.feedback.notify(Feedback::AlertSentWithoutLocation);
        } else {
            self.notify_failure().await;
        }
        SosOutcome::LocationUnavailable { delivered }
    }

    async fn notify_failure(&self) {
        let pending = self.queue.pending_count().await;
        self.feedback.notify(Feedback::DeliveryFailed { pending });
    }

    /// Call every contact at once; returns how many were reached.
    async fn alert_contacts(&self, message: &str) -> usize {
        let contacts = self.queue.contacts().await;
        let timeout = self.queue.config().delivery_timeout;
        let sink = self.queue.sink();

        let outcomes = join_all(contacts.iter().map(|contact| async move {
            let attempt = sink.deliver(contact, message, DeliveryChannel::LiveCall);
            match tokio::time::timeout(timeout, attempt).await {
                Ok(Ok(())) => true,
                Ok(Err(error)) => {
                    tracing::warn!(contact = %contact.name, "Live alert failed: {error}");
                    false
                }
                Err(_) => {
                    tracing::warn!(
                        contact = %contact.name,
                        "Live alert timed out after {timeout:?}"
                    );
                    false
                }
            }
        }))
        .await;

        outcomes.into_iter().filter(|reached| *reached).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::feedback::RecordingFeedback;
    use crate::geolocation::{FixedGeolocator, UnavailableGeolocator};
    use crate::queue::QueueConfig;
    use crate::storage::MemorySlotStore;
    use crate::test_support::{contacts, ScriptedSink};
    use pretty_assertions::assert_eq;

    struct Setup {
        queue: Arc<OfflineAlertQueue<ScriptedSink>>,
        monitor: Arc<ConnectivityMonitor>,
        sink: ScriptedSink,
        feedback: RecordingFeedback,
    }

    fn setup(online: bool) -> Setup {
        let monitor = Arc::new(ConnectivityMonitor::new(online));
        let sink = ScriptedSink::new();
        let feedback = RecordingFeedback::new();
        let queue = Arc::new(OfflineAlertQueue::new(
            QueueConfig::default(),
            MemorySlotStore::new(),
            monitor.clone(),
            sink.clone(),
            Arc::new(feedback.clone()),
            contacts(2),
        ));
        Setup {
            queue,
            monitor,
            sink,
            feedback,
        }
    }

    fn here() -> FixedGeolocator {
        FixedGeolocator::new(Coordinates::new(40.7128, -74.006).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_online_activation_calls_every_contact_after_countdown() {
        let s = setup(true);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()));
        let started = Instant::now();

        let outcome = trigger.activate(CancellationToken::new()).await;

        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(matches!(outcome, SosOutcome::AlertSent { delivered: 2, .. }));
        assert!(s
            .sink
            .attempts()
            .iter()
            .all(|(_, message, channel)| *channel == DeliveryChannel::LiveCall
                && message.starts_with("EMERGENCY:")));
        assert_eq!(s.feedback.last(), Some(Feedback::AlertSent { delivered: 2 }));
        assert!(s.queue.is_empty().await);
        assert_eq!(trigger.phase(), SosPhase::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_activation_queues_location() {
        let s = setup(false);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()));

        let outcome = trigger.activate(CancellationToken::new()).await;

        let records = s.queue.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(outcome, SosOutcome::Queued(records[0].id));
        assert_eq!(s.sink.attempt_count(), 0);
        assert_eq!(s.feedback.last(), Some(Feedback::QueuedForLater { pending: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connectivity_lost_during_countdown_queues_location() {
        let s = setup(true);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()));

        let drop_network = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            s.monitor.set_online(false);
        };
        let (outcome, ()) = tokio::join!(trigger.activate(CancellationToken::new()), drop_network);

        assert!(matches!(outcome, SosOutcome::Queued(_)));
        assert_eq!(s.queue.pending_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelling_during_countdown_sends_nothing() {
        let s = setup(true);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()));
        let cancel = CancellationToken::new();

        let cancel_later = async {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            cancel.cancel();
        };
        let (outcome, ()) = tokio::join!(trigger.activate(cancel.clone()), cancel_later);

        assert_eq!(outcome, SosOutcome::Cancelled);
        assert_eq!(s.sink.attempt_count(), 0);
        assert!(s.feedback.events().is_empty());
        assert_eq!(trigger.phase(), SosPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_activation_while_counting_down_is_ignored() {
        let s = setup(true);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()))
            .with_countdown(3);

        let (first, second) = tokio::join!(
            trigger.activate(CancellationToken::new()),
            trigger.activate(CancellationToken::new())
        );

        assert!(matches!(first, SosOutcome::AlertSent { .. }));
        assert_eq!(second, SosOutcome::AlreadyActive);
        assert_eq!(s.sink.attempt_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_location_still_alerts_when_online() {
        let s = setup(true);
        let trigger = SosTrigger::new(
            s.queue.clone(),
            UnavailableGeolocator::new("permission denied"),
            Arc::new(s.feedback.clone()),
        )
        .with_countdown(0);

        let outcome = trigger.activate(CancellationToken::new()).await;

        assert_eq!(outcome, SosOutcome::LocationUnavailable { delivered: 2 });
        assert_eq!(s.feedback.last(), Some(Feedback::AlertSentWithoutLocation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_location_while_offline_reports_failure() {
        let s = setup(false);
        let trigger = SosTrigger::new(
            s.queue.clone(),
            UnavailableGeolocator::default(),
            Arc::new(s.feedback.clone()),
        )
        .with_countdown(0);

        let outcome = trigger.activate(CancellationToken::new()).await;

        assert_eq!(outcome, SosOutcome::LocationUnavailable { delivered: 0 });
        assert_eq!(s.feedback.last(), Some(Feedback::DeliveryFailed { pending: 0 }));
        assert!(s.queue.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_publishes_remaining_seconds() {
        let s = setup(true);
        let trigger = SosTrigger::new(s.queue.clone(), here(), Arc::new(s.feedback.clone()))
            .with_countdown(2);
        let mut phases = trigger.subscribe();

        let observe = async {
            let mut seen = Vec::new();
            while phases.changed().await.is_ok() {
                let phase = *phases.borrow_and_update();
                seen.push(phase);
                if phase == SosPhase::Finished {
                    break;
                }
            }
            seen
        };
        let (_, seen) = tokio::join!(trigger.activate(CancellationToken::new()), observe);

        assert_eq!(
            seen[..2].to_vec(),
            vec![SosPhase::CountingDown(2), SosPhase::CountingDown(1)]
        );
        assert_eq!(seen.last(), Some(&SosPhase::Finished));
    }
}
