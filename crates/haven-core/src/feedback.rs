//! User-facing feedback emitted by the queue and the SOS trigger.
//!
//! The core never renders anything; callers plug in a `FeedbackSink` and turn
//! events into toasts, badges or terminal output.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::Level;

/// One piece of feedback for the person using the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    /// A location was captured offline and stored for later delivery
    QueuedForLater { pending: usize },
    /// Delayed alerts went out after connectivity returned
    DelayedAlertsSent { synced: usize, pending: usize },
    /// A reconciliation pass reached nobody
    DeliveryFailed { pending: usize },
    /// Live alert delivered with a location
    AlertSent { delivered: usize },
    /// Live alert delivered but the position could not be determined
    AlertSentWithoutLocation,
}

impl Feedback {
    pub const fn title(&self) -> &'static str {
        match self {
            Self::QueuedForLater { .. } => "You're Offline",
            Self::DelayedAlertsSent { .. } => "Delayed Alerts Sent",
            Self::DeliveryFailed { .. } => "Alert Not Delivered",
            Self::AlertSent { .. } | Self::AlertSentWithoutLocation => "Emergency Alert Sent",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::QueuedForLater { .. } => {
                "Your location was stored and will be sent to your emergency contacts once you're back online.".to_string()
            }
            Self::DelayedAlertsSent { synced, .. } => {
                format!("{synced} delayed emergency alert(s) were sent to your contacts.")
            }
            Self::DeliveryFailed { .. } => {
                "We couldn't reach your emergency contacts. Please contact emergency services directly.".to_string()
            }
            Self::AlertSent { .. } => {
                "Your location has been shared with emergency contacts".to_string()
            }
            Self::AlertSentWithoutLocation => {
                "Unable to get precise location, but alert was sent".to_string()
            }
        }
    }

    /// Whether the UI should present this as an error
    pub const fn is_destructive(&self) -> bool {
        !matches!(self, Self::QueuedForLater { .. })
    }
}

/// Receiver of feedback events.
pub trait FeedbackSink: Send + Sync {
    fn notify(&self, feedback: Feedback);
}

/// Writes feedback to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl TracingFeedback {
    /// Level an event is logged at; only a failed delivery is a warning.
    pub const fn level(feedback: &Feedback) -> Level {
        match feedback {
            Feedback::DeliveryFailed { .. } => Level::WARN,
            _ => Level::INFO,
        }
    }
}

impl FeedbackSink for TracingFeedback {
    fn notify(&self, feedback: Feedback) {
        if Self::level(&feedback) == Level::WARN {
            tracing::warn!("{}: {}", feedback.title(), feedback.description());
        } else {
            tracing::info!("{}: {}", feedback.title(), feedback.description());
        }
    }
}

/// Collects feedback so it can be inspected or replayed later.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    events: Arc<Mutex<Vec<Feedback>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far.
    pub fn events(&self) -> Vec<Feedback> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Feedback> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn notify(&self, feedback: Feedback) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_failure_points_to_emergency_services() {
        let feedback = Feedback::DeliveryFailed { pending: 2 };
        assert!(feedback.description().contains("contact emergency services"));
        assert!(feedback.is_destructive());
    }

    #[test]
    fn test_delayed_alerts_report_count() {
        let feedback = Feedback::DelayedAlertsSent {
            synced: 2,
            pending: 0,
        };
        assert!(feedback.description().starts_with("2 delayed"));
    }

    #[test]
    fn test_queued_is_not_destructive() {
        assert!(!Feedback::QueuedForLater { pending: 1 }.is_destructive());
    }

    #[test]
    fn test_tracing_feedback_warns_only_on_failed_delivery() {
        assert_eq!(
            TracingFeedback::level(&Feedback::DeliveryFailed { pending: 1 }),
            Level::WARN
        );
        assert_eq!(
            TracingFeedback::level(&Feedback::AlertSent { delivered: 2 }),
            Level::INFO
        );
        assert_eq!(
            TracingFeedback::level(&Feedback::QueuedForLater { pending: 1 }),
            Level::INFO
        );

        let sink: &dyn FeedbackSink = &TracingFeedback;
        sink.notify(Feedback::DeliveryFailed { pending: 1 });
    }

    #[test]
    fn test_recording_feedback_keeps_order() {
        let recorder = RecordingFeedback::new();
        let observer = recorder.clone();
        recorder.notify(Feedback::QueuedForLater { pending: 1 });
        recorder.notify(Feedback::AlertSentWithoutLocation);

        assert_eq!(
            observer.events(),
            vec![
                Feedback::QueuedForLater { pending: 1 },
                Feedback::AlertSentWithoutLocation
            ]
        );
        assert_eq!(observer.last(), Some(Feedback::AlertSentWithoutLocation));
    }

    #[test]
    fn test_feedback_serializes_with_kind_tag() {
        let value = serde_json::to_value(Feedback::DelayedAlertsSent {
            synced: 1,
            pending: 0,
        })
        .unwrap();
        assert_eq!(value["kind"], "delayed_alerts_sent");
        assert_eq!(value["synced"], 1);
    }
}
