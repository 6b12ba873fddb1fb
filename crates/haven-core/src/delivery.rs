//! Notification delivery to emergency contacts.
//!
//! Real telephony is out of reach for this crate; `LoggingSink` stands in for
//! it and reports every delivery as sent.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::models::{Coordinates, EmergencyContact, LocationRecord};
use crate::Result;

/// How an alert reaches a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Store-and-forward text message, used for stale locations
    TextMessage,
    /// Live call connecting the contact to the person in distress
    LiveCall,
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextMessage => f.write_str("text"),
            Self::LiveCall => f.write_str("call"),
        }
    }
}

/// Outbound alert delivery.
pub trait NotificationSink: Send + Sync {
    fn deliver(
        &self,
        contact: &EmergencyContact,
        message: &str,
        channel: DeliveryChannel,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Sink that logs the alert instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    async fn deliver(
        &self,
        contact: &EmergencyContact,
        message: &str,
        channel: DeliveryChannel,
    ) -> Result<()> {
        tracing::info!(
            contact = %contact.name,
            phone = %contact.phone,
            %channel,
            "Alert delivered: {message}"
        );
        Ok(())
    }
}

/// Text for an alert sent while the person is still at `position`.
pub fn live_alert_message(position: Coordinates) -> String {
    format!(
        "EMERGENCY: I need help. My current location: {}",
        position.location_text()
    )
}

/// Text for a location that was captured offline and is being sent late.
pub fn delayed_alert_message(record: &LocationRecord) -> String {
    format!(
        "DELAYED EMERGENCY ALERT: I triggered SOS at {} without a connection. Last known location: {}",
        record.captured_label(),
        record.location_text()
    )
}
