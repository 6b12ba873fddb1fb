//! Scripted collaborators shared by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::delivery::{DeliveryChannel, NotificationSink};
use crate::models::EmergencyContact;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Started {
        phone: String,
        message: String,
        channel: DeliveryChannel,
    },
    Finished {
        phone: String,
        message: String,
        delivered: bool,
    },
}

/// Notification sink whose failures, hangs and latency are set per test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    hanging: Arc<Mutex<HashSet<String>>>,
    fail_all: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_phone(&self, phone: &str) {
        self.failing.lock().unwrap().insert(phone.to_string());
    }

    pub fn hang_phone(&self, phone: &str) {
        self.hanging.lock().unwrap().insert(phone.to_string());
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Every delivery attempt that was started, in order
    pub fn attempts(&self) -> Vec<(String, String, DeliveryChannel)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Started {
                    phone,
                    message,
                    channel,
                } => Some((phone, message, channel)),
                SinkEvent::Finished { .. } => None,
            })
            .collect()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts().len()
    }
}

impl NotificationSink for ScriptedSink {
    async fn deliver(
        &self,
        contact: &EmergencyContact,
        message: &str,
        channel: DeliveryChannel,
    ) -> Result<()> {
        self.events.lock().unwrap().push(SinkEvent::Started {
            phone: contact.phone.clone(),
            message: message.to_string(),
            channel,
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let hang = self.hanging.lock().unwrap().contains(&contact.phone);
        if hang {
            std::future::pending::<()>().await;
        }

        let failing = self.fail_all.load(Ordering::SeqCst)
            || self.failing.lock().unwrap().contains(&contact.phone);
        self.events.lock().unwrap().push(SinkEvent::Finished {
            phone: contact.phone.clone(),
            message: message.to_string(),
            delivered: !failing,
        });

        if failing {
            Err(Error::Delivery(format!("{} unreachable", contact.phone)))
        } else {
            Ok(())
        }
    }
}

/// `count` valid contacts with phones `555-000-0001`, `555-000-0002`, ...
pub fn contacts(count: usize) -> Vec<EmergencyContact> {
    (1..=count)
        .map(|index| {
            EmergencyContact::new(format!("Contact {index}"), format!("555-000-{index:04}"), "")
                .unwrap()
        })
        .collect()
}
