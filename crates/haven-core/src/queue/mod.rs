//! Offline SOS alert queue.
//!
//! Locations captured while the device is offline are appended to an ordered
//! queue that is persisted as a whole snapshot after every change. Once
//! connectivity returns, `reconcile` sends each pending location to every
//! emergency contact as a text message and flags the record as synced when at
//! least one contact was reached.

mod config;

pub use config::{QueueConfig, RetentionPolicy, DEFAULT_DELIVERY_TIMEOUT, DEFAULT_STORAGE_KEY};

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::connectivity::ConnectivitySignal;
use crate::delivery::{delayed_alert_message, DeliveryChannel, NotificationSink};
use crate::feedback::{Feedback, FeedbackSink};
use crate::models::{
    Coordinates, EmergencyContact, LocationRecord, RecordId, ReconcileSummary, SkipReason,
};
use crate::storage::SlotStore;
use crate::util::compact_text;
use crate::Error;

/// Result of handing a fresh capture to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Device was offline; the location is stored for later delivery
    Queued(RecordId),
    /// Device is online; the caller should alert contacts right away
    DeliverLive,
}

struct QueueState {
    records: Vec<LocationRecord>,
    store: Box<dyn SlotStore>,
}

impl QueueState {
    fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| !record.is_synced())
            .count()
    }
}

/// Durable buffer for emergency locations captured while offline.
pub struct OfflineAlertQueue<N: NotificationSink> {
    config: QueueConfig,
    state: Mutex<QueueState>,
    reconcile_lock: Mutex<()>,
    contacts: RwLock<Vec<EmergencyContact>>,
    connectivity: Arc<dyn ConnectivitySignal>,
    feedback: Arc<dyn FeedbackSink>,
    sink: N,
}

impl<N: NotificationSink> OfflineAlertQueue<N> {
    /// Create an empty queue. Call `initialize` to load the persisted snapshot.
    pub fn new(
        config: QueueConfig,
        store: impl SlotStore + 'static,
        connectivity: Arc<dyn ConnectivitySignal>,
        sink: N,
        feedback: Arc<dyn FeedbackSink>,
        contacts: Vec<EmergencyContact>,
    ) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState {
                records: Vec::new(),
                store: Box::new(store),
            }),
            reconcile_lock: Mutex::new(()),
            contacts: RwLock::new(contacts),
            connectivity,
            feedback,
            sink,
        }
    }

    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Sink used for delayed alerts, shared with live alerting
    pub const fn sink(&self) -> &N {
        &self.sink
    }

    /// Live connectivity as reported by the signal right now
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Load the persisted snapshot, replacing the in-memory sequence.
    ///
    /// A missing slot yields an empty queue. Unreadable or malformed data is
    /// logged and also yields an empty queue; the stored value is left as is.
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        let loaded = match state.store.read(&self.config.storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LocationRecord>>(&raw) {
                Ok(records) => records,
                Err(error) => {
                    tracing::error!(
                        key = %self.config.storage_key,
                        "Discarding malformed offline queue snapshot ({error}): {}",
                        compact_text(&raw)
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::error!(
                    key = %self.config.storage_key,
                    "Failed to read offline queue snapshot: {error}"
                );
                Vec::new()
            }
        };
        state.records = loaded;
        tracing::debug!(
            total = state.records.len(),
            pending = state.pending_count(),
            "Offline queue loaded"
        );
    }

    /// Append a record and persist the whole queue.
    ///
    /// Never fails: a persistence error is logged and the record stays queued
    /// in memory for this session.
    pub async fn enqueue(&self, mut record: LocationRecord) -> RecordId {
        record.reset_for_enqueue();
        let id = record.id;

        let pending = {
            let mut state = self.state.lock().await;
            state.records.push(record);
            self.persist(&state);
            state.pending_count()
        };

        tracing::info!(%id, pending, "Queued offline SOS location");
        self.feedback.notify(Feedback::QueuedForLater { pending });
        id
    }

    /// Hand a freshly captured position to the queue.
    ///
    /// Connectivity is re-read at call time instead of trusting
    /// `believed_online`, which may be stale after a slow position fix.
    pub async fn capture_and_maybe_queue(
        &self,
        position: Coordinates,
        believed_online: bool,
    ) -> CaptureOutcome {
        let online = self.connectivity.is_online();
        if online != believed_online {
            tracing::warn!(
                believed_online,
                online,
                "Connectivity changed while the location was being captured"
            );
        }

        if online {
            return CaptureOutcome::DeliverLive;
        }

        let id = self.enqueue(LocationRecord::capture(position)).await;
        CaptureOutcome::Queued(id)
    }

    /// Deliver every unsynced record to the configured contacts.
    ///
    /// Passes are serialized: a call made while another pass is running waits
    /// for it and then only sees what is still unsynced.
    pub async fn reconcile(&self) -> ReconcileSummary {
        let _pass = self.reconcile_lock.lock().await;

        if !self.connectivity.is_online() {
            let pending = self.pending_count().await;
            tracing::debug!(pending, "Skipping reconciliation while offline");
            return ReconcileSummary::skipped(SkipReason::Offline, pending);
        }

        let selected: Vec<LocationRecord> = {
            let state = self.state.lock().await;
            state
                .records
                .iter()
                .filter(|record| !record.is_synced())
                .cloned()
                .collect()
        };
        if selected.is_empty() {
            return ReconcileSummary::skipped(SkipReason::NothingPending, 0);
        }

        let contacts = self.contacts.read().await.clone();
        if contacts.is_empty() {
            tracing::warn!("No emergency contacts configured; delayed alerts cannot be delivered");
        }

        let mut delivered = Vec::with_capacity(selected.len());
        let mut failed_deliveries = 0;
        for record in &selected {
            let message = delayed_alert_message(record);
            let outcomes = join_all(
                contacts
                    .iter()
                    .map(|contact| self.attempt_delivery(record.id, contact, &message)),
            )
            .await;

            let reached = outcomes.iter().filter(|reached| **reached).count();
            failed_deliveries += outcomes.len() - reached;
            if reached > 0 {
                delivered.push(record.id);
            } else {
                tracing::warn!(id = %record.id, "Delayed alert reached no contact");
            }
        }

        let (synced, evicted, pending) = {
            let mut state = self.state.lock().await;
            let mut synced = 0;
            for record in &mut state.records {
                if !record.is_synced() && delivered.contains(&record.id) {
                    record.mark_synced();
                    synced += 1;
                }
            }
            let evicted = self.config.retention.apply(&mut state.records);
            self.persist(&state);
            (synced, evicted, state.pending_count())
        };

        let summary = ReconcileSummary {
            attempted_records: selected.len(),
            synced,
            pending,
            failed_deliveries,
            evicted,
            skipped: None,
        };
        tracing::info!(
            attempted = summary.attempted_records,
            synced,
            pending,
            failed_deliveries,
            evicted,
            "Reconciliation finished"
        );

        let feedback = if synced > 0 {
            Feedback::DelayedAlertsSent { synced, pending }
        } else {
            Feedback::DeliveryFailed { pending }
        };
        self.feedback.notify(feedback);

        summary
    }

    /// Reconcile now if online, then again on every transition to online,
    /// until `cancel` fires.
    pub async fn run_until_cancelled(&self, cancel: CancellationToken) {
        let mut online_rx = self.connectivity.subscribe();
        if *online_rx.borrow_and_update() {
            self.reconcile().await;
        }

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                changed = online_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Connectivity signal closed; stopping reconciliation loop");
                        break;
                    }
                    let online = *online_rx.borrow_and_update();
                    if online {
                        self.reconcile().await;
                    }
                }
            }
        }
    }

    /// Remove synced records regardless of the configured retention policy.
    pub async fn prune_synced(&self) -> usize {
        let mut state = self.state.lock().await;
        let evicted = RetentionPolicy::DropSynced.apply(&mut state.records);
        if evicted > 0 {
            self.persist(&state);
        }
        evicted
    }

    /// Snapshot of the queue, oldest first
    pub async fn records(&self) -> Vec<LocationRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending_count()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    pub async fn contacts(&self) -> Vec<EmergencyContact> {
        self.contacts.read().await.clone()
    }

    /// Replace the contact list used by subsequent passes.
    pub async fn set_contacts(&self, contacts: Vec<EmergencyContact>) {
        *self.contacts.write().await = contacts;
    }

    async fn attempt_delivery(
        &self,
        id: RecordId,
        contact: &EmergencyContact,
        message: &str,
    ) -> bool {
        let attempt = self
            .sink
            .deliver(contact, message, DeliveryChannel::TextMessage);
        let result = match tokio::time::timeout(self.config.delivery_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.config.delivery_timeout)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(%id, contact = %contact.name, "Delayed alert delivered");
                true
            }
            Err(error) => {
                tracing::warn!(%id, contact = %contact.name, "Delayed alert failed: {error}");
                false
            }
        }
    }

    fn persist(&self, state: &QueueState) {
        let result = serde_json::to_string(&state.records)
            .map_err(Error::from)
            .and_then(|snapshot| state.store.write(&self.config.storage_key, &snapshot));
        if let Err(error) = result {
            tracing::error!(
                key = %self.config.storage_key,
                "Failed to persist offline queue, keeping it in memory only: {error}"
            );
        }
    }
}
