//! Reconciliation summary model

use serde::{Deserialize, Serialize};

/// Why a reconciliation pass did no work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Connectivity reported offline
    Offline,
    /// Every record was already synced
    NothingPending,
}

/// Aggregate outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Records selected for delivery in this pass
    pub attempted_records: usize,
    /// Records flipped to synced in this pass
    pub synced: usize,
    /// Records still unsynced after the pass
    pub pending: usize,
    /// Record/contact pairs that failed or timed out
    pub failed_deliveries: usize,
    /// Records evicted by the retention policy
    pub evicted: usize,
    /// Set when the pass returned early without delivering anything
    pub skipped: Option<SkipReason>,
}

impl ReconcileSummary {
    pub(crate) const fn skipped(reason: SkipReason, pending: usize) -> Self {
        Self {
            attempted_records: 0,
            synced: 0,
            pending,
            failed_deliveries: 0,
            evicted: 0,
            skipped: Some(reason),
        }
    }

    /// True when records were attempted and none got through
    pub const fn is_total_failure(&self) -> bool {
        self.attempted_records > 0 && self.synced == 0
    }
}
