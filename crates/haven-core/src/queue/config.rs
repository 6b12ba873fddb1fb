//! Queue configuration and retention policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::LocationRecord;

/// Storage slot holding the offline queue snapshot
pub const DEFAULT_STORAGE_KEY: &str = "offlineSOSLocations";

/// Upper bound for a single contact delivery attempt
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// What happens to synced records after a reconciliation pass.
///
/// Unsynced records are never evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "keep", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every record as history
    #[default]
    KeepAll,
    /// Remove records as soon as they are synced
    DropSynced,
    /// Keep only the most recent `n` synced records
    KeepRecentSynced(usize),
}

impl RetentionPolicy {
    /// Evict synced records according to the policy, oldest first.
    ///
    /// Returns the number of evicted records.
    pub fn apply(self, records: &mut Vec<LocationRecord>) -> usize {
        let synced = records.iter().filter(|record| record.is_synced()).count();
        let mut to_evict = match self {
            Self::KeepAll => 0,
            Self::DropSynced => synced,
            Self::KeepRecentSynced(keep) => synced.saturating_sub(keep),
        };
        if to_evict == 0 {
            return 0;
        }

        let before = records.len();
        records.retain(|record| {
            if to_evict > 0 && record.is_synced() {
                to_evict -= 1;
                false
            } else {
                true
            }
        });
        before - records.len()
    }
}

/// Configuration for an `OfflineAlertQueue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Slot key the snapshot is persisted under
    pub storage_key: String,
    /// Timeout applied to each contact delivery attempt
    pub delivery_timeout: Duration,
    /// Eviction of synced records
    pub retention: RetentionPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            retention: RetentionPolicy::KeepAll,
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub const fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn records(synced_flags: &[bool]) -> Vec<LocationRecord> {
        synced_flags
            .iter()
            .enumerate()
            .map(|(index, synced)| {
                let mut record = LocationRecord::captured_at(
                    Coordinates::new(40.0, -74.0).unwrap(),
                    i64::try_from(index).unwrap() * 1_000,
                );
                if *synced {
                    record.mark_synced();
                }
                record
            })
            .collect()
    }

    #[test]
    fn test_keep_all_evicts_nothing() {
        let mut queue = records(&[true, false, true]);
        assert_eq!(RetentionPolicy::KeepAll.apply(&mut queue), 0);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_drop_synced_keeps_pending() {
        let mut queue = records(&[true, false, true]);
        assert_eq!(RetentionPolicy::DropSynced.apply(&mut queue), 2);
        assert_eq!(queue.len(), 1);
        assert!(!queue[0].is_synced());
    }

    #[test]
    fn test_keep_recent_synced_drops_oldest_first() {
        let mut queue = records(&[true, true, false, true]);
        assert_eq!(RetentionPolicy::KeepRecentSynced(1).apply(&mut queue), 2);

        let timestamps: Vec<i64> = queue.iter().map(|record| record.captured_at).collect();
        assert_eq!(timestamps, vec![2_000, 3_000]);
    }

    #[test]
    fn test_retention_serialization() {
        let json = serde_json::to_string(&RetentionPolicy::KeepRecentSynced(5)).unwrap();
        assert_eq!(json, r#"{"mode":"keep_recent_synced","keep":5}"#);

        let parsed: RetentionPolicy = serde_json::from_str(r#"{"mode":"drop_synced"}"#).unwrap();
        assert_eq!(parsed, RetentionPolicy::DropSynced);
    }

    #[test]
    fn test_queue_config_builder() {
        let config = QueueConfig::default()
            .with_storage_key("custom")
            .with_delivery_timeout(Duration::from_millis(250))
            .with_retention(RetentionPolicy::DropSynced);

        assert_eq!(config.storage_key, "custom");
        assert_eq!(config.delivery_timeout, Duration::from_millis(250));
        assert_eq!(config.retention, RetentionPolicy::DropSynced);
    }
}
