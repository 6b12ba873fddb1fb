//! In-memory slot storage with an optional byte quota.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::SlotStore;
use crate::{Error, Result};

/// Shared in-memory `SlotStore`.
///
/// Clones share the same slots, so a caller can hand one clone to a queue and
/// keep another to inspect what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    quota: Arc<Mutex<Option<usize>>>,
    fail_reads: Arc<AtomicBool>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes whose value is larger than `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        let store = Self::default();
        store.set_quota(Some(quota));
        store
    }

    pub fn set_quota(&self, quota: Option<usize>) {
        *self.quota.lock().unwrap_or_else(PoisonError::into_inner) = quota;
    }

    /// Make every read fail, as an unreadable backing store would.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other(format!(
                "slot {key} is unreadable"
            ))));
        }
        Ok(self.slots().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let quota = *self.quota.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = quota {
            if value.len() > quota {
                return Err(Error::QuotaExceeded {
                    needed: value.len(),
                    quota,
                });
            }
        }
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots().remove(key);
        Ok(())
    }
}
