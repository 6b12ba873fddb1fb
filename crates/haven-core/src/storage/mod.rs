//! Key/value storage slots.
//!
//! A slot holds one serialized value under a fixed key and is always
//! overwritten as a whole.

mod memory;
mod sqlite;

pub use memory::MemorySlotStore;
pub use sqlite::SqliteSlotStore;

use crate::Result;

/// Synchronous whole-value slot storage.
pub trait SlotStore: Send {
    /// Read the raw value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
