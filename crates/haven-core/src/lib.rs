//! haven-core - Core library for Haven
//!
//! This crate contains the models, local storage, offline SOS alert queue and
//! emergency trigger logic shared by every Haven interface.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod delivery;
pub mod error;
pub mod feedback;
pub mod geolocation;
pub mod models;
pub mod queue;
pub mod sos;
pub mod storage;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{EmergencyContact, LocationRecord, RecordId, ReconcileSummary};
pub use queue::{CaptureOutcome, OfflineAlertQueue, QueueConfig, RetentionPolicy};
