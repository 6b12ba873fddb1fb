//! Data models for Haven

mod contact;
mod location;
mod summary;

pub use contact::{ContactId, EmergencyContact};
pub use location::{Coordinates, LocationRecord, RecordId};
pub use summary::{ReconcileSummary, SkipReason};
