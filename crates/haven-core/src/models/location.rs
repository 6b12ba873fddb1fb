//! Location record model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::{format_timestamp_utc, unix_millis_now};

/// A unique identifier for a captured location, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build a validated coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude {latitude} is outside -90..=90"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {longitude} is outside -180..=180"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Map link pointing at this position
    #[must_use]
    pub fn map_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={:.6},{:.6}",
            self.latitude, self.longitude
        )
    }

    /// Human-readable coordinates followed by the map link
    #[must_use]
    pub fn location_text(&self) -> String {
        format!(
            "{:.6}, {:.6} ({})",
            self.latitude,
            self.longitude,
            self.map_link()
        )
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One emergency location sample, pending or completed delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Identity assigned at capture time; older snapshots without one get a fresh ID on load
    #[serde(default)]
    pub id: RecordId,
    pub latitude: f64,
    pub longitude: f64,
    /// Capture timestamp (Unix ms)
    #[serde(rename = "timestamp")]
    pub captured_at: i64,
    /// Delivered to at least one contact
    #[serde(default)]
    synced: bool,
}

impl LocationRecord {
    /// Capture a new unsynced record stamped with the current time
    #[must_use]
    pub fn capture(coordinates: Coordinates) -> Self {
        Self::captured_at(coordinates, unix_millis_now())
    }

    /// Build an unsynced record with an explicit capture time
    #[must_use]
    pub fn captured_at(coordinates: Coordinates, captured_at: i64) -> Self {
        Self {
            id: RecordId::new(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            captured_at,
            synced: false,
        }
    }

    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Whether at least one delivery for this record has succeeded
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    /// Flag the record as delivered. There is no way back to unsynced.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }

    /// Clear the flag on a record that has not entered the queue yet
    pub(crate) fn reset_for_enqueue(&mut self) {
        self.synced = false;
    }

    pub fn map_link(&self) -> String {
        self.coordinates().map_link()
    }

    pub fn location_text(&self) -> String {
        self.coordinates().location_text()
    }

    pub fn captured_label(&self) -> String {
        format_timestamp_utc(self.captured_at)
    }
}
