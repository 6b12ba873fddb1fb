//! Device location capability.

use std::future::Future;

use crate::models::Coordinates;
use crate::{Error, Result};

/// Asynchronous position lookup.
pub trait Geolocator: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<Coordinates>> + Send;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: Coordinates,
}

impl FixedGeolocator {
    pub const fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.position)
    }
}

/// Position lookup that always fails, e.g. when permission was denied.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGeolocator {
    reason: String,
}

impl UnavailableGeolocator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Geolocator for UnavailableGeolocator {
    async fn locate(&self) -> Result<Coordinates> {
        let reason = if self.reason.is_empty() {
            "position unavailable"
        } else {
            self.reason.as_str()
        };
        Err(Error::Geolocation(reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fixed_geolocator() {
        let position = Coordinates::new(40.7, -74.0).unwrap();
        let located = FixedGeolocator::new(position).locate().await.unwrap();
        assert_eq!(located, position);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unavailable_geolocator() {
        let error = UnavailableGeolocator::new("permission denied")
            .locate()
            .await
            .unwrap_err();
        assert!(error.to_string().contains("permission denied"));
    }
}
