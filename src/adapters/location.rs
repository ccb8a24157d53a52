use crate::domain::model::Coordinate;
use crate::domain::ports::LocationProvider;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;

/// Always reports the same position (e.g. a `--lat/--lng` override).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate> {
        Ok(self.0)
    }
}

/// Stand-in for hosts without positioning hardware or permission.
#[derive(Debug, Clone)]
pub struct UnavailableLocation {
    reason: String,
}

impl UnavailableLocation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for UnavailableLocation {
    async fn current_location(&self) -> Result<Coordinate> {
        Err(SyncError::GeolocationUnavailable {
            reason: self.reason.clone(),
        })
    }
}
