use std::sync::Arc;
use tracing::{info, warn};
use crate::devices::LocationProvider;
use crate::error::{ClientError, Result};
use crate::models::location::Coordinates;
use crate::models::route::RouteCoordinates;
use crate::repositories::tomtom_repo::TomTomRepo;

/// Start and destination closer than this on both axes are not worth routing.
pub const MIN_ROUTE_SPAN_DEG: f64 = 0.0001;

pub struct RouteController {
    tomtom: Arc<TomTomRepo>,
}

impl RouteController {
    pub fn new(tomtom: Arc<TomTomRepo>) -> Self {
        Self { tomtom }
    }

    /// Polyline from `start` to `dest`. Provider failures give an empty line.
    pub async fn route(&self, start: Coordinates, dest: Coordinates) -> Result<RouteCoordinates> {
        if !start.is_valid() || !dest.is_valid() {
            return Err(ClientError::validation("Missing start or destination coordinates"));
        }
        if start.is_near(&dest, MIN_ROUTE_SPAN_DEG) {
            return Err(ClientError::validation(
                "Current location and destination are too close",
            ));
        }

        match self.tomtom.route(start, dest).await {
            Ok(points) => {
                info!("Route calculated with {} points", points.len());
                Ok(points)
            }
            Err(e) => {
                warn!("Route calculation failed due to: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Directions from wherever the device is to a selected place.
    pub async fn route_from_location<L: LocationProvider>(
        &self,
        location: &L,
        dest: Coordinates,
    ) -> Result<RouteCoordinates> {
        let start = location
            .current_position()
            .await
            .ok_or_else(|| ClientError::validation("Current location is unavailable"))?;
        self.route(start, dest).await
    }
}
