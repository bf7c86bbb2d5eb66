use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::location::Coordinates;
use crate::models::place::{parse_position, resolve_id, resolve_name, resolve_position, UNKNOWN_PLACE_NAME};

/// Ordered polyline; nothing about it is cached.
pub type RouteCoordinates = Vec<Coordinates>;

/// Flattens nested point arrays and accepts both `{lat, lon}` and `{latitude, longitude}`.
pub fn normalize_route_points(points: &[Value]) -> RouteCoordinates {
    let mut coords = Vec::with_capacity(points.len());
    collect_points(points, &mut coords);
    coords
}

fn collect_points(points: &[Value], out: &mut RouteCoordinates) {
    for point in points {
        match point {
            Value::Array(inner) => collect_points(inner, out),
            other => {
                if let Some(position) = parse_position(other) {
                    out.push(position.into());
                }
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RouteStop {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    pub order: u32,
    pub distance_from_previous: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct RoutePlan {
    pub stops: Vec<RouteStop>,
    pub polyline: RouteCoordinates,
    pub total_distance: Option<f64>,
}

/// Backend shape of a multi-stop plan before normalization.
#[derive(Clone, Deserialize, Debug, Default)]
pub struct RawRoutePlan {
    #[serde(default)]
    pub route: Vec<Value>,
    #[serde(default)]
    pub route_coordinates: Vec<Value>,
    #[serde(default)]
    pub total_distance: Option<f64>,
}

impl RawRoutePlan {
    /// Stops that cannot be placed on the map are dropped.
    pub fn normalize(self) -> RoutePlan {
        let stops = self
            .route
            .iter()
            .enumerate()
            .filter_map(|(index, stop)| {
                let position = resolve_position(stop)?;
                Some(RouteStop {
                    id: resolve_id(stop).unwrap_or_else(|| format!("stop-{}", index + 1)),
                    name: resolve_name(stop).unwrap_or_else(|| UNKNOWN_PLACE_NAME.to_string()),
                    coordinates: position.into(),
                    order: stop
                        .get("order")
                        .and_then(Value::as_u64)
                        .map(|o| o as u32)
                        .unwrap_or(index as u32 + 1),
                    distance_from_previous: stop
                        .get("distance_from_previous")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0),
                })
            })
            .collect();

        RoutePlan {
            stops,
            polyline: normalize_route_points(&self.route_coordinates),
            total_distance: self.total_distance,
        }
    }
}

impl RoutePlan {
    /// Points the map should fit: the polyline, or the stop markers when there is none.
    pub fn viewport_points(&self) -> RouteCoordinates {
        if !self.polyline.is_empty() {
            return self.polyline.clone();
        }
        self.stops.iter().map(|s| s.coordinates).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn flattens_nested_polylines_with_mixed_shapes() {
        let points = vec![
            json!([{"lat": 10.0, "lon": 106.0}, {"latitude": 10.1, "longitude": 106.1}]),
            json!({"lat": 10.2, "lon": 106.2}),
            json!({"nonsense": true}),
        ];
        let coords = normalize_route_points(&points);
        assert_eq!(
            coords,
            vec![
                Coordinates::new(10.0, 106.0),
                Coordinates::new(10.1, 106.1),
                Coordinates::new(10.2, 106.2),
            ]
        );
    }

    #[test]
    fn plan_drops_stops_without_coordinates() {
        let raw: RawRoutePlan = serde_json::from_value(json!({
            "route": [
                {"restaurant_id": "r1", "name": "Quán A", "latitude": 10.77, "longitude": 106.70, "order": 1},
                {"id": "r2", "name": "Quán B"},
                {"id": "r3", "name": "Quán C", "coordinates": {"lat": 10.78, "lon": 106.71},
                 "order": 2, "distance_from_previous": 1.4}
            ],
            "total_distance": 1.4
        }))
        .unwrap();
        let plan = raw.normalize();
        assert_eq!(plan.stops.len(), 2);
        assert_eq!(plan.stops[0].id, "r1");
        assert_eq!(plan.stops[1].id, "r3");
        assert_eq!(plan.stops[1].distance_from_previous, 1.4);
        // no polyline, so the viewport falls back to the markers
        assert_eq!(plan.viewport_points().len(), 2);
    }
}
