use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use crate::models::location::Coordinates;

pub const UNKNOWN_PLACE_NAME: &str = "Unknown";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl From<Position> for Coordinates {
    fn from(p: Position) -> Self {
        Coordinates::new(p.lat, p.lon)
    }
}

impl From<Coordinates> for Position {
    fn from(c: Coordinates) -> Self {
        Position {
            lat: c.latitude,
            lon: c.longitude,
        }
    }
}

/// A search hit in canonical form, whatever provider it came from.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub position: Position,
    pub rating: Option<f64>,
    pub distance: Option<f64>,
    pub category: Option<String>,
    pub raw: Value,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone, Copy)]
struct Coord(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] f64);

/// The coordinate layouts seen across the backend, TomTom and Google-style payloads.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawPosition {
    LatLon { lat: Coord, lon: Coord },
    LatLng { lat: Coord, lng: Coord },
    Spelled { latitude: Coord, longitude: Coord },
    Nested { location: Box<RawPosition> },
}

impl RawPosition {
    fn into_position(self) -> Option<Position> {
        let (lat, lon) = match self {
            RawPosition::LatLon { lat, lon } => (lat.0, lon.0),
            RawPosition::LatLng { lat, lng } => (lat.0, lng.0),
            RawPosition::Spelled {
                latitude,
                longitude,
            } => (latitude.0, longitude.0),
            RawPosition::Nested { location } => return location.into_position(),
        };
        let coords = Coordinates::new(lat, lon);
        coords.is_valid().then(|| coords.into())
    }
}

const POSITION_KEYS: [&str; 6] = [
    "position",
    "geometry",
    "latLng",
    "location",
    "coord",
    "coordinates",
];

/// Arrays are never read as positions: `[lon, lat]` ordering differs between providers.
pub(crate) fn parse_position(candidate: &Value) -> Option<Position> {
    if !candidate.is_object() {
        return None;
    }
    RawPosition::deserialize(candidate)
        .ok()
        .and_then(RawPosition::into_position)
}

pub(crate) fn resolve_position(raw: &Value) -> Option<Position> {
    std::iter::once(raw)
        .chain(POSITION_KEYS.iter().filter_map(|key| raw.get(key)))
        .find_map(parse_position)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn resolve_id(raw: &Value) -> Option<String> {
    ["id", "place_id", "restaurant_id"]
        .iter()
        .filter_map(|key| raw.get(key))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

pub(crate) fn resolve_name(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("name"))
        .or_else(|| non_empty_str(raw.pointer("/poi/name")))
}

fn resolve_address(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("address"))
        .or_else(|| non_empty_str(raw.pointer("/address/freeformAddress")))
        .or_else(|| non_empty_str(raw.get("vicinity")))
}

fn resolve_number(raw: &Value, pointers: &[&str]) -> Option<f64> {
    pointers
        .iter()
        .filter_map(|p| raw.pointer(p))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite())
}

fn resolve_category(raw: &Value) -> Option<String> {
    non_empty_str(raw.get("category"))
        .or_else(|| non_empty_str(raw.pointer("/poi/categories/0")))
}

impl Place {
    /// `None` when no coordinate pair can be resolved from the record.
    pub fn from_raw(index: usize, raw: Value) -> Option<Place> {
        let position = resolve_position(&raw)?;
        Some(Place {
            id: resolve_id(&raw).unwrap_or_else(|| format!("res-{}", index)),
            name: resolve_name(&raw).unwrap_or_else(|| UNKNOWN_PLACE_NAME.to_string()),
            address: resolve_address(&raw).unwrap_or_default(),
            position,
            rating: resolve_number(&raw, &["/rating", "/poi/rating"]),
            distance: resolve_number(&raw, &["/distance", "/dist"]),
            category: resolve_category(&raw),
            raw,
        })
    }
}

/// Keeps provider order; records without usable coordinates are dropped.
pub fn normalize_places(results: Vec<Value>) -> Vec<Place> {
    results
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| Place::from_raw(i, raw))
        .collect()
}

/// Providers answer either with a bare array or with the array under a well known key.
pub fn extract_results(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => ["results", "places", "restaurants", "data"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
