use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the backend `/search` call.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub province: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
}

/// Map screen filter panel, sent as-is to `/map/filter`.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MapFilter {
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
    pub categories: Vec<u8>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub limit: u32,
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct MapFilterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub places: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}
