use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct ChatReply {
    pub conversation_id: String,
    #[serde(default)]
    pub user_message: String,
    pub bot_response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Serialize, Debug)]
pub struct CreateRouteRequest {
    pub restaurant_ids: Vec<String>,
    pub user_location: Option<LatLon>,
}
