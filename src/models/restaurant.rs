use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Restaurant {
    #[serde(alias = "restaurant_id", alias = "place_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "vicinity")]
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Food {
    #[serde(alias = "food_id")]
    pub id: String,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RestaurantDetailsRequest {
    pub ids: Vec<String>,
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ToggleFavorite {
    pub restaurant_id: String,
}
