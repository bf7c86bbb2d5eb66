use std::time::Duration;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use crate::error::{ClientError, Result};
use crate::helpers::retry::RetryPolicy;
use crate::models::location::Coordinates;
use crate::models::place::extract_results;
use crate::models::route::{normalize_route_points, RouteCoordinates};

pub const DEFAULT_TOMTOM_URL: &str = "https://api.tomtom.com";
/// TomTom POI category for restaurants.
pub const RESTAURANT_CATEGORY: &str = "7315";
const NEARBY_LIMIT: &str = "20";
const TEXT_SEARCH_LIMIT: &str = "10";

#[derive(Deserialize, Default)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Deserialize, Default)]
struct RouteEntry {
    #[serde(default)]
    legs: Vec<RouteLeg>,
}

#[derive(Deserialize, Default)]
struct RouteLeg {
    #[serde(default)]
    points: Vec<Value>,
}

/// Places, geocoding and routing calls against the TomTom web API.
pub struct TomTomRepo {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl TomTomRepo {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        self.retry
            .run("TomTom request", move || async move {
                // the key is a query param; errors are stripped of the url so it never reaches the logs
                debug!("TomTom request -> {}", url);
                let response = self
                    .client
                    .get(url)
                    .query(&[("key", self.api_key.as_str())])
                    .query(params)
                    .send()
                    .await
                    .map_err(reqwest::Error::without_url)?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ClientError::Api { status, message });
                }
                Ok(response
                    .json::<Value>()
                    .await
                    .map_err(reqwest::Error::without_url)?)
            })
            .await
    }

    pub async fn nearby_search(&self, center: Coordinates, radius: u32) -> Result<Vec<Value>> {
        let url = format!("{}/search/2/nearbySearch/.json", self.base_url);
        let params = [
            ("lat", center.latitude.to_string()),
            ("lon", center.longitude.to_string()),
            ("radius", radius.to_string()),
            ("limit", NEARBY_LIMIT.to_string()),
            ("categorySet", RESTAURANT_CATEGORY.to_string()),
        ];
        Ok(extract_results(self.get_json(&url, &params).await?))
    }

    /// Free-text geocode/POI search biased towards `center`.
    pub async fn text_search(&self, query: &str, center: Coordinates, radius: u32) -> Result<Vec<Value>> {
        let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC);
        let url = format!("{}/search/2/search/{}.json", self.base_url, encoded);
        let params = [
            ("typeahead", "true".to_string()),
            ("limit", TEXT_SEARCH_LIMIT.to_string()),
            ("lat", center.latitude.to_string()),
            ("lon", center.longitude.to_string()),
            ("radius", radius.to_string()),
        ];
        Ok(extract_results(self.get_json(&url, &params).await?))
    }

    /// Points of every leg of the fastest route, in travel order.
    pub async fn route(&self, start: Coordinates, dest: Coordinates) -> Result<RouteCoordinates> {
        let url = format!(
            "{}/routing/1/calculateRoute/{},{}:{},{}/json",
            self.base_url, start.latitude, start.longitude, dest.latitude, dest.longitude
        );
        let params = [
            ("routeType", "fastest".to_string()),
            ("traffic", "false".to_string()),
        ];
        let body = self.get_json(&url, &params).await?;
        let parsed: RouteResponse = serde_json::from_value(body)?;
        let points: Vec<Value> = parsed
            .routes
            .into_iter()
            .next()
            .map(|route| route.legs.into_iter().flat_map(|leg| leg.points).collect())
            .unwrap_or_default();
        Ok(normalize_route_points(&points))
    }
}
