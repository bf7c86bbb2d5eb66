use std::sync::{Arc, RwLock};
use std::time::Duration;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use crate::error::{ClientError, Result};
use crate::helpers::retry::RetryPolicy;
use crate::models::chat::{ChatReply, ChatRequest, CreateRouteRequest};
use crate::models::place::extract_results;
use crate::models::rating::{CreatedReview, DeletedReview, NewReview, ReviewListing, ReviewTarget};
use crate::models::restaurant::{Food, FavoritesResponse, Restaurant, RestaurantDetailsRequest, ToggleFavorite};
use crate::models::route::RawRoutePlan;
use crate::models::search::{MapFilter, MapFilterResponse, SearchQuery};
use crate::models::user::{Credentials, MessageResponse, Registration, TokenResponse, User};
use crate::repositories::token_store::TokenStore;

#[derive(Deserialize, Default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// REST client for the app backend. Every call attaches the stored bearer token.
pub struct BackendRepo {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    token_store: Arc<dyn TokenStore>,
    on_unauthorized: RwLock<Option<UnauthorizedHook>>,
}

impl BackendRepo {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
            token_store,
            on_unauthorized: RwLock::new(None),
        })
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Runs after any 401, once the stored token has been dropped. Replaces the previous hook.
    pub fn on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_unauthorized.write().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        match self.token_store.token() {
            Ok(token) => token.map(|t| format!("Bearer {}", t)),
            Err(e) => {
                warn!("Error reading stored token: {}", e);
                None
            }
        }
    }

    async fn attempt<T, B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method.clone(), url);
        if let Some(bearer) = self.bearer() {
            request = request.header(reqwest::header::AUTHORIZATION, bearer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        // never log the auth header
        debug!("API request -> {} {}", method, url);
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn parse_response<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
            return Ok(serde_json::from_str(text)?);
        }

        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .error
            .or(body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.token_store.clear() {
                    warn!("Failed to clear expired token due to: {}", e);
                }
                if let Some(hook) = &*self.on_unauthorized.read().unwrap_or_else(|e| e.into_inner()) {
                    hook();
                }
                Err(ClientError::Unauthorized)
            }
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden(message)),
            _ => Err(ClientError::Api { status, message }),
        }
    }

    /// Safe to repeat: retried with backoff on transport errors and 5xx.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let url = url.as_str();
        let what = format!("{} {}", method, path);
        self.retry
            .run(&what, move || self.attempt(method.clone(), url, body))
            .await
    }

    /// Calls that change state on the backend go out exactly once.
    async fn send_once<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.attempt(method, &self.url(path), body).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<T, Value>(Method::GET, path, None).await
    }

    // auth

    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.send_once(Method::POST, "/login", Some(credentials)).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<TokenResponse> {
        self.send_once(Method::POST, "/register", Some(registration)).await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<MessageResponse> {
        let body = json!({ "email": email, "code": code });
        self.send_once(Method::POST, "/verify", Some(&body)).await
    }

    pub async fn logout(&self) -> Result<MessageResponse> {
        self.send_once::<_, Value>(Method::POST, "/auth/logout", None).await
    }

    // user

    pub async fn profile(&self) -> Result<User> {
        self.get("/user/profile").await
    }

    pub async fn update_profile(&self, name: &str, avatar: Option<&str>) -> Result<MessageResponse> {
        let body = json!({ "name": name, "avatar": avatar });
        self.send(Method::PUT, "/user/profile", Some(&body)).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<MessageResponse> {
        let body = json!({ "oldPassword": old_password, "newPassword": new_password });
        self.send_once(Method::PUT, "/user/change-password", Some(&body)).await
    }

    pub async fn change_email(&self, password: &str, new_email: &str) -> Result<MessageResponse> {
        let body = json!({ "password": password, "newEmail": new_email });
        self.send_once(Method::PUT, "/user/change-email", Some(&body)).await
    }

    // restaurants

    pub async fn search_restaurants(&self, query: &SearchQuery) -> Result<Vec<Value>> {
        let body: Value = self.send(Method::POST, "/search", Some(query)).await?;
        Ok(extract_results(body))
    }

    pub async fn map_filter(&self, filter: &MapFilter) -> Result<MapFilterResponse> {
        self.send(Method::POST, "/map/filter", Some(filter)).await
    }

    pub async fn restaurant_details(&self, ids: &[String]) -> Result<Vec<Restaurant>> {
        let body = RestaurantDetailsRequest { ids: ids.to_vec() };
        let listing: Value = self.send(Method::POST, "/restaurants/details", Some(&body)).await?;
        Ok(parse_listing(listing))
    }

    pub async fn foods_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Food>> {
        let listing: Value = self.get(&format!("/foods/restaurant/{}", restaurant_id)).await?;
        Ok(parse_listing(listing))
    }

    // favorites

    pub async fn toggle_favorite(&self, restaurant_id: &str) -> Result<FavoritesResponse> {
        let body = ToggleFavorite {
            restaurant_id: restaurant_id.to_string(),
        };
        self.send_once(Method::POST, "/favorites/toggle", Some(&body)).await
    }

    pub async fn favorites(&self) -> Result<FavoritesResponse> {
        self.get("/favorites").await
    }

    // reviews

    pub async fn reviews(&self, target: ReviewTarget, target_id: &str) -> Result<ReviewListing> {
        let body: Value = self
            .get(&format!("/reviews/{}/{}", target.as_str(), target_id))
            .await?;
        let current_rating = body.get("current_rating").and_then(Value::as_f64);
        let records = match body {
            Value::Object(mut map) => map.remove("reviews").unwrap_or_default(),
            other => other,
        };
        Ok(ReviewListing {
            reviews: parse_listing(records),
            current_rating,
        })
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<CreatedReview> {
        self.send_once(Method::POST, "/reviews", Some(review)).await
    }

    pub async fn delete_review(&self, review_id: &str) -> Result<DeletedReview> {
        self.send_once::<_, Value>(Method::DELETE, &format!("/reviews/{}", review_id), None)
            .await
    }

    // chatbot

    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.send_once(Method::POST, "/chat", Some(request)).await
    }

    pub async fn favorites_for_route(&self) -> Result<Vec<Restaurant>> {
        let body: Value = self.get("/chatbot/favorites-for-route").await?;
        let favorites = body.get("favorites").cloned().unwrap_or(body);
        Ok(parse_listing(favorites))
    }

    pub async fn create_route(&self, request: &CreateRouteRequest) -> Result<RawRoutePlan> {
        self.send_once(Method::POST, "/chatbot/create-route", Some(request))
            .await
    }
}

/// Entries that do not match the expected record are skipped with a warning.
fn parse_listing<T: DeserializeOwned>(body: Value) -> Vec<T> {
    extract_results(body)
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed record due to: {}", e);
                None
            }
        })
        .collect()
}
