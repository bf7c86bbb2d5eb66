#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use eat_where_client::helpers::retry::RetryPolicy;
use eat_where_client::repositories::backend_repo::BackendRepo;
use eat_where_client::repositories::token_store::TokenStore;
use eat_where_client::repositories::tomtom_repo::TomTomRepo;

pub const TOKEN: &str = "tok-1";
pub const PASSWORD: &str = "secret";
pub const USER_ID: &str = "u-1";
pub const VERIFY_CODE: &str = "123456";
pub const TOMTOM_KEY: &str = "tt-key";
/// Toggling this id makes the backend answer 500.
pub const BROKEN_ID: &str = "boom";

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// In-process stand-in for the app backend.
#[derive(Default)]
pub struct MockBackend {
    pub favorites: Mutex<Vec<String>>,
    pub revoked: AtomicBool,
    pub toggle_calls: AtomicUsize,
    pub review_posts: AtomicUsize,
    pub review_deletes: AtomicUsize,
    pub search_bodies: Mutex<Vec<Value>>,
    pub logout_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub slow_next_toggle: AtomicBool,
    pub profile_updates: Mutex<Vec<Value>>,
    pub route_requests: Mutex<Vec<Value>>,
}

impl MockBackend {
    pub fn hits(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        let expected = format!("Bearer {}", TOKEN);
        let presented = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if presented != expected || self.revoked.load(Ordering::SeqCst) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or expired token" })),
            ));
        }
        Ok(())
    }
}

/// Binds to an ephemeral port and serves until the test runtime shuts down.
pub async fn spawn_backend(mock: Arc<MockBackend>) -> SocketAddr {
    let app = Router::new()
        .route("/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/user/profile", get(profile).put(update_profile))
        .route("/user/change-email", axum::routing::put(change_email))
        .route("/verify", post(verify))
        .route("/restaurants/details", post(restaurant_details))
        .route("/foods/restaurant/:id", get(foods))
        .route("/map/filter", post(map_filter))
        .route("/chatbot/favorites-for-route", get(favorites_for_route))
        .route("/chatbot/create-route", post(create_route))
        .route("/favorites", get(favorites))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/reviews", post(create_review))
        .route("/reviews/:key", delete(delete_review))
        .route("/reviews/:key/:id", get(list_reviews))
        .route("/search", post(search))
        .route("/chat", post(chat))
        .with_state(mock);

    serve(app)
}

fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(server);
    addr
}

/// In-process stand-in for the TomTom search and routing API.
#[derive(Default)]
pub struct MockTomTom {
    pub keys: Mutex<Vec<String>>,
    pub text_queries: Mutex<Vec<String>>,
    pub route_points: Mutex<Vec<String>>,
}

pub async fn spawn_tomtom(mock: Arc<MockTomTom>) -> SocketAddr {
    let app = Router::new()
        .route("/search/2/nearbySearch/.json", get(tomtom_nearby))
        .route("/search/2/search/:query", get(tomtom_text))
        .route("/routing/1/calculateRoute/:points/json", get(tomtom_route))
        .with_state(mock);
    serve(app)
}

pub fn tomtom_repo(addr: SocketAddr) -> Arc<TomTomRepo> {
    Arc::new(
        TomTomRepo::new(
            &format!("http://{}", addr),
            TOMTOM_KEY,
            Duration::from_secs(5),
            RetryPolicy::no_retry(),
        )
        .unwrap(),
    )
}

pub fn backend_repo(addr: SocketAddr, token_store: Arc<dyn TokenStore>) -> Arc<BackendRepo> {
    Arc::new(
        BackendRepo::new(
            &format!("http://{}", addr),
            Duration::from_secs(5),
            RetryPolicy::no_retry(),
            token_store,
        )
        .unwrap(),
    )
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] == PASSWORD {
        Ok(Json(json!({ "idToken": TOKEN })))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        ))
    }
}

async fn logout(State(mock): State<Arc<MockBackend>>) -> Json<Value> {
    mock.logout_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "message": "Logged out" }))
}

async fn profile(State(mock): State<Arc<MockBackend>>, headers: HeaderMap) -> Reply {
    mock.authorize(&headers)?;
    let favorites = mock.favorites.lock().unwrap().clone();
    Ok(Json(json!({
        "uid": USER_ID,
        "name": "Lan",
        "email": "lan@example.com",
        "favorites": favorites,
    })))
}

async fn favorites(State(mock): State<Arc<MockBackend>>, headers: HeaderMap) -> Reply {
    mock.authorize(&headers)?;
    let favorites = mock.favorites.lock().unwrap().clone();
    Ok(Json(json!({ "favorites": favorites })))
}

async fn toggle_favorite(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    mock.toggle_calls.fetch_add(1, Ordering::SeqCst);
    mock.authorize(&headers)?;
    let id = body["restaurant_id"].as_str().unwrap_or_default().to_string();
    if id == BROKEN_ID {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Database unavailable" })),
        ));
    }
    if mock.slow_next_toggle.swap(false, Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    let mut favorites = mock.favorites.lock().unwrap();
    let message = if let Some(pos) = favorites.iter().position(|f| *f == id) {
        favorites.remove(pos);
        "Removed from favorites"
    } else {
        favorites.push(id);
        "Added to favorites"
    };
    Ok(Json(json!({ "favorites": favorites.clone(), "message": message })))
}

async fn create_review(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    mock.review_posts.fetch_add(1, Ordering::SeqCst);
    mock.authorize(&headers)?;
    Ok(Json(json!({
        "review": {
            "id": "rv-new",
            "user_id": USER_ID,
            "username": "Lan",
            "rating": body["rating"],
            "comment": body["comment"],
            "timestamp": "2024-05-01T12:00:00Z",
        },
        "current_rating": 4.5,
    })))
}

/// Public listing, but a token that is sent must still be valid.
async fn list_reviews(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Path((_target, _id)): Path<(String, String)>,
) -> Reply {
    if headers.contains_key("authorization") {
        mock.authorize(&headers)?;
    }
    Ok(Json(json!({
        "reviews": [
            { "id": "rv-1", "user_id": "u-2", "username": "Minh", "rating": 3, "comment": "ok", "timestamp": "2024-03-01T08:30:00.123456" },
            { "user_id": "u-3", "rating": "five", "comment": "missing id" },
            { "id": "rv-2", "userId": USER_ID, "username": "Lan", "rating": 5, "comment": "great", "timestamp": "2024-03-02T09:00:00+07:00" },
        ],
        "current_rating": 4.0,
    })))
}

async fn delete_review(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Reply {
    mock.review_deletes.fetch_add(1, Ordering::SeqCst);
    mock.authorize(&headers)?;
    Ok(Json(json!({ "current_rating": 3.0 })))
}

async fn search(State(mock): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Json<Value> {
    mock.search_bodies.lock().unwrap().push(body);
    Json(json!({
        "results": [
            { "id": "p-1", "name": "Phở Hòa", "lat": 10.78, "lon": 106.70 },
            { "place_id": 7, "name": "Phở 2000", "geometry": { "location": { "lat": "10.77", "lng": "106.69" } } },
            { "name": "Nowhere" },
            { "id": "p-3", "poi": { "name": "Phở Lệ" }, "position": { "lat": 10.75, "lon": 106.68 } },
        ]
    }))
}

async fn chat(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    mock.chat_calls.fetch_add(1, Ordering::SeqCst);
    mock.authorize(&headers)?;
    if body["message"] == "slow" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    let conversation_id = body["conversation_id"].as_str().unwrap_or("conv-1").to_string();
    Ok(Json(json!({
        "conversation_id": conversation_id,
        "user_message": body["message"],
        "bot_response": "Try the broken rice on Nguyen Trai",
    })))
}

async fn update_profile(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    mock.authorize(&headers)?;
    mock.profile_updates.lock().unwrap().push(body);
    Ok(Json(json!({ "message": "Profile updated" })))
}

async fn change_email(State(mock): State<Arc<MockBackend>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    mock.authorize(&headers)?;
    if body["password"] != PASSWORD {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Wrong password" }))));
    }
    Ok(Json(json!({ "message": "Verification code sent" })))
}

async fn verify(Json(body): Json<Value>) -> Reply {
    if body["code"] != VERIFY_CODE {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid code" }))));
    }
    Ok(Json(json!({ "message": "Email verified" })))
}

async fn restaurant_details(Json(body): Json<Value>) -> Json<Value> {
    let restaurants: Vec<Value> = body["ids"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|id| json!({ "id": id, "name": format!("Quán {}", id.as_str().unwrap_or_default()), "vicinity": "Quận 1" }))
        .collect();
    Json(Value::Array(restaurants))
}

/// `min_rating` of 5 is rejected; a `slow` tag delays the answer.
async fn map_filter(Json(body): Json<Value>) -> Json<Value> {
    if body["min_rating"].as_f64() == Some(5.0) {
        return Json(json!({ "success": false, "message": "Rating filter out of range" }));
    }
    let slow = body["tags"]
        .as_array()
        .map_or(false, |tags| tags.iter().any(|t| t == "slow"));
    if slow {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    Json(json!({
        "success": true,
        "total": 2,
        "places": [
            { "id": "m-1", "name": "Cơm tấm", "lat": body["lat"], "lon": body["lon"] },
            { "id": "m-2", "name": "No location" },
        ],
    }))
}

async fn favorites_for_route(State(mock): State<Arc<MockBackend>>, headers: HeaderMap) -> Reply {
    mock.authorize(&headers)?;
    Ok(Json(json!({
        "favorites": [
            { "id": "r-1", "name": "Phở Hòa", "latitude": 10.78, "longitude": 106.70 },
            { "name": "Record without id" },
            { "restaurant_id": "r-2", "name": "Bún chả Hương Liên" },
        ]
    })))
}

async fn create_route(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    mock.authorize(&headers)?;
    mock.route_requests.lock().unwrap().push(body);
    Ok(Json(json!({
        "route": [
            { "id": "r-1", "name": "Phở Hòa", "lat": 10.78, "lon": 106.70, "order": 1, "distance_from_previous": 0.0 },
            { "id": "r-3", "name": "Closed for good", "order": 2 },
            { "id": "r-2", "name": "Bún chả", "latitude": 10.79, "longitude": 106.69, "order": 3, "distance_from_previous": 1500.0 },
        ],
        "route_coordinates": [
            [{ "lat": 10.78, "lon": 106.70 }, { "lat": 10.785, "lon": 106.695 }],
            [{ "latitude": 10.79, "longitude": 106.69 }],
        ],
        "total_distance": 1500.0,
    })))
}

fn record_key(mock: &MockTomTom, params: &HashMap<String, String>) {
    mock.keys
        .lock()
        .unwrap()
        .push(params.get("key").cloned().unwrap_or_default());
}

async fn tomtom_nearby(
    State(mock): State<Arc<MockTomTom>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record_key(&mock, &params);
    Json(json!({
        "summary": { "numResults": 2 },
        "results": [
            {
                "id": "tt-1",
                "poi": { "name": "Bánh mì Huỳnh Hoa", "categories": ["restaurant"] },
                "address": { "freeformAddress": "26 Lê Thị Riêng, Quận 1" },
                "position": { "lat": 10.7717, "lon": 106.6922 },
                "dist": 120.5,
            },
            { "id": "tt-2", "poi": { "name": "No position" } },
        ]
    }))
}

async fn tomtom_text(
    State(mock): State<Arc<MockTomTom>>,
    Path(query): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record_key(&mock, &params);
    mock.text_queries.lock().unwrap().push(query);
    Json(json!({
        "results": [
            { "id": "tt-9", "poi": { "name": "Phở Lệ" }, "position": { "lat": 10.7545, "lon": 106.6702 } },
        ]
    }))
}

async fn tomtom_route(
    State(mock): State<Arc<MockTomTom>>,
    Path(points): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record_key(&mock, &params);
    mock.route_points.lock().unwrap().push(points);
    Json(json!({
        "routes": [{
            "legs": [
                { "points": [{ "latitude": 10.7765, "longitude": 106.7009 }, { "latitude": 10.78, "longitude": 106.69 }] },
                { "points": [{ "latitude": 10.80, "longitude": 106.66 }] },
            ]
        }]
    }))
}

async fn foods(
    State(mock): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Path(restaurant_id): Path<String>,
) -> Reply {
    mock.authorize(&headers)?;
    Ok(Json(json!([
        { "id": "f-1", "restaurant_id": restaurant_id, "name": "Phở tái", "price": 55000 },
        { "id": "f-2", "restaurant_id": restaurant_id, "name": "Quẩy", "price": 5000 },
    ])))
}
