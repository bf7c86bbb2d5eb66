use std::future::Future;
use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, info, warn};
use crate::devices::LocationProvider;
use crate::error::{ClientError, Result};
use crate::helpers::sequence::RequestSequencer;
use crate::models::location::{province_centroid, Coordinates, FALLBACK_PROVINCE, NEAR_ME};
use crate::models::place::{normalize_places, Place, Position};
use crate::models::restaurant::Food;
use crate::models::search::{MapFilter, SearchQuery};
use crate::repositories::backend_repo::BackendRepo;
use crate::repositories::tomtom_repo::TomTomRepo;

/// Radius used when browsing without a text query.
pub const NEARBY_RADIUS_M: u32 = 2000;
/// Radius used when the user typed something.
pub const QUERY_RADIUS_M: u32 = 5000;

/// What a provider is asked for once the center and radius are settled.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderRequest {
    pub query: Option<String>,
    pub province: Option<String>,
    pub center: Coordinates,
    pub radius: u32,
}

/// A remote source of raw place records.
pub trait PlaceSearch: Send + Sync {
    fn search_places(&self, request: &ProviderRequest) -> impl Future<Output = Result<Vec<Value>>> + Send;
}

impl PlaceSearch for BackendRepo {
    async fn search_places(&self, request: &ProviderRequest) -> Result<Vec<Value>> {
        let query = SearchQuery {
            query: request.query.clone().unwrap_or_default(),
            province: request.province.clone().unwrap_or_default(),
            lat: request.center.latitude,
            lon: request.center.longitude,
            radius: request.radius,
        };
        self.search_restaurants(&query).await
    }
}

impl PlaceSearch for TomTomRepo {
    async fn search_places(&self, request: &ProviderRequest) -> Result<Vec<Value>> {
        match &request.query {
            Some(query) => self.text_search(query, request.center, request.radius).await,
            None => self.nearby_search(request.center, request.radius).await,
        }
    }
}

/// Provider picked at startup from configuration.
#[derive(Clone)]
pub enum PlacesProvider {
    Backend(Arc<BackendRepo>),
    TomTom(Arc<TomTomRepo>),
}

impl PlaceSearch for PlacesProvider {
    async fn search_places(&self, request: &ProviderRequest) -> Result<Vec<Value>> {
        match self {
            PlacesProvider::Backend(repo) => repo.search_places(request).await,
            PlacesProvider::TomTom(repo) => repo.search_places(request).await,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub province_id: Option<String>,
    pub user_location: Option<Coordinates>,
    pub radius: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchResults {
    pub center: Coordinates,
    pub radius: u32,
    pub places: Vec<Place>,
}

impl SearchResults {
    /// Where the map should animate to: the first hit, if any.
    pub fn viewport(&self) -> Option<Position> {
        self.places.first().map(|p| p.position)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Fresh(SearchResults),
    /// A newer search was dispatched while this one was in flight; its results are dropped.
    Superseded,
}

impl SearchOutcome {
    pub fn into_results(self) -> Option<SearchResults> {
        match self {
            SearchOutcome::Fresh(results) => Some(results),
            SearchOutcome::Superseded => None,
        }
    }
}

fn is_near_me(province_id: Option<&str>) -> bool {
    match province_id.map(str::trim) {
        None => true,
        Some(id) => id.is_empty() || id == NEAR_ME,
    }
}

/// Device fix for "near me", else the province centroid, else Ha Noi.
pub fn resolve_search_center(province_id: Option<&str>, user_location: Option<Coordinates>) -> Coordinates {
    if is_near_me(province_id) {
        if let Some(location) = user_location.filter(Coordinates::is_valid) {
            return location;
        }
    }

    if let Some(centroid) = province_id.map(str::trim).and_then(province_centroid) {
        debug!("Found province centroid for {:?}", province_id);
        return centroid;
    }

    warn!(
        "Province {:?} has no known centroid, falling back to {}",
        province_id, FALLBACK_PROVINCE
    );
    province_centroid(FALLBACK_PROVINCE).unwrap_or(Coordinates::new(21.036810, 105.834709))
}

pub struct NearbySearchController<P> {
    provider: P,
    backend: Arc<BackendRepo>,
    search_sequencer: RequestSequencer,
    filter_sequencer: RequestSequencer,
}

impl<P: PlaceSearch> NearbySearchController<P> {
    pub fn new(provider: P, backend: Arc<BackendRepo>) -> Self {
        Self {
            provider,
            backend,
            search_sequencer: RequestSequencer::new(),
            filter_sequencer: RequestSequencer::new(),
        }
    }

    /// One provider request, results in provider order. Failures come back as an
    /// empty list; user-facing messaging is up to the caller.
    pub async fn search(&self, request: SearchRequest) -> SearchOutcome {
        let ticket = self.search_sequencer.issue();

        let query = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        let province_id = request.province_id.as_deref();
        let center = resolve_search_center(province_id, request.user_location);
        let radius = request.radius.unwrap_or(if query.is_some() {
            QUERY_RADIUS_M
        } else {
            NEARBY_RADIUS_M
        });
        let province = if is_near_me(province_id) {
            None
        } else {
            province_id.map(|p| p.trim().to_string())
        };

        info!(
            "Searching places query={:?} province={:?} center=[{}, {}] radius={}m",
            query, province, center.latitude, center.longitude, radius
        );

        let provider_request = ProviderRequest {
            query,
            province,
            center,
            radius,
        };
        let places = match self.provider.search_places(&provider_request).await {
            Ok(raw) => {
                let received = raw.len();
                let places = normalize_places(raw);
                debug!("Provider returned {} records, {} usable", received, places.len());
                places
            }
            Err(e) => {
                warn!("Place search failed due to: {}", e);
                Vec::new()
            }
        };

        if !self.search_sequencer.is_current(ticket) {
            debug!("Dropping superseded search results");
            return SearchOutcome::Superseded;
        }
        SearchOutcome::Fresh(SearchResults {
            center,
            radius,
            places,
        })
    }

    /// Searches around the device, degrading to the fallback centroid without a fix.
    pub async fn search_near_me<L: LocationProvider>(
        &self,
        location: &L,
        query: Option<String>,
    ) -> SearchOutcome {
        let user_location = location.current_position().await;
        if user_location.is_none() {
            warn!("No location available, searching around the default province");
        }
        self.search(SearchRequest {
            query,
            province_id: Some(NEAR_ME.to_string()),
            user_location,
            radius: None,
        })
        .await
    }

    pub async fn search_by_province(&self, province_id: &str) -> SearchOutcome {
        self.search(SearchRequest {
            province_id: Some(province_id.to_string()),
            ..SearchRequest::default()
        })
        .await
    }

    /// Map screen filter panel; same empty-on-failure and stale-drop rules as [`Self::search`].
    pub async fn filter_map(&self, filter: &MapFilter) -> SearchOutcome {
        let ticket = self.filter_sequencer.issue();
        let center = Coordinates::new(filter.lat, filter.lon);

        let places = if !center.is_valid() {
            warn!("Map filter without a valid center, skipping request");
            Vec::new()
        } else {
            match self.backend.map_filter(filter).await {
                Ok(response) if response.success => {
                    debug!("Map filter returned {:?} places", response.total);
                    normalize_places(response.places)
                }
                Ok(response) => {
                    warn!(
                        "Map filter rejected: {}",
                        response.message.unwrap_or_else(|| "no message".to_string())
                    );
                    Vec::new()
                }
                Err(e) => {
                    warn!("Map filter failed due to: {}", e);
                    Vec::new()
                }
            }
        };

        if !self.filter_sequencer.is_current(ticket) {
            return SearchOutcome::Superseded;
        }
        SearchOutcome::Fresh(SearchResults {
            center,
            radius: filter.radius,
            places,
        })
    }

    /// Dishes for the detail sheet of a selected place.
    pub async fn menu(&self, restaurant_id: &str) -> Result<Vec<Food>> {
        if restaurant_id.trim().is_empty() {
            return Err(ClientError::validation("Missing restaurant id"));
        }
        self.backend.foods_by_restaurant(restaurant_id).await
    }
}
