use std::sync::Arc;
use tracing::info;
use crate::config::{Config, SearchProvider};
use crate::controller::bookmarks_controller::BookmarksController;
use crate::controller::chatbot_controller::ChatbotController;
use crate::controller::nearby_search_controller::{NearbySearchController, PlacesProvider};
use crate::controller::route_controller::RouteController;
use crate::controller::session_controller::SessionStore;
use crate::controller::user_review_controller::UserReviewController;
use crate::error::Result;
use crate::repositories::backend_repo::BackendRepo;
use crate::repositories::token_store::{FileTokenStore, TokenStore};
use crate::repositories::tomtom_repo::TomTomRepo;

pub mod bookmarks_controller;
pub mod chatbot_controller;
pub mod nearby_search_controller;
pub mod route_controller;
pub mod session_controller;
pub mod user_review_controller;

/// Everything the screens talk to, wired once at startup.
pub struct AppState {
    pub session: SessionStore,
    pub search: NearbySearchController<PlacesProvider>,
    pub bookmarks: BookmarksController,
    pub reviews: UserReviewController,
    pub routes: RouteController,
    pub chatbot: ChatbotController,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let token_store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.session_file));
        let backend = Arc::new(BackendRepo::new(
            &config.api_base_url,
            config.request_timeout(),
            config.retry_policy(),
            token_store,
        )?);
        let tomtom = Arc::new(TomTomRepo::new(
            &config.tomtom_base_url,
            &config.tomtom_api_key,
            config.request_timeout(),
            config.retry_policy(),
        )?);
        let provider = match config.search_provider {
            SearchProvider::Backend => PlacesProvider::Backend(backend.clone()),
            SearchProvider::Tomtom => PlacesProvider::TomTom(tomtom.clone()),
        };
        info!("Using {:?} as the places provider", config.search_provider);
        Ok(Self::new(backend, tomtom, provider))
    }

    pub fn new(backend: Arc<BackendRepo>, tomtom: Arc<TomTomRepo>, provider: PlacesProvider) -> Self {
        let session = SessionStore::new(backend.clone());
        Self {
            search: NearbySearchController::new(provider, backend.clone()),
            bookmarks: BookmarksController::new(backend.clone(), session.clone()),
            reviews: UserReviewController::new(backend.clone(), session.clone()),
            routes: RouteController::new(tomtom),
            chatbot: ChatbotController::new(backend, session.clone()),
            session,
        }
    }
}
