use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::controller::session_controller::SessionStore;
use crate::error::{ClientError, Result};
use crate::helpers::sequence::KeyedSequencer;
use crate::models::restaurant::Restaurant;
use crate::repositories::backend_repo::BackendRepo;

#[derive(Clone, Debug, PartialEq)]
pub struct ToggleOutcome {
    pub favorites: Vec<String>,
    pub is_favorite: bool,
    pub message: Option<String>,
    /// False when a newer toggle for the same restaurant overtook this one.
    pub applied: bool,
}

/// Keeps the session's favorite set in line with the backend.
pub struct BookmarksController {
    backend: Arc<BackendRepo>,
    session: SessionStore,
    sequencer: KeyedSequencer,
}

impl BookmarksController {
    pub fn new(backend: Arc<BackendRepo>, session: SessionStore) -> Self {
        Self {
            backend,
            session,
            sequencer: KeyedSequencer::new(),
        }
    }

    pub fn is_favorite(&self, restaurant_id: &str) -> bool {
        self.session
            .user()
            .map(|user| user.is_favorite(restaurant_id))
            .unwrap_or(false)
    }

    /// The backend answers with the full favorite list, which replaces ours verbatim.
    pub async fn toggle(&self, restaurant_id: &str) -> Result<ToggleOutcome> {
        self.session.require_user()?;
        if restaurant_id.trim().is_empty() {
            return Err(ClientError::validation("Missing restaurant id"));
        }

        let ticket = self.sequencer.issue(restaurant_id);
        let res = self.backend.toggle_favorite(restaurant_id).await;
        let applied = self.sequencer.complete(restaurant_id, ticket);
        let response = match self.session.observe(res) {
            Ok(response) => response,
            Err(e) => {
                // an older toggle for this id may have been dropped as stale
                if applied && !matches!(e, ClientError::Unauthorized) {
                    warn!("Toggle for {} failed due to: {}, resyncing favorites", restaurant_id, e);
                    if let Err(refresh_err) = self.refresh().await {
                        warn!("Favorites resync failed due to: {}", refresh_err);
                    }
                }
                return Err(e);
            }
        };

        if applied {
            self.session.replace_favorites(response.favorites.clone());
            info!(
                "Favorites updated for {}, now {} entries",
                restaurant_id,
                response.favorites.len()
            );
        } else {
            debug!("Ignoring stale toggle response for {}", restaurant_id);
        }

        Ok(ToggleOutcome {
            is_favorite: self.is_favorite(restaurant_id),
            favorites: self
                .session
                .user()
                .map(|u| u.favorites)
                .unwrap_or_default(),
            message: response.message,
            applied,
        })
    }

    /// Pulls the authoritative list, e.g. when the favorites screen opens.
    pub async fn refresh(&self) -> Result<Vec<String>> {
        self.session.require_user()?;
        let res = self.backend.favorites().await;
        let response = self.session.observe(res)?;
        self.session.replace_favorites(response.favorites);
        Ok(self.session.user().map(|u| u.favorites).unwrap_or_default())
    }

    /// Detail records for the current favorite set.
    pub async fn favorite_restaurants(&self) -> Result<Vec<Restaurant>> {
        let ids = self.refresh().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let res = self.backend.restaurant_details(&ids).await;
        self.session.observe(res).map_err(|e| {
            warn!("Something went wrong retrieving favourite restaurants due to: {}", e);
            e
        })
    }
}
