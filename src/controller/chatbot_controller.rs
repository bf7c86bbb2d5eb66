use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use futures::future::{AbortHandle, Abortable};
use tracing::{debug, info, warn};
use crate::controller::session_controller::SessionStore;
use crate::error::{ClientError, Result};
use crate::models::chat::{ChatReply, ChatRequest, CreateRouteRequest, LatLon};
use crate::models::location::Coordinates;
use crate::models::restaurant::Restaurant;
use crate::models::route::RoutePlan;
use crate::repositories::backend_repo::BackendRepo;

pub const MIN_ROUTE_STOPS: usize = 2;

/// Conversation with the backend assistant. The conversation id is only
/// advanced by replies that actually arrived.
pub struct ChatbotController {
    backend: Arc<BackendRepo>,
    session: SessionStore,
    conversation_id: Mutex<Option<String>>,
    next_request: AtomicU64,
    pending: Mutex<HashMap<u64, AbortHandle>>,
}

/// Unregisters an in-flight message's abort handle, also when its future is dropped.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<u64, AbortHandle>>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

impl ChatbotController {
    pub fn new(backend: Arc<BackendRepo>, session: SessionStore) -> Self {
        Self {
            backend,
            session,
            conversation_id: Mutex::new(None),
            next_request: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.conversation_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Forget the conversation; the next message starts a new one.
    pub fn reset(&self) {
        *self.conversation_id.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Aborts every message still waiting for a reply. False when nothing was pending.
    pub fn cancel(&self) -> bool {
        let handles: Vec<AbortHandle> = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &handles {
            handle.abort();
        }
        if !handles.is_empty() {
            debug!("Cancelled {} chat request(s)", handles.len());
        }
        !handles.is_empty()
    }

    pub async fn send_message(&self, text: &str) -> Result<ChatReply> {
        let message = text.trim();
        if message.is_empty() {
            return Err(ClientError::validation("Message is empty"));
        }
        self.session.require_user()?;

        let request = ChatRequest {
            message: message.to_string(),
            conversation_id: self.conversation_id(),
        };
        let (handle, registration) = AbortHandle::new_pair();
        let id = self.next_request.fetch_add(1, Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, handle);
        let guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        let outcome = Abortable::new(self.backend.send_chat(&request), registration).await;
        drop(guard);

        let res = outcome.map_err(|_| ClientError::Cancelled)?;
        let reply = self.session.observe(res).map_err(|e| {
            warn!("Chat request failed due to: {}", e);
            e
        })?;

        *self.conversation_id.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(reply.conversation_id.clone());
        Ok(reply)
    }

    /// Favorites the assistant can chain into a route.
    pub async fn favorites_for_route(&self) -> Result<Vec<Restaurant>> {
        self.session.require_user()?;
        let res = self.backend.favorites_for_route().await;
        self.session.observe(res)
    }

    pub async fn create_route(
        &self,
        restaurant_ids: &[String],
        user_location: Option<Coordinates>,
    ) -> Result<RoutePlan> {
        if restaurant_ids.len() < MIN_ROUTE_STOPS {
            return Err(ClientError::validation(format!(
                "Pick at least {} restaurants for a route",
                MIN_ROUTE_STOPS
            )));
        }
        self.session.require_user()?;

        let request = CreateRouteRequest {
            restaurant_ids: restaurant_ids.to_vec(),
            user_location: user_location
                .filter(Coordinates::is_valid)
                .map(|c| LatLon {
                    lat: c.latitude,
                    lon: c.longitude,
                }),
        };
        let res = self.backend.create_route(&request).await;
        let plan = self.session.observe(res)?.normalize();
        info!(
            "Route created with {} stops and {} polyline points",
            plan.stops.len(),
            plan.polyline.len()
        );
        Ok(plan)
    }
}
