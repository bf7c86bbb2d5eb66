use std::sync::{Arc, RwLock};
use reqwest::StatusCode;
use tracing::{info, warn};
use crate::devices::{avatar_data_uri, ImageSource};
use crate::error::{ClientError, Result};
use crate::models::user::{Credentials, Registration, User, UserPatch};
use crate::repositories::backend_repo::BackendRepo;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub enum AuthState {
    /// Startup, before the stored token has been checked.
    Unknown,
    Authenticated(User),
    Unauthenticated,
}

/// Session holder handed to every controller that needs the current user.
/// Cloning shares the same state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<AuthState>>,
    backend: Arc<BackendRepo>,
}

impl SessionStore {
    /// Installs itself as the backend's 401 handler, so any rejected call ends the session.
    pub fn new(backend: Arc<BackendRepo>) -> Self {
        let state = Arc::new(RwLock::new(AuthState::Unknown));
        let on_reject = Arc::downgrade(&state);
        backend.on_unauthorized(move || {
            if let Some(state) = on_reject.upgrade() {
                let mut state = state.write().unwrap_or_else(|e| e.into_inner());
                if matches!(*state, AuthState::Authenticated(_)) {
                    warn!("Token rejected by backend, ending session");
                }
                *state = AuthState::Unauthenticated;
            }
        });
        Self { state, backend }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_state(&self, state: AuthState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state(), AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<User> {
        match self.state() {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn require_user(&self) -> Result<User> {
        self.user().ok_or(ClientError::Unauthenticated)
    }

    /// Rehydrates from the stored token. A failed profile fetch logs the user out.
    pub async fn restore(&self) -> AuthState {
        let token = match self.backend.token_store().token() {
            Ok(token) => token,
            Err(e) => {
                warn!("Error reading stored session: {}", e);
                None
            }
        };
        if token.is_none() {
            self.set_state(AuthState::Unauthenticated);
            return self.state();
        }

        match self.backend.profile().await {
            Ok(user) => self.authenticate(user),
            Err(e) => {
                warn!("Stored session could not be restored due to: {}", e);
                self.clear_local();
            }
        }
        self.state()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::validation("Please enter both email and password"));
        }

        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let result = self.login_and_fetch_profile(&credentials).await;
        match &result {
            Ok(user) => info!("Logged in as {}", user.email),
            Err(e) => {
                warn!("Login failed due to: {}", e);
                self.clear_local();
            }
        }
        result
    }

    async fn login_and_fetch_profile(&self, credentials: &Credentials) -> Result<User> {
        let token = self
            .backend
            .login(credentials)
            .await?
            .into_token()
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::BAD_GATEWAY,
                message: "Login response did not contain a token".to_string(),
            })?;
        self.backend.token_store().save_token(&token)?;

        let user = self.backend.profile().await?;
        self.authenticate(user.clone());
        Ok(user)
    }

    fn authenticate(&self, user: User) {
        if let Err(e) = self.backend.token_store().save_user(&user) {
            warn!("Failed to cache user profile due to: {}", e);
        }
        self.set_state(AuthState::Authenticated(user));
    }

    fn clear_local(&self) {
        if let Err(e) = self.backend.token_store().clear() {
            warn!("Failed to clear stored session due to: {}", e);
        }
        self.set_state(AuthState::Unauthenticated);
    }

    /// Always ends unauthenticated, whatever the backend says.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            warn!("Backend logout failed due to: {}", e);
        }
        self.clear_local();
    }

    /// Drops the session and the stored credentials when `result` is a 401.
    pub fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ClientError::Unauthorized) = &result {
            self.clear_local();
        }
        result
    }

    /// Last writer wins; the cached profile follows the in-memory one.
    pub fn update_user(&self, patch: UserPatch) -> Result<User> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let user = match &mut *state {
            AuthState::Authenticated(user) => {
                user.apply(patch);
                user.clone()
            }
            _ => return Err(ClientError::Unauthenticated),
        };
        drop(state);
        self.backend.token_store().save_user(&user)?;
        Ok(user)
    }

    pub(crate) fn replace_favorites(&self, favorites: Vec<String>) -> Option<User> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let user = match &mut *state {
            AuthState::Authenticated(user) => {
                user.replace_favorites(favorites);
                user.clone()
            }
            _ => return None,
        };
        drop(state);
        if let Err(e) = self.backend.token_store().save_user(&user) {
            warn!("Failed to cache favorites due to: {}", e);
        }
        Some(user)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        if name.trim().is_empty()
            || email.trim().is_empty()
            || password.is_empty()
            || confirm_password.is_empty()
        {
            return Err(ClientError::validation("Please fill in every field"));
        }
        if password != confirm_password {
            return Err(ClientError::validation("Passwords do not match"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let registration = Registration {
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
        };
        let response = self.backend.register(&registration).await?;
        if let Some(token) = response.into_token() {
            self.backend.token_store().save_token(&token)?;
        }
        info!("Registered {}, awaiting email verification", registration.email);
        Ok(())
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(ClientError::validation("Please enter the verification code"));
        }
        self.backend.verify_email(email.trim(), code.trim()).await?;
        if self.is_logged_in() {
            self.update_user(UserPatch {
                email: Some(email.trim().to_string()),
                ..UserPatch::default()
            })?;
        }
        Ok(())
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.require_user()?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let res = self.backend.change_password(old_password, new_password).await;
        self.observe(res).map(|_| ())
    }

    /// Sends a verification code to the new address; [`Self::verify_email`] completes it.
    pub async fn change_email(&self, password: &str, new_email: &str) -> Result<()> {
        self.require_user()?;
        if password.is_empty() || new_email.trim().is_empty() {
            return Err(ClientError::validation(
                "Please enter the new email and your password",
            ));
        }
        let res = self.backend.change_email(password, new_email.trim()).await;
        self.observe(res).map(|_| ())
    }

    pub async fn update_profile(&self, name: &str, image: Option<&dyn ImageSource>) -> Result<User> {
        self.require_user()?;
        let avatar = match image {
            Some(source) => match source.pick_image()? {
                Some(bytes) => Some(avatar_data_uri(&bytes)?),
                None => {
                    warn!("No image access, keeping current avatar");
                    None
                }
            },
            None => None,
        };

        let res = self.backend.update_profile(name, avatar.as_deref()).await;
        self.observe(res)?;
        self.update_user(UserPatch {
            name: Some(name.to_string()),
            avatar_url: avatar,
            ..UserPatch::default()
        })
    }
}
