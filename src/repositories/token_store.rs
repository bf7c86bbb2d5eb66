use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::models::user::User;

/// What survives an app restart: the bearer token and the last known profile.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub user: Option<User>,
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<StoredSession>;

    fn save(&self, session: &StoredSession) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn token(&self) -> Result<Option<String>> {
        Ok(self.load()?.token)
    }

    fn save_token(&self, token: &str) -> Result<()> {
        let mut session = self.load()?;
        session.token = Some(token.to_string());
        self.save(&session)
    }

    fn save_user(&self, user: &User) -> Result<()> {
        let mut session = self.load()?;
        session.user = Some(user.clone());
        self.save(&session)
    }
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredSession> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(StoredSession::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoredSession::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoredSession>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            inner: Mutex::new(StoredSession {
                token: Some(token.to_string()),
                user: None,
            }),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredSession> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&StoredSession::default())
    }
}
