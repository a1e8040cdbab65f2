// store/mod.rs - Data Store Gateway
//
// Every persistence and auth operation is delegated to the hosted backend.
// A `Gateway` owns the configured backend; each request builds its own
// `StoreHandle` carrying that request's session token.

pub mod memory;
pub mod query;
pub mod schema;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{StoreConfig, StoreKind};

pub use memory::MemoryBackend;
pub use query::{Direction, Embed, Select};
pub use supabase::SupabaseBackend;

/// Errors reported by the backing store or by the transport to it
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected store response: {0}")]
    Decode(String),

    #[error("Missing configuration: {0}")]
    Config(&'static str),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            message: message.into(),
            code: None,
        }
    }

    pub fn rejected_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        StoreError::Rejected {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

/// Email/password pair sent to the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// User record as returned by the auth provider. Unknown fields pass through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Operations the hosted backend provides. Implemented over HTTP for the
/// real provider and in-process for development and tests.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, StoreError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<(AuthUser, Session), StoreError>;

    async fn sign_out(&self, token: &str) -> Result<(), StoreError>;

    /// Resolve a session token to its user; `Ok(None)` when the token is unknown.
    async fn get_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError>;

    async fn select(&self, token: Option<&str>, query: &Select) -> Result<Vec<Value>, StoreError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> Result<Value, StoreError>;
}

/// Factory for store handles, built once from configuration.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn StoreBackend>,
    session_cookie: String,
}

impl Gateway {
    pub fn new(backend: Arc<dyn StoreBackend>, session_cookie: impl Into<String>) -> Self {
        Self {
            backend,
            session_cookie: session_cookie.into(),
        }
    }

    pub fn from_config(config: &StoreConfig, session_cookie: &str) -> Result<Self, StoreError> {
        let backend: Arc<dyn StoreBackend> = match config.kind {
            StoreKind::Supabase => {
                let url = config.url.as_deref().ok_or(StoreError::Config("SUPABASE_URL"))?;
                let key = config
                    .anon_key
                    .as_deref()
                    .ok_or(StoreError::Config("SUPABASE_ANON_KEY"))?;
                Arc::new(SupabaseBackend::new(url, key)?)
            }
            StoreKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(backend, session_cookie))
    }

    /// Handle for one inbound request: the session comes from the session
    /// cookie, or from an `Authorization: Bearer` header when there is none.
    pub fn for_request(&self, headers: &HeaderMap) -> StoreHandle {
        let token = session_from_cookies(headers, &self.session_cookie)
            .or_else(|| bearer_token(headers));
        StoreHandle::new(self.backend.clone(), token)
    }

    /// Long-lived handle with no session until `sign_in` is called on it.
    pub fn client(&self) -> StoreHandle {
        StoreHandle::new(self.backend.clone(), None)
    }
}

/// Authenticated handle to the store. Remembers the session it signed in with.
pub struct StoreHandle {
    backend: Arc<dyn StoreBackend>,
    access_token: RwLock<Option<String>>,
}

impl StoreHandle {
    fn new(backend: Arc<dyn StoreBackend>, access_token: Option<String>) -> Self {
        Self {
            backend,
            access_token: RwLock::new(access_token),
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, StoreError> {
        self.backend.sign_up(credentials).await
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(AuthUser, Session), StoreError> {
        let (user, session) = self.backend.sign_in(credentials).await?;
        *self.access_token.write().await = Some(session.access_token.clone());
        Ok((user, session))
    }

    /// Forget the session and end it at the provider. A session the provider
    /// already refuses counts as ended.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        let token = self.access_token.write().await.take();
        let Some(token) = token else {
            return Ok(());
        };
        match self.backend.sign_out(&token).await {
            Err(StoreError::Unauthorized(detail)) => {
                tracing::debug!("sign-out with stale session: {}", detail);
                Ok(())
            }
            other => other,
        }
    }

    /// Read for a public route. A stale session must not hide public data,
    /// so a refused token is dropped and the read retried anonymously.
    pub async fn select_public(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        let token = self.access_token().await;
        match self.backend.select(token.as_deref(), query).await {
            Err(StoreError::Unauthorized(detail)) if token.is_some() => {
                tracing::debug!("public read with stale session, retrying anonymously: {}", detail);
                self.backend.select(None, query).await
            }
            other => other,
        }
    }

    pub async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        match self.access_token().await {
            Some(token) => self.backend.get_user(&token).await,
            None => Ok(None),
        }
    }

    pub async fn select(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        let token = self.access_token().await;
        self.backend.select(token.as_deref(), query).await
    }

    pub async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let token = self.access_token().await;
        self.backend.insert(token.as_deref(), table, row).await
    }
}

fn session_from_cookies(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
