// store/supabase.rs - Hosted backend over HTTP
//
// Auth goes to the GoTrue endpoints under /auth/v1, table access to the
// PostgREST endpoints under /rest/v1. The public key is always sent as
// `apikey`; the bearer is the caller's session token when there is one.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::query::Select;
use super::{AuthUser, Credentials, Session, StoreBackend, StoreError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct SupabaseBackend {
    client: Client,
    base: Url,
    anon_key: String,
}

/// Sign-in payload: session fields plus the user.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    session: Session,
    user: AuthUser,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, StoreError> {
        let base = Url::parse(url).map_err(|_| StoreError::Config("SUPABASE_URL"))?;
        if anon_key.trim().is_empty() {
            return Err(StoreError::Config("SUPABASE_ANON_KEY"));
        }
        Ok(Self {
            client: Client::new(),
            base,
            anon_key: anon_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|e| StoreError::Decode(format!("bad endpoint {}: {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        Self::check(request.send().await?).await
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        let code = body.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        tracing::debug!("store rejected request: {} {}", status, message);
        if status == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Unauthorized(message));
        }
        Err(StoreError::Rejected { message, code })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoreBackend for SupabaseBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, StoreError> {
        let url = self.endpoint("auth/v1/signup")?;
        let request = self.authorize(self.client.post(url), None).json(credentials);
        let body: Value = Self::decode(self.send(request).await?).await?;

        // With auto-confirm the provider wraps the user in a session payload.
        let user = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<(AuthUser, Session), StoreError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self.authorize(self.client.post(url), None).json(credentials);
        let token: TokenResponse = Self::decode(self.send(request).await?).await?;
        Ok((token.user, token.session))
    }

    async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self.authorize(self.client.post(url), Some(token)).send().await?;
        if session_already_gone(response.status()) {
            tracing::debug!("logout refused with {}; treating session as ended", response.status());
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn get_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
        let url = self.endpoint("auth/v1/user")?;
        match self.send(self.authorize(self.client.get(url), Some(token))).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(StoreError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn select(&self, token: Option<&str>, query: &Select) -> Result<Vec<Value>, StoreError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", query.table))?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());

        let mut request = self.authorize(self.client.get(url), token);
        if query.single {
            request = request.header(header::ACCEPT, SINGLE_OBJECT);
        }
        let body: Value = Self::decode(self.send(request).await?).await?;

        match body {
            Value::Array(rows) => Ok(rows),
            Value::Object(_) if query.single => Ok(vec![body]),
            other => Err(StoreError::Decode(format!("expected rows, got {}", other))),
        }
    }

    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> Result<Value, StoreError> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        let request = self
            .authorize(self.client.post(url), token)
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![row]));
        let body: Value = Self::decode(self.send(request).await?).await?;

        match body {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            other => Err(StoreError::Decode(format!("expected inserted row, got {}", other))),
        }
    }
}

/// Logout answers for a token the provider no longer knows.
fn session_already_gone(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    )
}

/// Pull the human-readable message out of a GoTrue or PostgREST error body.
fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
