#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use connecdo_api::config::AppConfig;
use connecdo_api::store::{
    AuthUser, Credentials, Gateway, MemoryBackend, Select, Session, StoreBackend, StoreError,
};
use connecdo_api::{app, AppState};

/// Failure a `CountingBackend` injects in front of the memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Any session token is refused on sign-out and on reads, like an expired JWT.
    StaleSession,
    /// Sign-out fails for a reason other than the session.
    LogoutFails,
    /// Reads report a missing table.
    ReadRejected,
    /// Reads never reach the store.
    Unreachable,
    /// Reads panic.
    PanicOnRead,
}

/// Memory backend that counts how often it is asked for data and for auth.
#[derive(Default)]
pub struct CountingBackend {
    inner: MemoryBackend,
    data_ops: AtomicUsize,
    auth_lookups: AtomicUsize,
    fault: Option<Fault>,
}

impl CountingBackend {
    pub fn with_fault(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub fn data_ops(&self) -> usize {
        self.data_ops.load(Ordering::SeqCst)
    }

    pub fn auth_lookups(&self) -> usize {
        self.auth_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, StoreError> {
        self.data_ops.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_up(credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<(AuthUser, Session), StoreError> {
        self.data_ops.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_in(credentials).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
        self.data_ops.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Some(Fault::StaleSession) => {
                return Err(StoreError::Unauthorized("invalid JWT: token is expired".into()))
            }
            Some(Fault::LogoutFails) => return Err(StoreError::rejected("Service unavailable")),
            _ => {}
        }
        self.inner.sign_out(token).await
    }

    async fn get_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
        self.auth_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(token).await
    }

    async fn select(&self, token: Option<&str>, query: &Select) -> Result<Vec<Value>, StoreError> {
        self.data_ops.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Some(Fault::StaleSession) if token.is_some() => {
                return Err(StoreError::Unauthorized("JWT expired".into()))
            }
            Some(Fault::ReadRejected) => {
                return Err(StoreError::rejected_with_code(
                    "relation \"public.users\" does not exist",
                    "42P01",
                ))
            }
            Some(Fault::Unreachable) => {
                return Err(StoreError::Decode("connection reset by peer".into()))
            }
            Some(Fault::PanicOnRead) => panic!("store exploded"),
            _ => {}
        }
        self.inner.select(token, query).await
    }

    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> Result<Value, StoreError> {
        self.data_ops.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(token, table, row).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Bytes,
    pub body: Value,
}

impl TestResponse {
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// A signed-in account: its auth id and session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// The router wired to a counting in-memory store, driven in process.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<CountingBackend>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_fault(fault: Fault) -> Self {
        Self::build(AppConfig::development(), CountingBackend::with_fault(fault))
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, CountingBackend::default())
    }

    fn build(mut config: AppConfig, backend: CountingBackend) -> Self {
        config.api.enable_request_logging = false;
        let backend = Arc::new(backend);
        let gateway = Gateway::new(backend.clone(), config.security.session_cookie.clone());
        let router = app(AppState::new(config, gateway));
        Self { router, backend }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("request")).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).expect("JSON body")
        };
        TestResponse {
            status,
            headers,
            raw,
            body,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, token).await
    }

    pub async fn post(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, Some(body), token).await
    }

    pub async fn sign_up_and_in(&self, email: &str, password: &str) -> TestUser {
        let credentials = json!({ "email": email, "password": password });

        let res = self.post("/api/auth/signup", credentials.clone(), None).await;
        assert_eq!(res.status, StatusCode::OK, "signup failed: {}", res.body);

        let res = self.post("/api/auth/signin", credentials, None).await;
        assert_eq!(res.status, StatusCode::OK, "signin failed: {}", res.body);

        TestUser {
            id: res.body["user"]["id"].as_str().expect("user id").to_string(),
            token: res.body["session"]["access_token"]
                .as_str()
                .expect("access token")
                .to_string(),
        }
    }

    /// Sign up, sign in and create a profile with `role`.
    pub async fn member(&self, email: &str, username: &str, role: &str) -> TestUser {
        let user = self.sign_up_and_in(email, "secret1").await;
        let res = self
            .post(
                "/api/users/profile",
                json!({ "username": username, "role": role }),
                Some(&user.token),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "profile failed: {}", res.body);
        user
    }
}

/// The server binary running on a free port with the in-memory store.
pub struct TestServer {
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_connecdo-api"))
            .env("CONNECDO_API_PORT", port.to_string())
            .env("CONNECDO_STORE", "memory")
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/api/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
