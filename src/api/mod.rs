pub mod dispatch;
pub mod request;
pub mod response;

use std::sync::Arc;

use axum::{middleware::map_response, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::middleware::{apply_cors, handle_panic};
use crate::store::{Gateway, StoreError};

/// Shared per-process state: configuration and the store handle factory.
/// Handles themselves are built per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: Gateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        let gateway = Gateway::from_config(&config.store, &config.security.session_cookie)?;
        Ok(Self::new(config, gateway))
    }
}

/// The whole HTTP surface: every request goes to the dispatcher.
pub fn app(state: AppState) -> Router {
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .fallback(dispatch::dispatch)
        .with_state(state)
        // Panics become the generic 500; CORS goes on after so they carry it too
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(map_response(apply_cors));

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
