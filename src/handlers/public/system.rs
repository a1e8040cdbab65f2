// handlers/public/system.rs - GET /, GET /health, GET /test-db

use axum::http::StatusCode;
use serde_json::json;

use crate::api::dispatch::{routes, API_PREFIX};
use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::store::{schema, Select, StoreError};

pub const SERVICE_NAME: &str = "connecdo-api";

const TABLES_MISSING: &str = "Database tables not found. Please create them using the SQL provided.";
const CONNECTION_FAILED: &str = "Database connection failed";

/// GET / - API identity plus the route table
pub async fn root(_ctx: RequestContext) -> ApiResult {
    let endpoints: Vec<String> = routes()
        .iter()
        .map(|r| {
            let path = format!("{}{}", API_PREFIX, r.path);
            if r.auth {
                format!("{} {} (auth)", r.method, path)
            } else {
                format!("{} {}", r.method, path)
            }
        })
        .collect();

    Ok(ApiResponse::success(json!({
        "message": "Connecdo API - Where Problems Meet Solutions",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    })))
}

/// GET /health - liveness only; does not touch the store
pub async fn health(_ctx: RequestContext) -> ApiResult {
    Ok(ApiResponse::success(json!({
        "status": "healthy",
        "timestamp": crate::types::now(),
        "service": SERVICE_NAME,
    })))
}

/// GET /test-db - diagnostic probe: can the store answer a one-row read?
///
/// A store-reported error means the schema is missing; anything else means
/// the store could not be reached. Failure keeps the probe's own shape:
/// ```json
/// { "status": "error", "message": "...", "error": "<store message>" }
/// ```
pub async fn test_db(ctx: RequestContext) -> ApiResult {
    let client = ctx.gateway.client();
    let probe = Select::from(schema::USERS).columns(&["id"]).limit(1);

    match client.select(&probe).await {
        Ok(data) => Ok(ApiResponse::success(json!({
            "status": "success",
            "message": "Database connection successful",
            "data": data,
        }))),
        Err(e) => {
            tracing::error!("store probe failed: {}", e);
            let (message, error) = match e {
                StoreError::Rejected { message, .. } => (TABLES_MISSING, message),
                StoreError::Transport(e) => (CONNECTION_FAILED, e.without_url().to_string()),
                other => (CONNECTION_FAILED, other.to_string()),
            };
            Ok(ApiResponse::with_status(
                json!({
                    "status": "error",
                    "message": message,
                    "error": error,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
