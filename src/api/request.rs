use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use serde_json::{Map, Value};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::store::{Gateway, StoreHandle};

/// Everything a handler gets for one request: the parsed input, a store
/// handle scoped to the caller's session, and the configuration.
pub struct RequestContext {
    pub method: Method,
    pub route: String,
    pub query: HashMap<String, String>,
    pub body: Map<String, Value>,
    pub store: StoreHandle,
    pub gateway: Gateway,
    pub config: Arc<AppConfig>,
}

impl RequestContext {
    /// Non-empty string field from the JSON body.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.body
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Raw field from the JSON body, `None` when absent or null.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty query-string parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Fail with `message` unless every field in `fields` is a non-empty string.
    pub fn require(&self, fields: &[&str], message: &str) -> Result<(), ApiError> {
        if fields.iter().all(|field| self.text(field).is_some()) {
            Ok(())
        } else {
            Err(ApiError::validation_error(message))
        }
    }
}

/// Parse a request body into a JSON object. An empty body is an empty object.
pub fn parse_body(bytes: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::invalid_json("Request body must be a JSON object")),
        Err(e) => {
            tracing::debug!("rejecting malformed body: {}", e);
            Err(ApiError::invalid_json("Invalid JSON body"))
        }
    }
}

pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
