use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;

/// Successful handler output: a JSON object with domain-named keys, plus
/// an optional `Set-Cookie` for the session.
#[derive(Debug)]
pub struct ApiResponse {
    pub body: Value,
    pub status_code: Option<StatusCode>,
    pub set_cookie: Option<String>,
}

impl ApiResponse {
    /// Create a successful API response with default 200 status
    pub fn success(body: Value) -> Self {
        Self {
            body,
            status_code: None,
            set_cookie: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(body: Value, status_code: StatusCode) -> Self {
        Self {
            body,
            status_code: Some(status_code),
            set_cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.set_cookie = Some(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status_code.unwrap_or(StatusCode::OK)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(self.body)).into_response();

        if let Some(cookie) = self.set_cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!("Dropping invalid Set-Cookie value: {}", e),
            }
        }

        response
    }
}

/// An error rendered as a regular response, so headers can still be attached.
impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::with_status(err.to_json(), status)
    }
}

// Convenience type alias
pub type ApiResult = Result<ApiResponse, ApiError>;
