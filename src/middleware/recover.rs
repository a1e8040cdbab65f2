use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Panic handler for `CatchPanicLayer`: logs the payload, answers with the generic 500.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal(format!("handler panicked: {}", detail)).into_response()
}
