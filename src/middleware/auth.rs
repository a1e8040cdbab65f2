// middleware/auth.rs - Auth Guard
//
// The only authorization primitive: is there a logged-in session on this
// handle. Role checks for posting live here too and are switched by config.

use serde_json::Value;

use crate::api::request::RequestContext;
use crate::error::ApiError;
use crate::store::{schema, AuthUser, Select, StoreHandle};
use crate::types::Role;

/// Resolve the session's user or fail with 401. Store errors are not
/// surfaced; any failure to find a user is just "Unauthorized".
pub async fn require_user(store: &StoreHandle) -> Result<AuthUser, ApiError> {
    match store.current_user().await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            tracing::debug!("auth guard: no session");
            Err(ApiError::unauthorized())
        }
        Err(e) => {
            tracing::warn!("auth guard: session lookup failed: {}", e);
            Err(ApiError::unauthorized())
        }
    }
}

/// With role enforcement on, the caller's profile must carry `role`.
pub async fn require_role(ctx: &RequestContext, user: &AuthUser, role: Role) -> Result<(), ApiError> {
    if !ctx.config.security.enforce_roles {
        return Ok(());
    }

    let query = Select::from(schema::USERS)
        .columns(&["role"])
        .eq("id", user.id.as_str())
        .limit(1);
    let rows = ctx.store.select(&query).await.map_err(ApiError::store_read)?;

    let actual = rows
        .first()
        .and_then(|row| row.get("role"))
        .and_then(Value::as_str)
        .and_then(Role::parse);

    match actual {
        Some(actual) if actual == role => Ok(()),
        Some(actual) => {
            tracing::warn!("user {} with role {} tried a {} action", user.id, actual.as_str(), role.as_str());
            Err(ApiError::forbidden(format!("Only {}s can do this", role.as_str())))
        }
        None => Err(ApiError::forbidden("Complete your profile first")),
    }
}
