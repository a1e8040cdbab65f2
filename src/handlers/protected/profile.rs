// handlers/protected/profile.rs - POST/GET /users/profile
//
// The profile row is keyed by the auth id. Its primary key is what stops
// a second profile for the same account; there is no read-before-insert.

use serde_json::json;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::store::{schema, Select};
use crate::types::{NewProfile, Role};

/// POST /users/profile
///
/// Expected Input:
/// ```json
/// { "username": "alice", "role": "builder", "bio": "optional" }
/// ```
pub async fn profile_create(ctx: RequestContext) -> ApiResult {
    ctx.require(&["username", "role"], "Username and role are required")?;
    let role = ctx
        .text("role")
        .and_then(Role::parse)
        .ok_or_else(|| ApiError::validation_error("Role must be either poster or builder"))?;

    let user = require_user(&ctx.store).await?;

    let profile = NewProfile {
        id: user.id.clone(),
        email: user.email.clone(),
        username: ctx.text("username").unwrap_or_default().trim().to_string(),
        role,
        bio: ctx.text("bio").unwrap_or_default().to_string(),
        created_at: crate::types::now(),
    };
    let row = serde_json::to_value(&profile).map_err(ApiError::internal)?;

    let profile = ctx
        .store
        .insert(schema::USERS, row)
        .await
        .map_err(ApiError::store_write)?;

    tracing::info!("profile created for {} as {}", user.id, role.as_str());
    Ok(ApiResponse::success(json!({
        "message": "Profile created successfully",
        "profile": profile,
    })))
}

/// GET /users/profile - the caller's own profile row
pub async fn profile_get(ctx: RequestContext) -> ApiResult {
    let user = require_user(&ctx.store).await?;

    let query = Select::from(schema::USERS).eq("id", user.id.as_str()).single();
    let mut rows = ctx.store.select(&query).await.map_err(ApiError::store_read)?;
    let profile = rows.pop().unwrap_or_default();

    Ok(ApiResponse::success(json!({ "profile": profile })))
}
