use serde_json::json;
use uuid::Uuid;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::store::schema;
use crate::types::NewDiscussion;

/// POST /discussions - `{ problem_id, message, parent_id? }`
///
/// Without `parent_id` the message starts a new thread.
pub async fn discussion_create(ctx: RequestContext) -> ApiResult {
    ctx.require(&["problem_id", "message"], "Problem ID and message are required")?;

    let user = require_user(&ctx.store).await?;

    let discussion = NewDiscussion {
        id: Uuid::new_v4(),
        problem_id: ctx.text("problem_id").unwrap_or_default().to_string(),
        user_id: user.id.clone(),
        parent_id: ctx.text("parent_id").map(str::to_string),
        message: ctx.text("message").unwrap_or_default().to_string(),
        created_at: crate::types::now(),
    };
    let row = serde_json::to_value(&discussion).map_err(ApiError::internal)?;

    let discussion = ctx
        .store
        .insert(schema::DISCUSSIONS, row)
        .await
        .map_err(ApiError::store_write)?;

    Ok(ApiResponse::success(json!({
        "message": "Discussion posted successfully",
        "discussion": discussion,
    })))
}
