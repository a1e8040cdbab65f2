use serde_json::json;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::middleware::require_user;

/// GET /auth/user - the user behind the current session
pub async fn current_user(ctx: RequestContext) -> ApiResult {
    let user = require_user(&ctx.store).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}
