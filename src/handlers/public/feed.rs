// handlers/public/feed.rs - public reads: the problem board and discussion threads

use serde_json::json;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::store::{schema, Embed, Select};

/// GET /problems - every problem, newest first, with the poster's name and
/// the ids of solutions posted so far.
pub async fn problems_list(ctx: RequestContext) -> ApiResult {
    let query = Select::from(schema::PROBLEMS)
        .embed(Embed::parent(schema::USERS, "posted_by", &["username", "email"]))
        .embed(Embed::children(schema::SOLUTIONS, "problem_id", &["id", "builder_id"]))
        .newest_first();

    let problems = ctx.store.select_public(&query).await.map_err(ApiError::store_read)?;
    Ok(ApiResponse::success(json!({ "problems": problems })))
}

/// GET /discussions?problem_id=<id> - a problem's thread, oldest first
pub async fn discussions_list(ctx: RequestContext) -> ApiResult {
    let problem_id = ctx
        .query_param("problem_id")
        .ok_or_else(|| ApiError::validation_error("Problem ID is required"))?;

    let query = Select::from(schema::DISCUSSIONS)
        .eq("problem_id", problem_id)
        .embed(Embed::parent(schema::USERS, "user_id", &["username", "email"]))
        .oldest_first();

    let discussions = ctx.store.select_public(&query).await.map_err(ApiError::store_read)?;
    Ok(ApiResponse::success(json!({ "discussions": discussions })))
}
