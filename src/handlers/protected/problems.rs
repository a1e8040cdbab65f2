use serde_json::json;
use uuid::Uuid;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::middleware::{require_role, require_user};
use crate::store::{schema, Embed, Select};
use crate::types::{normalize_tags, NewProblem, Role};

/// POST /problems
///
/// Expected Input:
/// ```json
/// { "title": "T", "description": "D", "tags": "ai, web" }
/// ```
/// `tags` may also be a list.
pub async fn problem_create(ctx: RequestContext) -> ApiResult {
    ctx.require(&["title", "description"], "Title and description are required")?;

    let user = require_user(&ctx.store).await?;
    require_role(&ctx, &user, Role::Poster).await?;

    let problem = NewProblem {
        id: Uuid::new_v4(),
        title: ctx.text("title").unwrap_or_default().to_string(),
        description: ctx.text("description").unwrap_or_default().to_string(),
        tags: normalize_tags(ctx.field("tags")),
        posted_by: user.id.clone(),
        created_at: crate::types::now(),
    };
    let row = serde_json::to_value(&problem).map_err(ApiError::internal)?;

    let problem = ctx
        .store
        .insert(schema::PROBLEMS, row)
        .await
        .map_err(ApiError::store_write)?;

    Ok(ApiResponse::success(json!({
        "message": "Problem posted successfully",
        "problem": problem,
    })))
}

/// GET /problems/user - the caller's problems with their full solutions
pub async fn problems_mine(ctx: RequestContext) -> ApiResult {
    let user = require_user(&ctx.store).await?;

    let query = Select::from(schema::PROBLEMS)
        .eq("posted_by", user.id.as_str())
        .embed(Embed::children(schema::SOLUTIONS, "problem_id", &["*"]))
        .newest_first();

    let problems = ctx.store.select(&query).await.map_err(ApiError::store_read)?;
    Ok(ApiResponse::success(json!({ "problems": problems })))
}
