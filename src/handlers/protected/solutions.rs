use serde_json::json;
use uuid::Uuid;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::middleware::{require_role, require_user};
use crate::store::{schema, Embed, Select};
use crate::types::{NewSolution, Role};

/// POST /solutions - `{ problem_id, description, solution_url? }`
pub async fn solution_create(ctx: RequestContext) -> ApiResult {
    ctx.require(&["problem_id", "description"], "Problem ID and description are required")?;

    let user = require_user(&ctx.store).await?;
    require_role(&ctx, &user, Role::Builder).await?;

    let solution = NewSolution {
        id: Uuid::new_v4(),
        problem_id: ctx.text("problem_id").unwrap_or_default().to_string(),
        builder_id: user.id.clone(),
        description: ctx.text("description").unwrap_or_default().to_string(),
        solution_url: ctx.text("solution_url").unwrap_or_default().to_string(),
        created_at: crate::types::now(),
    };
    let row = serde_json::to_value(&solution).map_err(ApiError::internal)?;

    let solution = ctx
        .store
        .insert(schema::SOLUTIONS, row)
        .await
        .map_err(ApiError::store_write)?;

    Ok(ApiResponse::success(json!({
        "message": "Solution posted successfully",
        "solution": solution,
    })))
}

/// GET /solutions/user - the caller's solutions with the problem each one answers
pub async fn solutions_mine(ctx: RequestContext) -> ApiResult {
    let user = require_user(&ctx.store).await?;

    let query = Select::from(schema::SOLUTIONS)
        .eq("builder_id", user.id.as_str())
        .embed(Embed::parent(schema::PROBLEMS, "problem_id", &["title", "description", "tags"]))
        .newest_first();

    let solutions = ctx.store.select(&query).await.map_err(ApiError::store_read)?;
    Ok(ApiResponse::success(json!({ "solutions": solutions })))
}
