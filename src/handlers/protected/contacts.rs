use serde_json::json;
use uuid::Uuid;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::store::schema;
use crate::types::NewContact;

/// POST /contacts - bug reports and feedback
///
/// The reply address is the session's email, never one from the body.
pub async fn contact_create(ctx: RequestContext) -> ApiResult {
    ctx.require(&["subject", "message"], "Subject and message are required")?;

    let user = require_user(&ctx.store).await?;

    let contact = NewContact {
        id: Uuid::new_v4(),
        name: ctx.text("name").unwrap_or("Anonymous").to_string(),
        email: user.email.clone(),
        subject: ctx.text("subject").unwrap_or_default().to_string(),
        message: ctx.text("message").unwrap_or_default().to_string(),
        created_at: crate::types::now(),
    };
    let row = serde_json::to_value(&contact).map_err(ApiError::internal)?;

    let contact = ctx
        .store
        .insert(schema::CONTACTS, row)
        .await
        .map_err(ApiError::store_write)?;

    tracing::info!("contact message from {}", user.id);
    Ok(ApiResponse::success(json!({
        "message": "Message sent successfully",
        "contact": contact,
    })))
}
