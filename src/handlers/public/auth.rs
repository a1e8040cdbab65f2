// handlers/public/auth.rs - sign-up, sign-in, sign-out
//
// Thin wrappers over the auth provider. Sign-in also sets the session
// cookie that later requests are authenticated with.

use serde_json::json;

use crate::api::request::RequestContext;
use crate::api::response::{ApiResponse, ApiResult};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::store::Credentials;

fn credentials(ctx: &RequestContext) -> Result<Credentials, ApiError> {
    match (ctx.text("email"), ctx.text("password")) {
        (Some(email), Some(password)) => Ok(Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        }),
        _ => Err(ApiError::validation_error("Email and password are required")),
    }
}

/// POST /auth/signup
///
/// Expected Input:
/// ```json
/// { "email": "a@x.com", "password": "secret1" }
/// ```
pub async fn signup(ctx: RequestContext) -> ApiResult {
    let credentials = credentials(&ctx)?;
    let user = ctx
        .store
        .sign_up(&credentials)
        .await
        .map_err(ApiError::store_write)?;

    tracing::info!("account created: {}", user.id);
    Ok(ApiResponse::success(json!({
        "message": "User created successfully",
        "user": user,
    })))
}

/// POST /auth/signin - returns the user and session, and sets the session cookie
pub async fn signin(ctx: RequestContext) -> ApiResult {
    let credentials = credentials(&ctx)?;
    let (user, session) = ctx
        .store
        .sign_in(&credentials)
        .await
        .map_err(ApiError::store_write)?;

    tracing::info!("signed in: {}", user.id);
    let cookie = session_cookie(&ctx.config.security, &session.access_token);
    Ok(ApiResponse::success(json!({
        "message": "Signed in successfully",
        "user": user,
        "session": session,
    }))
    .with_cookie(cookie))
}

/// POST /auth/signout - ends the session (if any) and clears the cookie
///
/// The cookie is cleared even when the provider fails to end the session.
pub async fn signout(ctx: RequestContext) -> ApiResult {
    let cookie = clear_session_cookie(&ctx.config.security);

    let response = match ctx.store.sign_out().await {
        Ok(()) => ApiResponse::success(json!({ "message": "Signed out successfully" })),
        Err(e) => ApiResponse::from(ApiError::store_write(e)),
    };
    Ok(response.with_cookie(cookie))
}

pub fn session_cookie(security: &SecurityConfig, token: &str) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", security.session_cookie, token);
    if security.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(security: &SecurityConfig) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", security.session_cookie)
}
