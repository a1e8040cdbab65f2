// api/dispatch.rs - Route Dispatcher
//
// One entry point for every method and path. The path below `/api` is
// normalised to a route string, looked up together with the method in a
// static table, and the bound handler's result is collapsed into a response.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use serde_json::Map;

use super::request::{parse_body, parse_query, RequestContext};
use super::response::ApiResult;
use super::AppState;
use crate::error::ApiError;
use crate::handlers::{protected, public};

pub const API_PREFIX: &str = "/api";

pub type Handler = fn(RequestContext) -> BoxFuture<'static, ApiResult>;

/// One row of the dispatch table.
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    /// Whether the handler runs the auth guard. Informational; the guard
    /// itself is called from inside the handler.
    pub auth: bool,
    pub handler: Handler,
}

fn route(method: Method, path: &'static str, auth: bool, handler: Handler) -> Route {
    Route {
        method,
        path,
        auth,
        handler,
    }
}

static ROUTES: Lazy<Vec<Route>> = Lazy::new(|| {
    vec![
        // Public
        route(Method::GET, "/", false, |ctx| public::system::root(ctx).boxed()),
        route(Method::GET, "/health", false, |ctx| public::system::health(ctx).boxed()),
        route(Method::GET, "/test-db", false, |ctx| public::system::test_db(ctx).boxed()),
        route(Method::POST, "/auth/signup", false, |ctx| public::auth::signup(ctx).boxed()),
        route(Method::POST, "/auth/signin", false, |ctx| public::auth::signin(ctx).boxed()),
        route(Method::POST, "/auth/signout", false, |ctx| public::auth::signout(ctx).boxed()),
        route(Method::GET, "/problems", false, |ctx| public::feed::problems_list(ctx).boxed()),
        route(Method::GET, "/discussions", false, |ctx| public::feed::discussions_list(ctx).boxed()),
        // Protected
        route(Method::GET, "/auth/user", true, |ctx| protected::session::current_user(ctx).boxed()),
        route(Method::POST, "/users/profile", true, |ctx| protected::profile::profile_create(ctx).boxed()),
        route(Method::GET, "/users/profile", true, |ctx| protected::profile::profile_get(ctx).boxed()),
        route(Method::POST, "/problems", true, |ctx| protected::problems::problem_create(ctx).boxed()),
        route(Method::GET, "/problems/user", true, |ctx| protected::problems::problems_mine(ctx).boxed()),
        route(Method::POST, "/solutions", true, |ctx| protected::solutions::solution_create(ctx).boxed()),
        route(Method::GET, "/solutions/user", true, |ctx| protected::solutions::solutions_mine(ctx).boxed()),
        route(Method::POST, "/discussions", true, |ctx| protected::discussions::discussion_create(ctx).boxed()),
        route(Method::POST, "/contacts", true, |ctx| protected::contacts::contact_create(ctx).boxed()),
    ]
});

/// The full dispatch table, in declaration order.
pub fn routes() -> &'static [Route] {
    &ROUTES
}

pub fn find_route(method: &Method, path: &str) -> Option<&'static Route> {
    routes().iter().find(|r| r.method == *method && r.path == path)
}

/// `"/" + segments.join("/")`; no segments yields `"/"`.
pub fn normalize_route(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Route string for a request path under `/api`, or `None` outside it.
pub fn api_route(path: &str) -> Option<String> {
    let rest = path.strip_prefix(API_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    Some(normalize_route(&segments))
}

/// Pre-flight answer: empty 200. CORS headers are added by the middleware.
pub async fn preflight() -> Response {
    StatusCode::OK.into_response()
}

pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    if parts.method == Method::OPTIONS {
        return preflight().await;
    }

    let Some(route_name) = api_route(parts.uri.path()) else {
        return ApiError::route_not_found(parts.uri.path()).into_response();
    };

    let Some(entry) = find_route(&parts.method, &route_name) else {
        tracing::debug!("no route for {} {}", parts.method, route_name);
        return ApiError::route_not_found(&route_name).into_response();
    };

    tracing::debug!("dispatching {} {}", parts.method, route_name);

    let body = if parts.method == Method::GET {
        Map::new()
    } else {
        let limit = state.config.api.max_request_size_bytes;
        let parsed = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => parse_body(&bytes),
            Err(e) => {
                tracing::debug!("unreadable body on {}: {}", route_name, e);
                Err(ApiError::invalid_json("Request body is too large or unreadable"))
            }
        };
        match parsed {
            Ok(map) => map,
            Err(e) => return e.into_response(),
        }
    };

    let ctx = RequestContext {
        method: parts.method.clone(),
        route: route_name,
        query: parse_query(parts.uri.query()),
        body,
        store: state.gateway.for_request(&parts.headers),
        gateway: state.gateway.clone(),
        config: state.config.clone(),
    };

    match (entry.handler)(ctx).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}
