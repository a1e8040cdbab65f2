// handlers/mod.rs - Resource handlers, split by security tier
//
// Public (no session) and protected (auth guard runs inside the handler).
// Every handler takes a `RequestContext` and returns an `ApiResult`; the
// dispatcher binds them to (method, route) pairs.

pub mod protected;
pub mod public;
