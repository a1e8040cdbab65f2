// handlers/public/mod.rs - Public handlers (no session required)
//
// Liveness, account entry points, and the read-only board.

pub mod auth;
pub mod feed;
pub mod system;
