pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod store;
pub mod types;

pub use api::{app, AppState};
