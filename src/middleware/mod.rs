pub mod auth;
pub mod cors;
pub mod recover;

pub use auth::{require_role, require_user};
pub use cors::apply_cors;
pub use recover::handle_panic;
