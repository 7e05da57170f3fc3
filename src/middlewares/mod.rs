pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, session_token};
pub use cors::create_cors;
