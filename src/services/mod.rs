pub mod auth_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod order_service;
pub mod session_service;

pub use auth_service::*;
pub use catalog_service::*;
pub use checkout_service::*;
pub use order_service::*;
pub use session_service::*;
