pub mod common;
pub mod dashboard;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use common::*;
pub use dashboard::*;
pub use order::*;
pub use product::*;
pub use session::*;
pub use user::*;
