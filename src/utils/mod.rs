pub mod filename;
pub mod jwt;
pub mod money;
pub mod password;

pub use filename::secure_filename;
pub use jwt::*;
pub use money::*;
pub use password::*;
