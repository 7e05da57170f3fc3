use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Principal;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "ali")]
    pub username: String,
    #[schema(example = "rahsia123")]
    pub password: String,
    /// Display name
    #[schema(example = "Ali bin Abu")]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: Principal,
    /// Same value as the session cookie, for clients that prefer a Bearer header
    pub token: String,
    pub expires_in: i64,
    pub redirect: String,
}
