use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid username or password")]
    AuthFailure,

    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::DuplicateUsername => "DUPLICATE_USERNAME",
            AppError::AuthFailure => "AUTH_FAILURE",
            AppError::OrderCreationFailed(_) => "ORDER_CREATION_FAILED",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            // gate failures bounce the client back to the login page
            AppError::Unauthorized => StatusCode::SEE_OTHER,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::AuthFailure => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::PayloadTooLarge(msg) => {
                log::warn!("Payload too large: {msg}");
                msg.clone()
            }
            AppError::Unauthorized => {
                log::warn!("Unauthorized access, redirecting to login");
                "Please log in to continue".to_string()
            }
            AppError::DuplicateUsername => "Username already exists".to_string(),
            AppError::AuthFailure => {
                log::warn!("Authentication failed");
                "Invalid username or password".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::OrderCreationFailed(msg) => {
                log::error!("Order creation failed: {msg}");
                "Order could not be placed, please try again".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, AppError::Unauthorized) {
            builder.insert_header((header::LOCATION, "/login"));
        }

        builder.json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}
