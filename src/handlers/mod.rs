pub mod admin;
pub mod auth;
pub mod student;

pub use admin::admin_config;
pub use auth::auth_config;
pub use student::student_config;

use crate::error::AppError;
use actix_multipart::form::MultipartFormConfig;
use actix_web::http::StatusCode;
use actix_web::{Either, ResponseError, web};

/// Form posts accept either a JSON or a url-encoded body.
pub type FormOrJson<T> = Either<web::Json<T>, web::Form<T>>;

// multipart framing and the text fields on top of the proof itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Body limits and error mapping shared by every extractor.
pub fn extractor_config(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid form body: {err}")).into()
    }))
    .app_data(
        MultipartFormConfig::default()
            .total_limit(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
            .error_handler(|err, _req| {
                if err.status_code() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(err.to_string()).into()
                } else {
                    AppError::ValidationError(format!("Invalid upload: {err}")).into()
                }
            }),
    );
}
