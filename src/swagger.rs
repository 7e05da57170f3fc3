use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("koperasi_session"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::index,
        handlers::auth::login_page,
        handlers::auth::login,
        handlers::auth::register_page,
        handlers::auth::register,
        handlers::auth::logout,
        handlers::student::dashboard,
        handlers::student::my_orders,
        handlers::student::checkout_page,
        handlers::student::checkout,
        handlers::admin::dashboard,
        handlers::admin::products,
        handlers::admin::orders,
        handlers::admin::update_order_status,
        handlers::admin::add_product,
        handlers::admin::update_product,
        handlers::admin::payment_proof,
    ),
    components(
        schemas(
            crate::entities::UserRole,
            Principal,
            SessionStatus,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            ProductResponse,
            CreateProductRequest,
            UpdateProductRequest,
            CartLine,
            handlers::student::CheckoutForm,
            OrderResponse,
            OrderItemResponse,
            OrderWithItems,
            UpdateOrderStatusRequest,
            DashboardStats,
            AdminDashboardResponse,
            StudentDashboardResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, registration and sessions"),
        (name = "student", description = "Catalog browsing, checkout and own orders"),
        (name = "admin", description = "Store administration"),
    ),
    info(
        title = "Koperasi Backend API",
        version = "1.0.0",
        description = "School cooperative store ordering API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_store_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/checkout", "/admin/update_order_status/{order_id}", "/logout"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
