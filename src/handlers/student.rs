use crate::entities::UserRole;
use crate::error::AppResult;
use crate::models::*;
use crate::services::{CatalogService, CheckoutService, OrderService};
use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use actix_web::{HttpResponse, Result, ResponseError, web};
use utoipa::ToSchema;

/// Multipart body of `POST /checkout`.
#[derive(Debug, MultipartForm, ToSchema)]
pub struct CheckoutForm {
    /// JSON array of `{id, price, quantity}`
    #[schema(value_type = String, example = r#"[{"id":1,"price":"2.50","quantity":3}]"#)]
    pub cart_data: Text<String>,
    #[schema(value_type = Option<String>)]
    pub notes: Option<Text<String>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub payment_proof: Option<TempFile>,
}

impl CheckoutForm {
    async fn into_request(self) -> AppResult<CheckoutRequest> {
        let cart = CheckoutService::parse_cart(&self.cart_data)?;

        let payment_proof = match self.payment_proof {
            Some(upload) => match upload.file_name.filter(|name| !name.is_empty()) {
                Some(file_name) => Some(PaymentProofUpload {
                    bytes: tokio::fs::read(upload.file.path()).await?,
                    file_name,
                }),
                None => None,
            },
            None => None,
        };

        Ok(CheckoutRequest {
            cart,
            notes: self.notes.map(Text::into_inner),
            payment_proof,
        })
    }
}

#[utoipa::path(
    get,
    path = "/student/dashboard",
    tag = "student",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Logged-in student and the catalog", body = StudentDashboardResponse),
        (status = 303, description = "Not logged in as a student")
    )
)]
pub async fn dashboard(
    principal: Principal,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Student) {
        return Ok(e.error_response());
    }

    match catalog_service.list_products().await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudentDashboardResponse {
                user: principal,
                products,
            },
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/student/orders",
    tag = "student",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Own orders, newest first", body = [OrderWithItems]),
        (status = 303, description = "Not logged in as a student")
    )
)]
pub async fn my_orders(
    principal: Principal,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Student) {
        return Ok(e.error_response());
    }

    match order_service
        .list_orders(OrderScope::Own(principal.user_id))
        .await
    {
        Ok(orders) => Ok(HttpResponse::Ok().json(ApiResponse::success(orders))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/checkout",
    tag = "student",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Catalog to build a cart from", body = [ProductResponse]),
        (status = 303, description = "Not logged in as a student")
    )
)]
pub async fn checkout_page(
    principal: Principal,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Student) {
        return Ok(e.error_response());
    }

    match catalog_service.list_products().await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/checkout",
    tag = "student",
    security(("session_cookie" = [])),
    request_body(content = CheckoutForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Order placed", body = OrderWithItems),
        (status = 400, description = "Invalid cart"),
        (status = 413, description = "Payment proof too large"),
        (status = 500, description = "Order could not be persisted")
    )
)]
pub async fn checkout(
    principal: Principal,
    checkout_service: web::Data<CheckoutService>,
    MultipartForm(form): MultipartForm<CheckoutForm>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Student) {
        return Ok(e.error_response());
    }

    let request = match form.into_request().await {
        Ok(request) => request,
        Err(e) => return Ok(e.error_response()),
    };

    match checkout_service.place_order(&principal, request).await {
        Ok(order) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            order,
            "Order placed successfully!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn student_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/student")
            .route("/dashboard", web::get().to(dashboard))
            .route("/orders", web::get().to(my_orders)),
    )
    .route("/checkout", web::get().to(checkout_page))
    .route("/checkout", web::post().to(checkout));
}
