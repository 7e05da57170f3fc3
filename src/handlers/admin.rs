use crate::entities::UserRole;
use crate::external::ProofStorage;
use crate::models::*;
use crate::services::{CatalogService, OrderService};
use super::FormOrJson;
use actix_web::{HttpResponse, Result, ResponseError, web};

const RECENT_ORDERS: u64 = 10;

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Store figures and the 10 newest orders", body = AdminDashboardResponse),
        (status = 303, description = "Not logged in as an administrator")
    )
)]
pub async fn dashboard(
    principal: Principal,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Admin) {
        return Ok(e.error_response());
    }

    let stats = match order_service.dashboard_stats().await {
        Ok(stats) => stats,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.recent_orders(RECENT_ORDERS).await {
        Ok(recent_orders) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AdminDashboardResponse {
                stats,
                recent_orders,
            },
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/products",
    tag = "admin",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Whole catalog", body = [ProductResponse]),
        (status = 303, description = "Not logged in as an administrator")
    )
)]
pub async fn products(
    principal: Principal,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Admin) {
        return Ok(e.error_response());
    }

    match catalog_service.list_products().await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "All orders with items, newest first", body = [OrderWithItems]),
        (status = 303, description = "Not logged in as an administrator")
    )
)]
pub async fn orders(
    principal: Principal,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Admin) {
        return Ok(e.error_response());
    }

    match order_service.list_orders(OrderScope::All).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(ApiResponse::success(orders))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/update_order_status/{order_id}",
    tag = "admin",
    security(("session_cookie" = [])),
    params(("order_id" = i64, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Unknown order")
    )
)]
pub async fn update_order_status(
    principal: Principal,
    order_service: web::Data<OrderService>,
    path: web::Path<i64>,
    request: FormOrJson<UpdateOrderStatusRequest>,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();
    let request = request.into_inner();

    match order_service
        .update_status(&principal, order_id, &request.status)
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            order,
            "Order status updated!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/add_product",
    tag = "admin",
    security(("session_cookie" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product added", body = ProductResponse),
        (status = 400, description = "Invalid product fields")
    )
)]
pub async fn add_product(
    principal: Principal,
    catalog_service: web::Data<CatalogService>,
    request: FormOrJson<CreateProductRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .create_product(&principal, request.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            product,
            "Product added!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/update_product/{product_id}",
    tag = "admin",
    security(("session_cookie" = [])),
    params(("product_id" = i64, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Price and stock overwritten", body = ProductResponse),
        (status = 400, description = "Invalid price or stock"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn update_product(
    principal: Principal,
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: FormOrJson<UpdateProductRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .update_price_and_stock(&principal, path.into_inner(), request.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            product,
            "Product updated!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/payment_proofs/{reference}",
    tag = "admin",
    security(("session_cookie" = [])),
    params(("reference" = String, Path, description = "Stored proof reference from the order")),
    responses(
        (status = 200, description = "Raw uploaded file"),
        (status = 404, description = "No such proof")
    )
)]
pub async fn payment_proof(
    principal: Principal,
    proof_storage: web::Data<ProofStorage>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    if let Err(e) = principal.require(UserRole::Admin) {
        return Ok(e.error_response());
    }

    let reference = path.into_inner();
    match proof_storage.read(&reference).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&reference))
            .body(bytes)),
        Err(e) => Ok(e.error_response()),
    }
}

fn content_type_for(reference: &str) -> &'static str {
    let extension = reference
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/dashboard", web::get().to(dashboard))
            .route("/products", web::get().to(products))
            .route("/orders", web::get().to(orders))
            .route("/update_order_status/{order_id}", web::post().to(update_order_status))
            .route("/add_product", web::post().to(add_product))
            .route("/update_product/{product_id}", web::post().to(update_product))
            .route("/payment_proofs/{reference}", web::get().to(payment_proof)),
    );
}
