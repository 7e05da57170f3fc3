use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{OrderResponse, Principal, ProductResponse};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: u64,
    /// Sum of all non-cancelled order totals
    #[schema(value_type = String, example = "123.40")]
    pub total_sales: Decimal,
    pub pending_orders: u64,
    pub total_products: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub stats: DashboardStats,
    pub recent_orders: Vec<OrderResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDashboardResponse {
    pub user: Principal,
    pub products: Vec<ProductResponse>,
}
