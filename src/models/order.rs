use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{order_entity, order_item_entity};
use crate::utils::cents_to_decimal;

/// One cart line exactly as the client submitted it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CartLine {
    /// Product id
    pub id: i64,
    #[schema(value_type = String, example = "2.50")]
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PaymentProofUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart: Vec<CartLine>,
    pub notes: Option<String>,
    pub payment_proof: Option<PaymentProofUpload>,
}

/// Which orders a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Own(i64),
    All,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    /// Display name of the ordering student
    pub student_name: Option<String>,
    #[schema(value_type = String, example = "10.50")]
    pub total_amount: Decimal,
    pub status: String,
    pub payment_proof: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn from_model(m: order_entity::Model, student_name: Option<String>) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            student_name,
            total_amount: cents_to_decimal(m.total_cents),
            status: m.status,
            payment_proof: m.payment_proof,
            notes: m.notes,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String, example = "2.50")]
    pub price: Decimal,
    #[schema(value_type = String, example = "7.50")]
    pub subtotal: Decimal,
}

impl OrderItemResponse {
    pub fn from_model(m: order_item_entity::Model, product_name: Option<String>) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            product_name,
            quantity: m.quantity,
            price: cents_to_decimal(m.price_cents),
            subtotal: cents_to_decimal(m.price_cents * i64::from(m.quantity)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[schema(example = "completed")]
    pub status: String,
}
