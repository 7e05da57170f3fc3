use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::product_entity;
use crate::utils::cents_to_decimal;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "2.50")]
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            price: cents_to_decimal(m.price_cents),
            stock: m.stock,
            category: m.category,
            image: m.image,
            created_at: m.created_at,
        }
    }
}

/// Numeric fields arrive as raw form strings and are parsed by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Buku Tulis 80 Muka")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "2.50")]
    pub price: String,
    #[schema(example = "100")]
    pub stock: String,
    #[schema(example = "Alat Tulis")]
    pub category: Option<String>,
    #[schema(example = "📓")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    #[schema(example = "9.99")]
    pub price: String,
    #[schema(example = "5")]
    pub stock: String,
}
