use crate::entities::{
    STATUS_CANCELLED, STATUS_PENDING, UserRole, order_entity as orders,
    order_item_entity as order_items, product_entity as products, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::cents_to_decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::HashMap;

const MAX_STATUS_LEN: usize = 32;

/// Order listings, status changes and the admin dashboard figures.
#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Orders visible to `scope`, newest first, each with its line items.
    pub async fn list_orders(&self, scope: OrderScope) -> AppResult<Vec<OrderWithItems>> {
        let mut query = orders::Entity::find();
        if let OrderScope::Own(user_id) = scope {
            query = query.filter(orders::Column::UserId.eq(user_id));
        }

        let headers = self.load_headers(query).await?;
        let order_ids: Vec<i64> = headers.iter().map(|o| o.id).collect();
        let mut items_by_order = self.load_items(order_ids).await?;

        Ok(headers
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// The `limit` newest orders without their items.
    pub async fn recent_orders(&self, limit: u64) -> AppResult<Vec<OrderResponse>> {
        self.load_headers(orders::Entity::find().limit(limit)).await
    }

    /// Sets any status on an order, including the one it already has.
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: i64,
        new_status: &str,
    ) -> AppResult<OrderResponse> {
        principal.require(UserRole::Admin)?;

        let status = new_status.trim();
        if status.is_empty() || status.chars().count() > MAX_STATUS_LEN {
            return Err(AppError::ValidationError(format!(
                "Status must be between 1 and {MAX_STATUS_LEN} characters"
            )));
        }

        let (order, owner) = orders::Entity::find_by_id(order_id)
            .find_also_related(users::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;

        let previous = order.status.clone();
        let mut model = order.into_active_model();
        model.status = Set(status.to_string());
        let updated = model.update(&self.pool).await?;

        log::info!(
            "Order {order_id} status {previous} -> {} by {}",
            updated.status,
            principal.username
        );
        Ok(OrderResponse::from_model(
            updated,
            owner.map(|u| u.display_name),
        ))
    }

    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let total_orders = orders::Entity::find().count(&self.pool).await?;
        let pending_orders = orders::Entity::find()
            .filter(orders::Column::Status.eq(STATUS_PENDING))
            .count(&self.pool)
            .await?;
        let total_products = products::Entity::find().count(&self.pool).await?;

        // summed here rather than in SQL: SUM(bigint) decodes differently per backend
        let totals: Vec<i64> = orders::Entity::find()
            .select_only()
            .column(orders::Column::TotalCents)
            .filter(orders::Column::Status.ne(STATUS_CANCELLED))
            .into_tuple()
            .all(&self.pool)
            .await?;
        let total_sales_cents = totals
            .into_iter()
            .try_fold(0i64, i64::checked_add)
            .ok_or_else(|| AppError::InternalError("Sales total overflow".to_string()))?;

        Ok(DashboardStats {
            total_orders,
            total_sales: cents_to_decimal(total_sales_cents),
            pending_orders,
            total_products,
        })
    }

    async fn load_headers(&self, query: Select<orders::Entity>) -> AppResult<Vec<OrderResponse>> {
        let rows = query
            .find_also_related(users::Entity)
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, owner)| OrderResponse::from_model(order, owner.map(|u| u.display_name)))
            .collect())
    }

    /// Items of all given orders in one query, grouped by order id.
    async fn load_items(
        &self,
        order_ids: Vec<i64>,
    ) -> AppResult<HashMap<i64, Vec<OrderItemResponse>>> {
        let mut grouped: HashMap<i64, Vec<OrderItemResponse>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .find_also_related(products::Entity)
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?;

        for (item, product) in rows {
            grouped
                .entry(item.order_id)
                .or_default()
                .push(OrderItemResponse::from_model(item, product.map(|p| p.name)));
        }
        Ok(grouped)
    }
}
