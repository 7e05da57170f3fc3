use crate::config::CheckoutConfig;
use crate::entities::{
    STATUS_PENDING, UserRole, order_entity as orders, order_item_entity as order_items,
    product_entity as products,
};
use crate::error::{AppError, AppResult};
use crate::external::ProofStorage;
use crate::models::*;
use crate::utils::decimal_to_cents;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::collections::HashMap;

/// A cart line after validation, carrying the unit price that will be charged.
#[derive(Debug, Clone)]
struct PricedLine {
    product_id: i64,
    product_name: String,
    quantity: i32,
    unit_price_cents: i64,
}

/// Order engine: turns a submitted cart into a persisted order.
#[derive(Clone)]
pub struct CheckoutService {
    pool: DatabaseConnection,
    proof_storage: ProofStorage,
    settings: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(
        pool: DatabaseConnection,
        proof_storage: ProofStorage,
        settings: CheckoutConfig,
    ) -> Self {
        Self {
            pool,
            proof_storage,
            settings,
        }
    }

    /// Parses the `cart_data` form field.
    pub fn parse_cart(raw: &str) -> AppResult<Vec<CartLine>> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::ValidationError(format!("Invalid cart data: {e}")))
    }

    /// Places an order for the calling student.
    ///
    /// The cart is fully validated before anything is written. The payment
    /// proof is stored ahead of the transaction; the order, its items and the
    /// stock decrements commit or roll back together.
    pub async fn place_order(
        &self,
        principal: &Principal,
        request: CheckoutRequest,
    ) -> AppResult<OrderWithItems> {
        principal.require(UserRole::Student)?;

        let lines = self.price_cart(&request.cart).await?;
        let total_cents = lines.iter().try_fold(0i64, |acc, line| {
            line.unit_price_cents
                .checked_mul(i64::from(line.quantity))
                .and_then(|subtotal| acc.checked_add(subtotal))
                .ok_or_else(|| AppError::ValidationError("Order total is out of range".to_string()))
        })?;

        let payment_proof = match request.payment_proof {
            Some(upload) if !upload.file_name.is_empty() => Some(
                self.proof_storage
                    .save(principal.user_id, &upload.file_name, &upload.bytes)
                    .await?,
            ),
            _ => None,
        };
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let txn = self.pool.begin().await.map_err(order_failed)?;
        let persisted = self
            .persist_order(&txn, principal.user_id, total_cents, payment_proof, notes, &lines)
            .await;

        let (order, items) = match persisted {
            Ok(created) => created,
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    log::error!("Rollback after failed checkout also failed: {rollback_err}");
                }
                return Err(match e {
                    AppError::DatabaseError(db_err) => order_failed(db_err),
                    other => other,
                });
            }
        };
        txn.commit().await.map_err(order_failed)?;

        log::info!(
            "Order {} placed by {} ({} lines, total {}c)",
            order.id,
            principal.username,
            items.len(),
            order.total_cents
        );

        let items = items
            .into_iter()
            .zip(lines)
            .map(|(item, line)| OrderItemResponse::from_model(item, Some(line.product_name)))
            .collect();
        Ok(OrderWithItems {
            order: OrderResponse::from_model(order, Some(principal.display_name.clone())),
            items,
        })
    }

    /// Validates every line and resolves the unit price to charge.
    async fn price_cart(&self, cart: &[CartLine]) -> AppResult<Vec<PricedLine>> {
        if cart.is_empty() {
            return Err(AppError::ValidationError("Cart is empty".to_string()));
        }

        let mut ids: Vec<i64> = cart.iter().map(|line| line.id).collect();
        ids.sort_unstable();
        ids.dedup();
        let catalog: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        cart.iter()
            .map(|line| {
                if line.quantity < 1 {
                    return Err(AppError::ValidationError(format!(
                        "Quantity for product {} must be at least 1",
                        line.id
                    )));
                }
                let client_price_cents = decimal_to_cents(line.price)?;
                let product = catalog.get(&line.id).ok_or_else(|| {
                    AppError::ValidationError(format!("Product {} does not exist", line.id))
                })?;

                let unit_price_cents = if self.settings.trust_client_prices {
                    client_price_cents
                } else {
                    if client_price_cents != product.price_cents {
                        log::warn!(
                            "Cart price {}c for product {} differs from catalog price {}c, using catalog price",
                            client_price_cents,
                            product.id,
                            product.price_cents
                        );
                    }
                    product.price_cents
                };

                Ok(PricedLine {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price_cents,
                })
            })
            .collect()
    }

    async fn persist_order(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        total_cents: i64,
        payment_proof: Option<String>,
        notes: Option<String>,
        lines: &[PricedLine],
    ) -> AppResult<(orders::Model, Vec<order_items::Model>)> {
        let order = orders::ActiveModel {
            user_id: Set(user_id),
            total_cents: Set(total_cents),
            status: Set(STATUS_PENDING.to_string()),
            payment_proof: Set(payment_proof),
            notes: Set(notes),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = order_items::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price_cents: Set(line.unit_price_cents),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            items.push(item);

            let mut decrement = products::Entity::update_many()
                .col_expr(
                    products::Column::Stock,
                    Expr::col(products::Column::Stock).sub(line.quantity),
                )
                .filter(products::Column::Id.eq(line.product_id));
            if !self.settings.allow_oversell {
                decrement = decrement.filter(products::Column::Stock.gte(line.quantity));
            }

            let result = decrement.exec(txn).await?;
            if result.rows_affected != 1 {
                return Err(AppError::ValidationError(format!(
                    "Not enough stock for {}",
                    line.product_name
                )));
            }
        }

        Ok((order, items))
    }
}

fn order_failed(err: sea_orm::DbErr) -> AppError {
    AppError::OrderCreationFailed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_product, create_user, setup_test_db, temp_upload_config};
    use rust_decimal::Decimal;
    use sea_orm::PaginatorTrait;

    fn service(db: &DatabaseConnection, settings: CheckoutConfig) -> CheckoutService {
        CheckoutService::new(
            db.clone(),
            ProofStorage::new(&temp_upload_config()),
            settings,
        )
    }

    fn line(id: i64, price_cents: i64, quantity: i32) -> CartLine {
        CartLine {
            id,
            price: Decimal::new(price_cents, 2),
            quantity,
        }
    }

    fn request(cart: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            cart,
            notes: None,
            payment_proof: None,
        }
    }

    async fn stock_of(db: &DatabaseConnection, id: i64) -> i32 {
        products::Entity::find_by_id(id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    async fn order_count(db: &DatabaseConnection) -> u64 {
        orders::Entity::find().count(db).await.unwrap()
    }

    #[test]
    fn test_parse_cart_accepts_numbers_and_strings() {
        let cart =
            CheckoutService::parse_cart(r#"[{"id":1,"price":2.5,"quantity":3},{"id":2,"price":"1.50","quantity":2}]"#)
                .unwrap();
        assert_eq!(cart, vec![line(1, 250, 3), line(2, 150, 2)]);
    }

    #[test]
    fn test_parse_cart_rejects_malformed_json() {
        let result = CheckoutService::parse_cart("not json");
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_place_order_computes_total_and_decrements_stock() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let book = create_product(&db, "Buku Tulis 80 Muka", 250, 100).await;
        let pen = create_product(&db, "Pen Biru Pilot", 150, 200).await;

        let placed = service(&db, CheckoutConfig::default())
            .place_order(&student, request(vec![line(book.id, 250, 3), line(pen.id, 150, 2)]))
            .await
            .unwrap();

        assert_eq!(placed.order.total_amount, Decimal::new(1050, 2));
        assert_eq!(placed.order.status, STATUS_PENDING);
        assert_eq!(placed.order.user_id, student.user_id);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].product_name.as_deref(), Some("Buku Tulis 80 Muka"));
        assert_eq!(placed.items[0].subtotal, Decimal::new(750, 2));
        assert_eq!(stock_of(&db, book.id).await, 97);
        assert_eq!(stock_of(&db, pen.id).await, 198);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;

        let result = service(&db, CheckoutConfig::default())
            .place_order(&student, request(vec![]))
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_lines_leave_no_trace() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let book = create_product(&db, "Buku", 250, 10).await;
        let checkout = service(&db, CheckoutConfig::default());

        for cart in [
            vec![line(book.id, 250, 1), line(9999, 100, 1)],
            vec![line(book.id, 250, 0)],
            vec![line(book.id, -250, 1)],
        ] {
            let result = checkout.place_order(&student, request(cart)).await;
            assert!(matches!(result, Err(AppError::ValidationError(_))));
        }

        assert_eq!(order_count(&db).await, 0);
        assert_eq!(stock_of(&db, book.id).await, 10);
    }

    #[tokio::test]
    async fn test_admin_cannot_check_out() {
        let db = setup_test_db().await;
        let admin = create_user(&db, "admin", UserRole::Admin).await;
        let book = create_product(&db, "Buku", 250, 10).await;

        let result = service(&db, CheckoutConfig::default())
            .place_order(&admin, request(vec![line(book.id, 250, 1)]))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_catalog_price_wins_over_client_price() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let bag = create_product(&db, "Beg Sekolah", 4500, 25).await;

        let placed = service(&db, CheckoutConfig::default())
            .place_order(&student, request(vec![line(bag.id, 1, 2)]))
            .await
            .unwrap();
        assert_eq!(placed.order.total_amount, Decimal::new(9000, 2));
        assert_eq!(placed.items[0].price, Decimal::new(4500, 2));
    }

    #[tokio::test]
    async fn test_trusted_client_price_is_used_verbatim() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let bag = create_product(&db, "Beg Sekolah", 4500, 25).await;
        let settings = CheckoutConfig {
            trust_client_prices: true,
            ..CheckoutConfig::default()
        };

        let placed = service(&db, settings)
            .place_order(&student, request(vec![line(bag.id, 1, 2)]))
            .await
            .unwrap();
        assert_eq!(placed.order.total_amount, Decimal::new(2, 2));
    }

    #[tokio::test]
    async fn test_oversell_is_allowed_by_default() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let bag = create_product(&db, "Beg Sekolah", 4500, 1).await;

        service(&db, CheckoutConfig::default())
            .place_order(&student, request(vec![line(bag.id, 4500, 3)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, bag.id).await, -2);
    }

    #[tokio::test]
    async fn test_strict_stock_rolls_back_whole_order() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let book = create_product(&db, "Buku", 250, 10).await;
        let bag = create_product(&db, "Beg Sekolah", 4500, 1).await;
        let settings = CheckoutConfig {
            allow_oversell: false,
            ..CheckoutConfig::default()
        };

        let result = service(&db, settings)
            .place_order(&student, request(vec![line(book.id, 250, 2), line(bag.id, 4500, 3)]))
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(order_count(&db).await, 0);
        assert_eq!(order_items::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(stock_of(&db, book.id).await, 10);
        assert_eq!(stock_of(&db, bag.id).await, 1);
    }

    #[tokio::test]
    async fn test_payment_proof_and_notes_are_recorded() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let book = create_product(&db, "Buku", 250, 10).await;
        let checkout = service(&db, CheckoutConfig::default());

        let placed = checkout
            .place_order(
                &student,
                CheckoutRequest {
                    cart: vec![line(book.id, 250, 1)],
                    notes: Some("  ambil waktu rehat ".to_string()),
                    payment_proof: Some(PaymentProofUpload {
                        file_name: "resit.jpg".to_string(),
                        bytes: b"jpeg".to_vec(),
                    }),
                },
            )
            .await
            .unwrap();

        let reference = placed.order.payment_proof.unwrap();
        assert!(reference.starts_with(&format!("{}_", student.user_id)));
        assert!(reference.ends_with("_resit.jpg"));
        assert_eq!(checkout.proof_storage.read(&reference).await.unwrap(), b"jpeg");
        assert_eq!(placed.order.notes.as_deref(), Some("ambil waktu rehat"));
    }

    #[tokio::test]
    async fn test_empty_upload_name_means_no_proof() {
        let db = setup_test_db().await;
        let student = create_user(&db, "ali", UserRole::Student).await;
        let book = create_product(&db, "Buku", 250, 10).await;

        let placed = service(&db, CheckoutConfig::default())
            .place_order(
                &student,
                CheckoutRequest {
                    cart: vec![line(book.id, 250, 1)],
                    notes: None,
                    payment_proof: Some(PaymentProofUpload {
                        file_name: String::new(),
                        bytes: Vec::new(),
                    }),
                },
            )
            .await
            .unwrap();
        assert!(placed.order.payment_proof.is_none());
    }
}
