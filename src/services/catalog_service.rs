use crate::entities::{UserRole, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{parse_price, parse_stock};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryOrder, Set,
};

/// Sample stock for a freshly installed store:
/// (name, description, price in cents, stock, category, glyph)
const SAMPLE_PRODUCTS: [(&str, &str, i64, i32, &str, &str); 10] = [
    ("Buku Tulis 80 Muka", "Buku tulis berkualiti", 250, 100, "Alat Tulis", "📓"),
    ("Pen Biru Pilot", "Pen ballpoint biru", 150, 200, "Alat Tulis", "🖊️"),
    ("Pensil 2B", "Pensil 2B untuk peperiksaan", 80, 150, "Alat Tulis", "✏️"),
    ("Pensel Warna 12 Pcs", "Set pensel warna 12 keping", 800, 50, "Alat Tulis", "🎨"),
    ("Pembaris 30cm", "Pembaris plastik 30cm", 120, 80, "Alat Tulis", "📏"),
    ("Pemadam Putih", "Pemadam untuk pensil", 50, 120, "Alat Tulis", "🧹"),
    ("Buku Latihan Matematik", "Buku latihan tingkatan 1-5", 1200, 60, "Buku", "📚"),
    ("Fail Kotak", "Fail kotak untuk dokumen", 350, 40, "Alat Tulis", "📁"),
    ("Beg Sekolah", "Beg sekolah berkualiti tinggi", 4500, 25, "Aksesori", "🎒"),
    ("Botol Air 500ml", "Botol air untuk pelajar", 850, 70, "Aksesori", "💧"),
];

#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// All products ordered by category, then name.
    pub async fn list_products(&self) -> AppResult<Vec<ProductResponse>> {
        let list = products::Entity::find()
            .order_by_asc(products::Column::Category)
            .order_by_asc(products::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create_product(
        &self,
        principal: &Principal,
        request: CreateProductRequest,
    ) -> AppResult<ProductResponse> {
        principal.require(UserRole::Admin)?;

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Product name must not be empty".to_string(),
            ));
        }
        let price_cents = parse_price(&request.price)?;
        let stock = parse_stock(&request.stock)?;

        let created = products::ActiveModel {
            name: Set(name),
            description: Set(non_blank(request.description)),
            price_cents: Set(price_cents),
            stock: Set(stock),
            category: Set(non_blank(request.category)),
            image: Set(non_blank(request.image)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Product {} ({}) added by {}",
            created.id,
            created.name,
            principal.username
        );
        Ok(created.into())
    }

    /// Overwrites price and stock unconditionally; concurrent edits are last-writer-wins.
    pub async fn update_price_and_stock(
        &self,
        principal: &Principal,
        product_id: i64,
        request: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        principal.require(UserRole::Admin)?;

        let price_cents = parse_price(&request.price)?;
        let stock = parse_stock(&request.stock)?;

        let mut model = products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?
            .into_active_model();
        model.price_cents = Set(price_cents);
        model.stock = Set(stock);
        let updated = model.update(&self.pool).await?;

        log::info!(
            "Product {product_id} set to price {price_cents}c, stock {stock} by {}",
            principal.username
        );
        Ok(updated.into())
    }

    pub async fn count_products(&self) -> AppResult<u64> {
        Ok(products::Entity::find().count(&self.pool).await?)
    }

    /// Inserts the sample catalog when no product exists yet. Returns the
    /// number of products inserted.
    pub async fn seed_sample_products(&self) -> AppResult<u64> {
        if self.count_products().await? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let models = SAMPLE_PRODUCTS.iter().map(
            |(name, description, price_cents, stock, category, image)| products::ActiveModel {
                name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                price_cents: Set(*price_cents),
                stock: Set(*stock),
                category: Set(Some(category.to_string())),
                image: Set(Some(image.to_string())),
                created_at: Set(now),
                ..Default::default()
            },
        );
        products::Entity::insert_many(models).exec(&self.pool).await?;

        log::info!("Seeded {} sample products", SAMPLE_PRODUCTS.len());
        Ok(SAMPLE_PRODUCTS.len() as u64)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_product, create_user, setup_test_db};
    use rust_decimal::Decimal;

    fn new_product(price: &str, stock: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: "Gunting".to_string(),
            description: Some("Gunting kertas".to_string()),
            price: price.to_string(),
            stock: stock.to_string(),
            category: Some("Alat Tulis".to_string()),
            image: Some("✂️".to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_products_orders_by_category_then_name() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let admin = create_user(&db, "admin", UserRole::Admin).await;

        for (name, category) in [("Zip Fail", "Buku"), ("Beg", "Aksesori"), ("Atlas", "Buku")] {
            let mut request = new_product("1.00", "1");
            request.name = name.to_string();
            request.category = Some(category.to_string());
            catalog.create_product(&admin, request).await.unwrap();
        }

        let names: Vec<String> = catalog
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Beg", "Atlas", "Zip Fail"]);
    }

    #[tokio::test]
    async fn test_create_product_parses_numeric_fields() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let admin = create_user(&db, "admin", UserRole::Admin).await;

        let product = catalog
            .create_product(&admin, new_product("3.50", "40"))
            .await
            .unwrap();
        assert_eq!(product.price, Decimal::new(350, 2));
        assert_eq!(product.stock, 40);
        assert_eq!(product.category.as_deref(), Some("Alat Tulis"));
    }

    #[tokio::test]
    async fn test_create_product_rejects_unparseable_numbers() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let admin = create_user(&db, "admin", UserRole::Admin).await;

        for (price, stock) in [("abc", "1"), ("1.00", "x"), ("-2", "1"), ("1.00", "-1")] {
            let result = catalog.create_product(&admin, new_product(price, stock)).await;
            assert!(matches!(result, Err(AppError::ValidationError(_))));
        }
        assert_eq!(catalog.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_product_requires_admin() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let student = create_user(&db, "ali", UserRole::Student).await;

        let result = catalog.create_product(&student, new_product("1.00", "1")).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert_eq!(catalog.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_price_and_stock_is_visible_in_listing() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let admin = create_user(&db, "admin", UserRole::Admin).await;
        let product = create_product(&db, "Pen Biru Pilot", 150, 200).await;

        catalog
            .update_price_and_stock(
                &admin,
                product.id,
                UpdateProductRequest {
                    price: "9.99".to_string(),
                    stock: "5".to_string(),
                },
            )
            .await
            .unwrap();

        let listed = catalog.list_products().await.unwrap();
        let updated = listed.iter().find(|p| p.id == product.id).unwrap();
        assert_eq!(updated.price, Decimal::new(999, 2));
        assert_eq!(updated.stock, 5);
    }

    #[tokio::test]
    async fn test_update_unknown_product_is_not_found() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());
        let admin = create_user(&db, "admin", UserRole::Admin).await;

        let result = catalog
            .update_price_and_stock(
                &admin,
                999,
                UpdateProductRequest {
                    price: "1.00".to_string(),
                    stock: "1".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seed_sample_products_only_fills_empty_catalog() {
        let db = setup_test_db().await;
        let catalog = CatalogService::new(db.clone());

        assert_eq!(catalog.seed_sample_products().await.unwrap(), 10);
        assert_eq!(catalog.seed_sample_products().await.unwrap(), 0);
        assert_eq!(catalog.count_products().await.unwrap(), 10);
    }
}
