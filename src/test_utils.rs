//! Shared fixtures for the in-crate test modules.

use crate::entities::{UserRole, product_entity as products, user_entity as users};
use crate::models::Principal;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

/// Fresh in-memory SQLite database with the schema applied.
///
/// A single pooled connection keeps the in-memory database alive and shared
/// for the lifetime of the returned handle.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Inserts a user directly, bypassing bcrypt, and returns its principal.
pub async fn create_user(db: &DatabaseConnection, username: &str, role: UserRole) -> Principal {
    let model = users::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("!".to_string()),
        display_name: Set(format!("{username} (test)")),
        role: Set(role),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user");

    Principal::from(model)
}

pub async fn create_product(
    db: &DatabaseConnection,
    name: &str,
    price_cents: i64,
    stock: i32,
) -> products::Model {
    products::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        price_cents: Set(price_cents),
        stock: Set(stock),
        category: Set(Some("Alat Tulis".to_string())),
        image: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test product")
}

pub fn temp_upload_config() -> crate::config::UploadConfig {
    let dir = std::env::temp_dir().join(format!("koperasi-test-uploads-{}", uuid::Uuid::new_v4()));
    crate::config::UploadConfig {
        dir: dir.to_string_lossy().into_owned(),
        max_bytes: 5 * 1024 * 1024,
    }
}
