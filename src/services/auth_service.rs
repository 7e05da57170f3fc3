use crate::config::SeedConfig;
use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{DEFAULT_COST, hash_password, validate_password, verify_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

const MAX_USERNAME_LEN: usize = 64;
const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Credential store: account registration and password login.
#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Creates a `student` account. Usernames match case-sensitively.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<i64> {
        let username = request.username;
        let display_name = request.name.trim().to_string();

        if username.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if display_name.is_empty() || display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(AppError::ValidationError(
                "Name must be between 1 and 255 characters".to_string(),
            ));
        }
        validate_password(&request.password)?;

        if self.find_by_username(&username).await?.is_some() {
            log::warn!("Registration rejected, username {username:?} already exists");
            return Err(AppError::DuplicateUsername);
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let created = self
            .insert_user(&username, &password_hash, &display_name, UserRole::Student)
            .await?;

        log::info!("Registered student {} (id {})", created.username, created.id);
        Ok(created.id)
    }

    /// Verifies a username/password pair. Unknown users and wrong passwords
    /// produce the same `AuthFailure`.
    pub async fn authenticate(&self, request: LoginRequest) -> AppResult<Principal> {
        let user = self
            .find_by_username(&request.username)
            .await?
            .ok_or(AppError::AuthFailure)?;

        // an unparseable stored hash counts as a mismatch
        let matches = verify_password(&request.password, &user.password_hash).unwrap_or_else(|e| {
            log::error!("Stored password hash of user {} is unusable: {e}", user.id);
            false
        });
        if !matches {
            return Err(AppError::AuthFailure);
        }

        log::info!("User {} logged in as {}", user.username, user.role);
        Ok(Principal::from(user))
    }

    /// Creates the configured administrator when that username is free.
    /// Returns whether an account was created.
    pub async fn ensure_default_admin(&self, seed: &SeedConfig) -> AppResult<bool> {
        if self.find_by_username(&seed.admin_username).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(&seed.admin_password, self.bcrypt_cost)?;
        let admin = self
            .insert_user(
                &seed.admin_username,
                &password_hash,
                &seed.admin_name,
                UserRole::Admin,
            )
            .await?;

        log::info!("Seeded default administrator {}", admin.username);
        Ok(true)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
        role: UserRole,
    ) -> AppResult<users::Model> {
        let result = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            display_name: Set(display_name.to_string()),
            role: Set(role),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match result {
            Ok(model) => Ok(model),
            // lost a race against a concurrent registration
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AppError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }
}
