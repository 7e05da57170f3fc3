use crate::entities::{UserRole, user_entity};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated caller attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
}

impl Principal {
    /// Fails with `Unauthorized` unless the principal holds `role`.
    pub fn require(&self, role: UserRole) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

impl From<user_entity::Model> for Principal {
    fn from(m: user_entity::Model) -> Self {
        Self {
            user_id: m.id,
            username: m.username,
            display_name: m.display_name,
            role: m.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
    /// Where the client should go next
    pub redirect: String,
}

impl SessionStatus {
    pub fn from_principal(principal: Option<Principal>) -> Self {
        let redirect = principal
            .as_ref()
            .map(|p| p.role.dashboard_path())
            .unwrap_or("/login")
            .to_string();
        Self {
            authenticated: principal.is_some(),
            user: principal,
            redirect,
        }
    }
}
