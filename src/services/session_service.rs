use crate::error::AppResult;
use crate::models::Principal;
use crate::utils::JwtService;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SessionEntry {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Server-side session registry.
///
/// Tokens are signed JWTs carrying a random session id; a token only resolves
/// while its id is still registered here, so logging out kills it immediately.
#[derive(Clone)]
pub struct SessionService {
    jwt_service: JwtService,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionService {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn expires_in(&self) -> i64 {
        self.jwt_service.get_expires_in()
    }

    /// Starts a session for `principal` and returns its token.
    pub fn open(&self, principal: Principal) -> AppResult<String> {
        let session_id = Uuid::new_v4().to_string();
        let token =
            self.jwt_service
                .generate_session_token(principal.user_id, &session_id, principal.role)?;

        let now = Utc::now();
        let entry = SessionEntry {
            expires_at: now + Duration::seconds(self.expires_in()),
            principal,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, e| e.expires_at > now);
        sessions.insert(session_id, entry);
        Ok(token)
    }

    /// Returns the principal behind a live token.
    pub fn resolve(&self, token: &str) -> Option<Principal> {
        let claims = self.jwt_service.verify_session_token(token).ok()?;
        let user_id = claims.user_id().ok()?;

        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(&claims.sid)?;
        if entry.expires_at <= Utc::now() || entry.principal.user_id != user_id {
            return None;
        }
        Some(entry.principal.clone())
    }

    /// Ends the session behind `token`. Returns whether a live session was removed.
    pub fn close(&self, token: &str) -> bool {
        let Ok(claims) = self.jwt_service.verify_session_token(token) else {
            return false;
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.remove(&claims.sid) {
            Some(entry) => {
                log::info!("User {} logged out", entry.principal.username);
                true
            }
            None => false,
        }
    }

    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;

    fn principal(user_id: i64, role: UserRole) -> Principal {
        Principal {
            user_id,
            username: format!("user{user_id}"),
            display_name: format!("User {user_id}"),
            role,
        }
    }

    fn service() -> SessionService {
        SessionService::new(JwtService::new("test-secret", 3600))
    }

    #[test]
    fn test_open_then_resolve() {
        let sessions = service();
        let token = sessions.open(principal(3, UserRole::Student)).unwrap();

        let resolved = sessions.resolve(&token).unwrap();
        assert_eq!(resolved, principal(3, UserRole::Student));
        assert_eq!(sessions.active_sessions(), 1);
    }

    #[test]
    fn test_close_invalidates_token() {
        let sessions = service();
        let token = sessions.open(principal(3, UserRole::Admin)).unwrap();

        assert!(sessions.close(&token));
        assert!(sessions.resolve(&token).is_none());
        assert!(!sessions.close(&token));
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[test]
    fn test_garbage_token_does_not_resolve() {
        let sessions = service();
        assert!(sessions.resolve("not-a-token").is_none());
        assert!(!sessions.close("not-a-token"));
    }

    #[test]
    fn test_validly_signed_token_without_registry_entry_is_rejected() {
        let issuer = service();
        let other = service();
        let token = issuer.open(principal(1, UserRole::Admin)).unwrap();
        assert!(other.resolve(&token).is_none());
    }

    #[test]
    fn test_sessions_are_independent() {
        let sessions = service();
        let first = sessions.open(principal(1, UserRole::Student)).unwrap();
        let second = sessions.open(principal(2, UserRole::Student)).unwrap();

        sessions.close(&first);
        assert!(sessions.resolve(&first).is_none());
        assert_eq!(sessions.resolve(&second).unwrap().user_id, 2);
    }

    #[test]
    fn test_expired_session_does_not_resolve() {
        let sessions = SessionService::new(JwtService::new("test-secret", -120));
        let token = sessions.open(principal(1, UserRole::Student)).unwrap();
        assert!(sessions.resolve(&token).is_none());
        assert_eq!(sessions.active_sessions(), 0);
    }
}
