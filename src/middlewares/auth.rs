use crate::entities::UserRole;
use crate::error::AppError;
use crate::models::Principal;
use crate::services::SessionService;
use actix_web::http::{Method, header};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// role-protected areas
struct ProtectedPaths {
    exact_paths: Vec<(&'static str, UserRole)>,
    prefix_paths: Vec<(&'static str, UserRole)>,
}

impl ProtectedPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![("/checkout", UserRole::Student)],
            prefix_paths: vec![("/student/", UserRole::Student), ("/admin/", UserRole::Admin)],
        }
    }

    /// Role required for `path`, if any.
    fn required_role(&self, path: &str) -> Option<UserRole> {
        self.exact_paths
            .iter()
            .find(|(p, _)| *p == path)
            .or_else(|| self.prefix_paths.iter().find(|(p, _)| path.starts_with(p)))
            .map(|(_, role)| *role)
    }
}

/// Resolves the session of every request and gates the role-protected areas.
///
/// The resolved [`Principal`] is stored in the request extensions. Requests
/// to a protected area without the matching role never reach the handler.
pub struct AuthMiddleware {
    session_service: SessionService,
    cookie_name: String,
}

impl AuthMiddleware {
    pub fn new(session_service: SessionService, cookie_name: impl Into<String>) -> Self {
        Self {
            session_service,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            session_service: self.session_service.clone(),
            cookie_name: self.cookie_name.clone(),
            protected_paths: ProtectedPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    session_service: SessionService,
    cookie_name: String,
    protected_paths: ProtectedPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let principal = session_token(req.request(), &self.cookie_name)
            .and_then(|token| self.session_service.resolve(&token));

        // percent-decoded, as the router sees it
        let path = req.match_info().path();
        if let Some(required) = self.protected_paths.required_role(path) {
            let allowed = principal.as_ref().is_some_and(|p| p.role == required);
            if !allowed {
                log::warn!(
                    "Blocked {} {} for {}",
                    req.method(),
                    path,
                    principal
                        .as_ref()
                        .map(|p| p.username.as_str())
                        .unwrap_or("anonymous")
                );
                return Box::pin(async { Err(AppError::Unauthorized.into()) });
            }
        }

        if let Some(principal) = principal {
            req.extensions_mut().insert(principal);
        }
        Box::pin(self.service.call(req))
    }
}

/// Session token from the session cookie, or else from an `Authorization: Bearer` header.
pub fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AppError::Unauthorized),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::JwtService;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse, web};

    const COOKIE: &str = "koperasi_session";

    fn principal(role: UserRole) -> Principal {
        Principal {
            user_id: 1,
            username: "ali".to_string(),
            display_name: "Ali".to_string(),
            role,
        }
    }

    async fn whoami(principal: Option<Principal>) -> HttpResponse {
        match principal {
            Some(p) => HttpResponse::Ok().body(p.username),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    macro_rules! gated_app {
        ($sessions:expr) => {
            actix_test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($sessions.clone(), COOKIE))
                    .route("/login", web::get().to(whoami))
                    .route("/checkout", web::get().to(whoami))
                    .route("/student/dashboard", web::get().to(whoami))
                    .route("/student/orders", web::get().to(whoami))
                    .route("/admin/dashboard", web::get().to(whoami))
                    .route("/admin/orders", web::get().to(whoami)),
            )
            .await
        };
    }

    #[test]
    fn test_required_role() {
        let paths = ProtectedPaths::new();
        assert_eq!(paths.required_role("/checkout"), Some(UserRole::Student));
        assert_eq!(paths.required_role("/student/orders"), Some(UserRole::Student));
        assert_eq!(paths.required_role("/admin/update_product/3"), Some(UserRole::Admin));
        assert_eq!(paths.required_role("/login"), None);
        assert_eq!(paths.required_role("/administrator"), None);
    }

    #[actix_web::test]
    async fn test_anonymous_is_redirected_to_login() {
        let sessions = SessionService::new(JwtService::new("secret", 3600));
        let app = gated_app!(sessions);

        let req = actix_test::TestRequest::get().uri("/student/dashboard").to_request();
        let resp = app.call(req).await.err().expect("gate should reject").error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[actix_web::test]
    async fn test_student_cannot_reach_admin_area() {
        let sessions = SessionService::new(JwtService::new("secret", 3600));
        let token = sessions.open(principal(UserRole::Student)).unwrap();
        let app = gated_app!(sessions);

        let req = actix_test::TestRequest::get()
            .uri("/admin/dashboard")
            .cookie(Cookie::new(COOKIE, token.clone()))
            .to_request();
        let resp = app.call(req).await.err().expect("gate should reject").error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let req = actix_test::TestRequest::get()
            .uri("/checkout")
            .cookie(Cookie::new(COOKIE, token))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ali");
    }

    #[actix_web::test]
    async fn test_bearer_token_and_logout() {
        let sessions = SessionService::new(JwtService::new("secret", 3600));
        let token = sessions.open(principal(UserRole::Admin)).unwrap();
        let app = gated_app!(sessions);

        let req = actix_test::TestRequest::get()
            .uri("/admin/dashboard")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

        sessions.close(&token);
        let req = actix_test::TestRequest::get()
            .uri("/admin/dashboard")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        assert!(app.call(req).await.is_err());
    }

    #[actix_web::test]
    async fn test_public_paths_see_optional_principal() {
        let sessions = SessionService::new(JwtService::new("secret", 3600));
        let app = gated_app!(sessions);

        let req = actix_test::TestRequest::get().uri("/login").to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "anonymous");
    }

    #[actix_web::test]
    async fn test_percent_encoded_paths_are_gated() {
        let sessions = SessionService::new(JwtService::new("secret", 3600));
        let token = sessions.open(principal(UserRole::Student)).unwrap();
        let app = gated_app!(sessions);

        for uri in ["/%61dmin/orders", "/%73tudent/orders", "/%63heckout"] {
            let req = actix_test::TestRequest::get().uri(uri).to_request();
            let resp = app.call(req).await.err().expect("gate should reject").error_response();
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
        }

        let req = actix_test::TestRequest::get()
            .uri("/%61dmin/dashboard")
            .cookie(Cookie::new(COOKIE, token.clone()))
            .to_request();
        assert!(app.call(req).await.is_err());

        let req = actix_test::TestRequest::get()
            .uri("/%73tudent/orders")
            .cookie(Cookie::new(COOKIE, token))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "ali");
    }
}
