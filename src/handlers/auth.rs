use crate::config::SessionConfig;
use crate::middlewares::session_token;
use crate::models::*;
use crate::services::{AuthService, SessionService};
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::header;
use super::FormOrJson;
use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};

fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(config.expires_in))
        .finish()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "auth",
    responses(
        (status = 302, description = "Redirect to the role dashboard, or to /login")
    )
)]
pub async fn index(principal: Option<Principal>) -> HttpResponse {
    let target = principal
        .map(|p| p.role.dashboard_path())
        .unwrap_or("/login");
    HttpResponse::Found()
        .insert_header((header::LOCATION, target))
        .finish()
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses(
        (status = 200, description = "Current session status", body = SessionStatus)
    )
)]
pub async fn login_page(principal: Option<Principal>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(SessionStatus::from_principal(principal)))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = LoginResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    session_config: web::Data<SessionConfig>,
    request: FormOrJson<LoginRequest>,
) -> Result<HttpResponse> {
    let principal = match auth_service.authenticate(request.into_inner()).await {
        Ok(principal) => principal,
        Err(e) => return Ok(e.error_response()),
    };

    let token = match session_service.open(principal.clone()) {
        Ok(token) => token,
        Err(e) => return Ok(e.error_response()),
    };

    let message = format!("Welcome, {}!", principal.display_name);
    let response = LoginResponse {
        redirect: principal.role.dashboard_path().to_string(),
        user: principal,
        token: token.clone(),
        expires_in: session_service.expires_in(),
    };

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session_config, token))
        .json(ApiResponse::success_with_message(response, message)))
}

#[utoipa::path(
    get,
    path = "/register",
    tag = "auth",
    responses(
        (status = 200, description = "Current session status", body = SessionStatus)
    )
)]
pub async fn register_page(principal: Option<Principal>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(SessionStatus::from_principal(principal)))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student account created", body = RegisterResponse),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: FormOrJson<RegisterRequest>,
) -> Result<HttpResponse> {
    match auth_service.register(request.into_inner()).await {
        Ok(user_id) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            RegisterResponse { user_id },
            "Registration successful, please log in",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 302, description = "Session destroyed, redirect to /login")
    )
)]
pub async fn logout(
    req: HttpRequest,
    session_service: web::Data<SessionService>,
    session_config: web::Data<SessionConfig>,
) -> HttpResponse {
    if let Some(token) = session_token(&req, &session_config.cookie_name) {
        session_service.close(&token);
    }

    let mut removal = session_cookie(&session_config, String::new());
    removal.make_removal();
    HttpResponse::Found()
        .cookie(removal)
        .insert_header((header::LOCATION, "/login"))
        .finish()
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/login", web::get().to(login_page))
        .route("/login", web::post().to(login))
        .route("/register", web::get().to(register_page))
        .route("/register", web::post().to(register))
        .route("/logout", web::get().to(logout));
}
