use actix_web::{HttpResponse, post, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::{SESSION_TTL_SECS, clear_session_cookie, session_cookie};
use crate::presentation::dto::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest};
use crate::presentation::forms::{LoginForm, SignupForm, validate_login, validate_signup};
use crate::presentation::utils::AuthenticatedUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup).service(login).service(logout);
}

#[post("/signup")]
async fn signup(
    service: web::Data<AuthService<PostgresUserRepository>>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = SignupForm {
        username: payload.username.clone(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        email: payload.email.clone(),
        password: payload.password.clone(),
        repassword: payload.repassword.clone(),
    };
    validate_signup(&form).map_err(DomainError::Validation)?;

    let user = service.register(form.into_account()).await?;

    info!(user_id = %user.id, username = %user.username, "user registered");

    Ok(HttpResponse::Created().json(user.profile()))
}

#[post("/login")]
async fn login(
    service: web::Data<AuthService<PostgresUserRepository>>,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = LoginForm {
        username: payload.username.clone(),
        password: payload.password.clone(),
    };
    validate_login(&form).map_err(DomainError::Validation)?;

    let (user, token) = service.login(form.username.trim(), &form.password).await?;

    info!(username = %user.username, "user logged in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token.clone(), config.cookie_secure))
        .json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: SESSION_TTL_SECS,
        }))
}

#[post("/logout")]
async fn logout(user: AuthenticatedUser) -> Result<HttpResponse, DomainError> {
    info!(username = %user.username, "user logged out");

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie())
        .json(MessageResponse {
            detail: "logged out".to_string(),
        }))
}
