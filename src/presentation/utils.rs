use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::DomainError;
use crate::domain::identity::Identity;
use crate::domain::user::PublicProfile;
use crate::infrastructure::security::JwtKeys;

/// The identity the middleware resolved for this request; anonymous when
/// nothing was resolved. Never fails.
impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = req
            .extensions()
            .get::<Identity>()
            .cloned()
            .unwrap_or(Identity::Anonymous);
        ready(Ok(identity))
    }
}

/// Extractor for handlers that require a signed-in caller; anonymous
/// requests are refused with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub PublicProfile);

impl std::ops::Deref for AuthenticatedUser {
    type Target = PublicProfile;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AuthenticatedUser {
    pub fn identity(&self) -> Identity {
        Identity::User(self.0.clone())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>() {
            Some(Identity::User(profile)) => ready(Ok(AuthenticatedUser(profile.clone()))),
            _ => ready(Err(DomainError::Unauthorized.into())),
        }
    }
}

pub async fn resolve_profile_from_token(
    token: &str,
    keys: &JwtKeys,
    auth_service: &AuthService<PostgresUserRepository>,
) -> Result<PublicProfile, DomainError> {
    let claims = keys
        .verify_token(token)
        .map_err(|_| DomainError::Unauthorized)?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| DomainError::Unauthorized)?;

    let user = auth_service.get_user(user_id).await?;
    Ok(user.profile())
}
