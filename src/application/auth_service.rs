use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::{
    error::DomainError,
    user::{NewAccount, User},
};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService<R: UserRepository + 'static> {
    repo: Arc<R>,
    keys: JwtKeys,
}

impl<R> AuthService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repo: Arc<R>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    #[instrument(skip(self, account))]
    pub async fn register(&self, account: NewAccount) -> Result<User, DomainError> {
        let hash = hash_password(&account.password)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(account, hash);
        self.repo.create(user).await
    }

    /// Unknown username and wrong password fail identically, so a caller
    /// cannot probe which usernames exist.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !valid {
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))?;
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryUserRepository;

    fn service() -> AuthService<MemoryUserRepository> {
        AuthService::new(
            Arc::new(MemoryUserRepository::new()),
            JwtKeys::new("test-secret".into()),
        )
    }

    fn account(username: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "Ada@Example.com".into(),
            password: "notes on the engine".into(),
        }
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let service = service();
        let user = service.register(account("ada")).await.unwrap();

        assert_ne!(user.password_hash, "notes on the engine");
        assert!(verify_password("notes on the engine", &user.password_hash).unwrap());
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let service = service();
        service.register(account("ada")).await.unwrap();
        let err = service.register(account("ada")).await.unwrap_err();
        assert!(matches!(err, DomainError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn login_returns_token_for_valid_credentials() {
        let service = service();
        let registered = service.register(account("ada")).await.unwrap();

        let (user, token) = service.login("ada", "notes on the engine").await.unwrap();
        assert_eq!(user.id, registered.id);

        let claims = service.keys().verify_token(&token).unwrap();
        assert_eq!(claims.sub, registered.id.to_string());
    }

    #[tokio::test]
    async fn login_failure_is_uniform() {
        let service = service();
        service.register(account("ada")).await.unwrap();

        let wrong_password = service.login("ada", "wrong").await.unwrap_err();
        let unknown_user = service.login("babbage", "wrong").await.unwrap_err();

        assert!(matches!(wrong_password, DomainError::InvalidCredentials));
        assert!(matches!(unknown_user, DomainError::InvalidCredentials));
    }
}
