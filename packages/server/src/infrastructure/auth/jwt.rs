//! HS256 bearer token identity provider.
//!
//! Tokens carry the user id in `sub`; the user itself is resolved against the
//! catalog's user directory so that a token for a removed user is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AuthError, Catalog, IdentityProvider, User, UserId};

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username at issue time
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
    catalog: Arc<dyn Catalog>,
}

impl std::fmt::Debug for JwtIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityProvider")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, token_ttl_secs: i64, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
            catalog,
        }
    }

    /// Issue a token for `user`, valid for the configured lifetime.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.issue_token_with_ttl(user, self.token_ttl_secs)
    }

    fn issue_token_with_ttl(&self, user: &User, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = self.validate(token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))?;

        let user = self
            .catalog
            .find_user(user_id)
            .await
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .ok_or(AuthError::UnknownUser(user_id))?;
        debug!(user_id = %user.id, "token accepted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockCatalog, RepositoryError, Username};

    fn alice() -> User {
        User::new(UserId::new(1), Username::new("alice".to_string()).unwrap())
    }

    fn provider_with(catalog: MockCatalog) -> JwtIdentityProvider {
        JwtIdentityProvider::new("test-secret", 3600, Arc::new(catalog))
    }

    fn known_users() -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog.expect_find_user().returning(|id| {
            Ok((id == UserId::new(1)).then(alice))
        });
        catalog
    }

    #[tokio::test]
    async fn test_issued_token_authenticates_user() {
        // テスト項目: 発行したトークンでカタログ上のユーザーとして認証される
        // given (前提条件):
        let provider = provider_with(known_users());
        let token = provider.issue_token(&alice()).unwrap();

        // when (操作):
        let user = provider.authenticate(&token).await.unwrap();

        // then (期待する結果):
        assert_eq!(user, alice());
        let claims = provider.validate(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        // テスト項目: カタログに存在しないユーザーのトークンは拒否される
        let provider = provider_with(known_users());
        let stranger = User::new(UserId::new(42), Username::new("stranger".to_string()).unwrap());
        let token = provider.issue_token(&stranger).unwrap();

        let result = provider.authenticate(&token).await;

        assert_eq!(result, Err(AuthError::UnknownUser(UserId::new(42))));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        // テスト項目: 有効期限切れのトークンは Expired として拒否される
        let provider = provider_with(known_users());
        let token = provider.issue_token_with_ttl(&alice(), -3600).unwrap();

        let result = provider.authenticate(&token).await;

        assert_eq!(result, Err(AuthError::Expired));
    }

    #[tokio::test]
    async fn test_wrong_secret_and_garbage_are_rejected() {
        let provider = provider_with(known_users());
        let other = JwtIdentityProvider::new("other-secret", 3600, Arc::new(MockCatalog::new()));
        let forged = other.issue_token(&alice()).unwrap();

        assert!(matches!(
            provider.authenticate(&forged).await,
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            provider.authenticate("not-a-token").await,
            Err(AuthError::InvalidToken(_))
        ));
        assert_eq!(provider.authenticate("  ").await, Err(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported_as_invalid() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_find_user()
            .returning(|_| Err(RepositoryError::CatalogUnavailable("down".to_string())));
        let provider = provider_with(catalog);
        let token = provider.issue_token(&alice()).unwrap();

        assert!(matches!(
            provider.authenticate(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
