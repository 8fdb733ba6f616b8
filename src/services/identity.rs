use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppResult, MarketError};

/// Claims carried by access tokens from the hosted identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Exchanges a bearer credential for the caller's user id.
#[axum::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> AppResult<Uuid>;
}

/// Verifies HS256 tokens signed with the provider's shared secret.
#[derive(Clone)]
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[axum::async_trait]
impl IdentityProvider for JwtIdentity {
    async fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                MarketError::Unauthenticated
            })?
            .claims;

        Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a user id: {}", claims.sub);
            MarketError::Unauthenticated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-jwt-secret";

    fn token(sub: &str, exp_offset: i64, aud: Option<&str>, secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: now,
            aud: aud.map(str::to_string),
            email: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token() {
        let identity = JwtIdentity::new(SECRET, Some("authenticated"));
        let user = Uuid::new_v4();
        let jwt = token(&user.to_string(), 3600, Some("authenticated"), SECRET);
        assert_eq!(identity.authenticate(&jwt).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let identity = JwtIdentity::new(SECRET, None);
        assert!(matches!(
            identity.authenticate("invalid").await,
            Err(MarketError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let identity = JwtIdentity::new(SECRET, None);
        let jwt = token(&Uuid::new_v4().to_string(), 3600, None, "other-secret");
        assert!(identity.authenticate(&jwt).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_token() {
        let identity = JwtIdentity::new(SECRET, None);
        let jwt = token(&Uuid::new_v4().to_string(), -3600, None, SECRET);
        assert!(identity.authenticate(&jwt).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_audience() {
        let identity = JwtIdentity::new(SECRET, Some("authenticated"));
        let jwt = token(&Uuid::new_v4().to_string(), 3600, Some("anon"), SECRET);
        assert!(identity.authenticate(&jwt).await.is_err());
    }

    #[tokio::test]
    async fn test_subject_must_be_uuid() {
        let identity = JwtIdentity::new(SECRET, None);
        let jwt = token("not-a-uuid", 3600, None, SECRET);
        assert!(matches!(
            identity.authenticate(&jwt).await,
            Err(MarketError::Unauthenticated)
        ));
    }
}
