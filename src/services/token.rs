//! Signed access tokens
//!
//! HS256 JSON Web Tokens carrying the user ID and an expiry measured in
//! whole days. Tokens are always handed out as strings.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::config::AuthConfig;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: i64,
    /// Expiry as a Unix timestamp
    pub exp: i64,
}

/// Issues and verifies access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_days: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_days,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.secret_key, config.token_expiry_days)
    }

    /// Sign a token for the user, valid for the configured number of days
    pub fn issue(&self, user_id: i64) -> ServiceResult<String> {
        let exp = (Utc::now() + Duration::days(self.expiry_days)).timestamp();
        self.encode(&Claims { id: user_id, exp })
    }

    /// Check signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                ServiceError::unauthorized("Invalid authentication. Could not decode token.")
            })
    }

    fn encode(&self, claims: &Claims) -> ServiceResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret", 60);

        let token = tokens.issue(42).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.id, 42);
        let days_left = (claims.exp - Utc::now().timestamp()) / 86_400;
        assert!((59..=60).contains(&days_left));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("secret", 60).issue(1).unwrap();

        let result = TokenService::new("other-secret", 60).verify(&token);
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", 60);
        let stale = tokens
            .encode(&Claims {
                id: 1,
                exp: (Utc::now() - Duration::days(1)).timestamp(),
            })
            .unwrap();

        assert!(matches!(tokens.verify(&stale), Err(ServiceError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new("secret", 60);
        assert!(tokens.verify("not.a.jwt").is_err());
        assert!(tokens.verify("").is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// A freshly issued token verifies to the same user with a future expiry.
        #[test]
        fn token_round_trip(user_id in 1i64..i64::MAX, days in 1i64..365) {
            let tokens = TokenService::new("property-secret", days);

            let token = tokens.issue(user_id).unwrap();
            let claims = tokens.verify(&token).unwrap();

            prop_assert_eq!(claims.id, user_id);
            prop_assert!(claims.exp > Utc::now().timestamp());
        }
    }
}
