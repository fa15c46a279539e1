/*!
 * # Authentication
 *
 * Session tokens are issued by the hosted auth service; this module only
 * verifies them (HS256, shared secret, expected audience) and exposes the
 * caller's user id as an [`Identity`]. Handlers that write or list owned rows
 * take `Identity` as an extractor so the owning user is always explicit.
 */

use crate::errors::ServiceError;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Claims carried by a hosted-auth session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, ServiceError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::Unauthorized("Token expired".into()),
                ErrorKind::InvalidAudience => {
                    ServiceError::Unauthorized("Token audience mismatch".into())
                }
                _ => ServiceError::Unauthorized("Invalid token".into()),
            })?
            .claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Token subject is not a user id".into()))?;
        debug!(%user_id, "session token verified");
        Ok(Identity { user_id })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".into()))?;

        state.verifier.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "a_long_enough_session_secret_for_tests_0123456789";

    fn token(sub: &str, aud: &str, exp_offset: i64) -> String {
        let claims = json!({
            "sub": sub,
            "aud": aud,
            "exp": chrono::Utc::now().timestamp() + exp_offset,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_tokens_for_the_expected_audience() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let user = Uuid::new_v4();
        let identity = verifier
            .verify(&token(&user.to_string(), "authenticated", 3600))
            .unwrap();
        assert_eq!(identity.user_id, user);
    }

    #[test]
    fn rejects_expired_foreign_or_malformed_tokens() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let user = Uuid::new_v4().to_string();

        assert_matches!(
            verifier.verify(&token(&user, "authenticated", -3600)),
            Err(ServiceError::Unauthorized(msg)) if msg == "Token expired"
        );
        assert_matches!(
            verifier.verify(&token(&user, "service_role", 3600)),
            Err(ServiceError::Unauthorized(_))
        );
        assert_matches!(
            verifier.verify(&token("not-a-uuid", "authenticated", 3600)),
            Err(ServiceError::Unauthorized(_))
        );
        assert_matches!(verifier.verify("garbage"), Err(ServiceError::Unauthorized(_)));
    }
}
