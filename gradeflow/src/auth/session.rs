//! JWT session token creation and verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::{AuthRejection, Error},
    types::{RoleScopedId, UserId},
};

/// JWT session claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: UserId,           // Subject (global user ID)
    pub email: String,         // User email
    pub role: Role,            // Role at issue time
    pub role_id: RoleScopedId, // Role-scoped ID at issue time
    pub exp: i64,              // Expiration time
    pub iat: i64,              // Issued at
}

impl SessionClaims {
    /// Create new session claims for a user
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.security.jwt_expiry;

        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.role(),
            role_id: user.role.id(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    /// First instant at which the token is rejected.
    ///
    /// Verification compares whole seconds and accepts `now == exp`, so the token stays valid
    /// until the second after `exp` begins.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
            .checked_add(1)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a JWT token for a user session
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(user, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token.
///
/// Signature and expiry are checked before any claim is returned. There is no leeway, so a token
/// stops working at [`SessionClaims::expires_at`], the same instant its revocation entry lapses.
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::from(AuthRejection::Expired),
        ErrorKind::InvalidSignature => Error::from(AuthRejection::Unsigned),

        // Client errors (401) - malformed tokens, invalid claims
        ErrorKind::InvalidToken
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::from(AuthRejection::Malformed),

        // Server errors (500) - key issues, internal failures
        ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::MissingAlgorithm
        | ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::RoleDetail;
    use crate::config::{AuthConfig, SecurityConfig};
    use std::time::Duration;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            auth: AuthConfig {
                security: SecurityConfig {
                    jwt_expiry: Duration::from_secs(3600), // 1 hour
                    cors: crate::config::CorsConfig::default(),
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn create_test_user() -> CurrentUser {
        CurrentUser {
            id: 12,
            email: "test@example.com".to_string(),
            role: RoleDetail::Teacher(4),
        }
    }

    fn encode_claims(claims: &SessionClaims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn rejection(result: Result<SessionClaims, Error>) -> AuthRejection {
        match result {
            Err(Error::Unauthenticated { reason }) => reason,
            other => panic!("expected Unauthenticated, got {other:?}"),
        }
    }

    #[test]
    fn test_create_and_verify_session_token() {
        let config = create_test_config();
        let user = create_test_user();

        let token = create_session_token(&user, &config).unwrap();
        assert!(!token.is_empty());

        let claims = verify_session_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 12);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.role_id, 4);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.expires_at().timestamp(), claims.exp + 1);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let token = create_session_token(&create_test_user(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        assert_eq!(rejection(verify_session_token(&token, &config)), AuthRejection::Unsigned);
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: 1,
            email: "old@example.com".to_string(),
            role: Role::Student,
            role_id: 1,
            exp: (now - chrono::Duration::seconds(10)).timestamp(),
            iat: (now - chrono::Duration::seconds(3610)).timestamp(),
        };

        let token = encode_claims(&claims, "test-secret-key-for-jwt");
        assert_eq!(rejection(verify_session_token(&token, &config)), AuthRejection::Expired);
    }

    #[test]
    fn test_token_valid_through_its_exp_second() {
        let config = create_test_config();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: 1,
            email: "edge@example.com".to_string(),
            role: Role::Student,
            role_id: 1,
            exp: now.timestamp(),
            iat: now.timestamp() - 60,
        };

        let token = encode_claims(&claims, "test-secret-key-for-jwt");
        // Unless the clock ticked over since `now`, the token still verifies
        if Utc::now().timestamp() == claims.exp {
            assert!(verify_session_token(&token, &config).is_ok());
        }
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            assert_eq!(
                rejection(verify_session_token(token, &config)),
                AuthRejection::Malformed,
                "Expected Malformed for token: {token}"
            );
        }
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let mut config = create_test_config();
        let token = create_session_token(&create_test_user(), &config).unwrap();

        config.secret_key = None;
        assert!(matches!(create_session_token(&create_test_user(), &config), Err(Error::Internal { .. })));
        assert!(matches!(verify_session_token(&token, &config), Err(Error::Internal { .. })));
    }
}
