//! HS256 token issuance and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tablero_core::{models::UserIdentity, AppError};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid,
    pub email: String,
    /// Platform-admin flag, not a company role.
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue_token(
    identity: &UserIdentity,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: identity.id,
        email: identity.email.clone(),
        admin: identity.is_platform_admin,
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<JwtClaims, AppError> {
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            email: "ana@acme.test".to_string(),
            password_hash: None,
            is_platform_admin: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let identity = identity();
        let token = issue_token(&identity, "secret", 24).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, identity.id);
        assert_eq!(claims.email, identity.email);
        assert!(claims.admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&identity(), "secret", 24).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&identity(), "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
