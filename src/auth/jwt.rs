use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Signing and verification keys plus the default token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(cfg.secret.as_bytes(), Duration::minutes(cfg.ttl_minutes))
    }

    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issues a token with the configured lifetime.
    pub fn issue(&self, user_id: Uuid, is_admin: bool) -> AppResult<String> {
        self.issue_with_ttl(user_id, is_admin, self.ttl)
    }

    pub fn issue_with_ttl(&self, user_id: Uuid, is_admin: bool, ttl: Duration) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            is_admin,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, "jwt signing failed; check JWT_SECRET");
            AppError::Internal(anyhow::anyhow!("jwt signing failed: {}", e))
        })?;
        debug!(user_id = %user_id, is_admin, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::unauthenticated("invalid or expired token")
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"dev-secret", Duration::minutes(30))
    }

    #[test]
    fn issue_and_verify_roundtrip_keeps_claims() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, true).expect("sign");
        assert!(!token.is_empty());
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let keys = keys();
        let token = keys
            .issue_with_ttl(Uuid::new_v4(), false, Duration::seconds(-5))
            .expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtKeys::new(b"other", Duration::minutes(5))
            .issue(Uuid::new_v4(), true)
            .unwrap();
        assert!(matches!(keys().verify(&token), Err(AppError::Authentication(_))));
    }

    #[test]
    fn token_without_subject_is_rejected() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "is_admin": true, "iat": now, "exp": now + 600 }),
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(keys().verify(&token), Err(AppError::Authentication(_))));
    }

    #[test]
    fn missing_admin_flag_defaults_to_false() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let sub = Uuid::new_v4();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": sub.to_string(), "iat": now, "exp": now + 600 }),
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert!(!claims.is_admin);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(keys().verify("not.a.jwt"), Err(AppError::Authentication(_))));
        assert!(matches!(keys().verify(""), Err(AppError::Authentication(_))));
    }
}
