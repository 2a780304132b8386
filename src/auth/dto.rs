use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::LoginRecord;

/// Public self-registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Credentials for both `/auth/token` (form) and `/auth/login` (JSON).
/// `username` carries the account email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64, // seconds
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginHistoryRead {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
}

impl From<LoginRecord> for LoginHistoryRead {
    fn from(r: LoginRecord) -> Self {
        Self {
            id: r.id,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            logged_at: r.logged_at,
        }
    }
}
