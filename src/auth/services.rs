use axum::http::{header, HeaderMap};
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{verify_dummy_blocking, verify_password_blocking};
use super::repo::LoginRecord;
use crate::error::{AppError, AppResult};
use crate::roles::repo_types::{Role, ADMIN_ROLE};
use crate::users::repo_types::User;

const BAD_CREDENTIALS: &str = "incorrect username or password";

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
}

/// Trims and lowercases, then checks the address shape.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > 255 || !EMAIL_RE.is_match(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::invalid("invalid email"));
    }
    Ok(email)
}

/// Where the login came from, as reported by the proxy headers.
#[derive(Debug, Default, Clone)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let ip = text("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| text("x-real-ip"))
            .map(|v| v.chars().take(64).collect());
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.chars().take(300).collect());
        Self { ip, user_agent }
    }
}

/// Checks the credentials of an active account. Unknown email, wrong
/// password and inactive account all fail the same way.
pub async fn authenticate(conn: &mut PgConnection, username: &str, password: &str) -> AppResult<User> {
    let email = username.trim().to_lowercase();
    let user = match User::find_by_email(&mut *conn, &email).await? {
        Some(u) => u,
        None => {
            verify_dummy_blocking(password).await;
            warn!(email = %email, "login unknown email");
            return Err(AppError::unauthenticated(BAD_CREDENTIALS));
        }
    };

    if !verify_password_blocking(password, &user.password_hash).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login on inactive account");
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    }
    Ok(user)
}

/// The caller's own account. A token that outlives its account's
/// deactivation no longer authenticates.
pub async fn current_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    User::find_active_by_id(conn, user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for inactive or missing account");
        AppError::unauthenticated("account no longer active")
    })
}

/// Records a successful login and reports whether the user is an admin.
pub async fn record_login(conn: &mut PgConnection, user: &User, client: &ClientInfo) -> AppResult<bool> {
    User::touch_last_login(&mut *conn, user.id).await?;
    LoginRecord::insert(
        &mut *conn,
        user.id,
        client.ip.as_deref(),
        client.user_agent.as_deref(),
    )
    .await?;
    let is_admin = Role::user_has_role(&mut *conn, user.id, ADMIN_ROLE).await?;
    info!(user_id = %user.id, is_admin, "user logged in");
    Ok(is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a b@c.io").is_err());
        assert!(normalize_email("").is_err());
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(info.user_agent, None);
        assert_eq!(ClientInfo::from_headers(&HeaderMap::new()).ip, None);
    }
}
