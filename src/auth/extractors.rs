use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Path},
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;
use uuid::Uuid;

use super::jwt::JwtKeys;
use super::policy;
use crate::error::AppError;

/// Verified caller identity taken from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_admin: bool,
}

/// Caller that passed the admin-only policy.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

/// Caller allowed to act on the `{user_id}` path segment: either that user
/// or an admin.
#[derive(Debug, Clone, Copy)]
pub struct SelfOrAdmin {
    pub caller: AuthUser,
    pub user_id: Uuid,
}

#[derive(Deserialize)]
struct UserIdParam {
    user_id: Uuid,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthenticated("missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthenticated("invalid Authorization header"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AppError::unauthenticated("invalid auth scheme"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::unauthenticated("invalid auth scheme"));
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = JwtKeys::from_ref(state).verify(token)?;
        Ok(AuthUser {
            id: claims.sub,
            is_admin: claims.is_admin,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthUser::from_request_parts(parts, state).await?;
        policy::require_admin(&caller)?;
        Ok(AdminUser(caller))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SelfOrAdmin
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthUser::from_request_parts(parts, state).await?;
        let Path(UserIdParam { user_id }) = Path::<UserIdParam>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::invalid(e.body_text()))?;
        policy::ensure_self_or_admin(&caller, user_id)?;
        Ok(SelfOrAdmin { caller, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_scheme_is_parsed_case_insensitively() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn malformed_schemes_are_authentication_failures() {
        for bad in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   ", "abc.def.ghi", "Token abc"] {
            let err = bearer_token(&headers(bad)).unwrap_err();
            assert!(matches!(err, AppError::Authentication(_)), "{bad}");
        }
    }

    #[test]
    fn missing_header_is_an_authentication_failure() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
