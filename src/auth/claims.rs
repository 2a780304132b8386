use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    #[serde(default)]
    pub is_admin: bool, // admin role at the time of login
    pub iat: i64,       // issued at (unix timestamp)
    pub exp: i64,       // expires at (unix timestamp)
}
