use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub presign_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub chat: ChatConfig,
}

/// One year.
const MAX_TTL_MINUTES: i64 = 525_600;

/// Parses `key` straight into its target type so out-of-range values fail
/// instead of wrapping.
fn parsed<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid ({:?}): {}", key, v, e)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            match get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => anyhow::bail!("{} must be set", key),
            }
        };
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let ttl_minutes: i64 = parsed(&get, "JWT_TTL_MINUTES", 30)?;
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {}", MAX_TTL_MINUTES);
        }
        let max_connections: u32 = parsed(&get, "DATABASE_MAX_CONNECTIONS", 10)?;
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes,
        };

        let storage = StorageConfig {
            endpoint: or("S3_ENDPOINT", "http://localhost:9000"),
            bucket: or("S3_BUCKET", "petcare"),
            access_key: or("S3_ACCESS_KEY", "minioadmin"),
            secret_key: or("S3_SECRET_KEY", "minioadmin"),
            region: or("S3_REGION", "us-east-1"),
            presign_ttl_secs: parsed(&get, "PRESIGN_TTL_SECS", 30 * 60)?,
        };

        let chat = ChatConfig {
            base_url: or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            api_key: get("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            model: or("OPENAI_MODEL", "gpt-4o-mini"),
            timeout_secs: parsed(&get, "OPENAI_TIMEOUT_SECS", 30)?,
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            max_connections,
            host: or("APP_HOST", "0.0.0.0"),
            port: parsed(&get, "APP_PORT", 8080)?,
            cors_origins,
            jwt,
            storage,
            chat,
        })
    }
}
