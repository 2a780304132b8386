use std::ops::{Deref, DerefMut};
use std::time::Duration;

use anyhow::Context;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

/// One database transaction bound to the lifetime of a request.
///
/// Handlers must call [`Tx::commit`] to make their writes visible. If the
/// handler returns early, panics, or its future is dropped because the
/// client went away, the inner `Transaction` is dropped and sqlx rolls it
/// back before the connection goes back to the pool.
pub struct Tx(Transaction<'static, Postgres>);

impl Tx {
    pub async fn begin(db: &PgPool) -> Result<Self, AppError> {
        let tx = db.begin().await.context("begin request transaction")?;
        Ok(Tx(tx))
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.0.commit().await.context("commit request transaction")?;
        debug!("request transaction committed");
        Ok(())
    }
}

impl Deref for Tx {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.0
    }
}

impl DerefMut for Tx {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Tx {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Tx::begin(&state.db).await
    }
}

/// Startup connectivity check; a failure is logged, not fatal.
pub async fn ping(db: &PgPool) {
    let check = tokio::time::timeout(
        Duration::from_millis(500),
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(db),
    )
    .await;
    match check {
        Ok(Ok(_)) => info!("database connection ok"),
        Ok(Err(e)) => warn!(error = %e, "database ping failed"),
        Err(_) => warn!("database ping timed out"),
    }
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Pagination shared by list endpoints.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn validate(self) -> Result<Self, AppError> {
        if !(1..=100).contains(&self.limit) {
            return Err(AppError::invalid("limit must be between 1 and 100"));
        }
        if self.offset < 0 {
            return Err(AppError::invalid("offset must not be negative"));
        }
        Ok(self)
    }
}
