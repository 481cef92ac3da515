//! Postgres-backed implementations of the catalog repository ports.

mod cart;
mod items;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::query;

use super::error::InfraError;

/// Shared handle over the connection pool. Opened at startup, closed at
/// shutdown; passed into each component's constructor rather than held as a
/// process-wide singleton.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|err| InfraError::database(err.to_string()))
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), InfraError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|err| InfraError::database(err.to_string()))
    }

    pub async fn health_check(&self) -> Result<(), InfraError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(|err| InfraError::database(err.to_string()))
    }
}
