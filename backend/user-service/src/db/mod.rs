pub mod user_repo;

pub use user_repo::PgUserStore;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::Result;
use crate::models::{NewUser, User};

pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

pub async fn run_migrations(
    pool: &PgPool,
) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Persistence seam for user rows.
///
/// Implementations report a duplicate email as [`crate::AppError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    async fn create(&self, user: &NewUser) -> Result<User>;

    /// Returns `None` when no row has `id`.
    async fn update(&self, id: i64, user: &NewUser) -> Result<Option<User>>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn health_check(&self) -> Result<()>;
}
