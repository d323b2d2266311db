//! Management store: bootstrap of the `tenant_management` database and the tenant directory.
//!
//! The directory is the only place tenant identity lives. Uniqueness of `name` and
//! `db_name` is enforced by the table's constraints; lookups elsewhere are
//! optimizations on top of that.

use crate::error::{is_unique_violation, AppError, TenantError};
use crate::schema::MANAGEMENT_SCHEMA;
use crate::settings::DbSettings;
use crate::tenant::Tenant;
use async_trait::async_trait;
use sqlx::{ConnectOptions, Connection};
use sqlx::PgPool;

/// Tenant directory operations the registry and provisioner depend on.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// A tenant that already holds `name` or `db_name`, if any.
    async fn find_conflicting(&self, name: &str, db_name: &str) -> Result<Option<Tenant>, TenantError>;

    /// Database identifier bound to `tenant_id`. `Ok(None)` when no such tenant exists.
    async fn db_name_for(&self, tenant_id: i32) -> Result<Option<String>, TenantError>;

    /// Register a tenant. A unique-constraint violation is reported as `Conflict`.
    async fn insert(&self, name: &str, db_name: &str) -> Result<Tenant, TenantError>;
}

/// Tenant directory backed by the `tenants` table.
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgTenantDirectory { pool }
    }
}

fn unavailable(e: sqlx::Error) -> TenantError {
    TenantError::DirectoryUnavailable(e.to_string())
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_conflicting(&self, name: &str, db_name: &str) -> Result<Option<Tenant>, TenantError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT id, name, db_name, created_at FROM tenants WHERE name = $1 OR db_name = $2 LIMIT 1",
        )
        .bind(name)
        .bind(db_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn db_name_for(&self, tenant_id: i32) -> Result<Option<String>, TenantError> {
        sqlx::query_scalar::<_, String>("SELECT db_name FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)
    }

    async fn insert(&self, name: &str, db_name: &str) -> Result<Tenant, TenantError> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, db_name) VALUES ($1, $2) RETURNING id, name, db_name, created_at",
        )
        .bind(name)
        .bind(db_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TenantError::Conflict(format!("tenant '{}' or database {} is already registered", name, db_name))
            } else {
                unavailable(e)
            }
        })
    }
}

/// Ensure the management database exists; create it if not. Connects to the admin
/// database to run CREATE DATABASE. Call before creating the management pool.
pub async fn ensure_management_database(settings: &DbSettings) -> Result<(), AppError> {
    let db_name = settings.management_database.as_str();
    if db_name.is_empty() || db_name == settings.admin_database {
        return Ok(());
    }
    let mut conn: sqlx::PgConnection = settings
        .connect_options(&settings.admin_database)
        .connect()
        .await
        .map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = db_name, "creating management database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "closing admin connection");
    }
    Ok(())
}

/// Create the `tenants` table if not exists.
pub async fn ensure_management_tables(pool: &PgPool) -> Result<(), AppError> {
    for ddl in MANAGEMENT_SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Double-quote an identifier for interpolation into DDL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("tenant_acme"), "\"tenant_acme\"");
        assert_eq!(quote_ident("tenant_a\"b"), "\"tenant_a\"\"b\"");
    }
}
