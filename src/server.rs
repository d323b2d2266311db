//! Physical database operations on the PostgreSQL server hosting tenant databases.

use crate::error::TenantError;
use crate::schema::bootstrap_tenant_schema;
use crate::settings::DbSettings;
use crate::store::quote_ident;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// SQLSTATE for CREATE DATABASE on a name that already exists.
const DUPLICATE_DATABASE: &str = "42P04";

const TENANT_POOL_SIZE: u32 = 5;

/// Server-side operations the provisioner and registry need.
///
/// `Handle` is a reusable channel to one database. It is cloned out to callers,
/// so clones must share the underlying connection rather than open new ones.
#[async_trait]
pub trait DatabaseServer: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;

    /// Create an empty database. An existing database with this name is a `Conflict`.
    async fn create_database(&self, db_name: &str) -> Result<(), TenantError>;

    /// Open a handle to `db_name`.
    async fn connect(&self, db_name: &str) -> Result<Self::Handle, TenantError>;

    /// Apply the tenant baseline schema through `handle`.
    async fn bootstrap_schema(&self, db_name: &str, handle: &Self::Handle) -> Result<(), TenantError>;

    /// Close a handle and every clone of it.
    async fn close(&self, handle: Self::Handle) -> Result<(), TenantError>;
}

/// PostgreSQL server. DDL runs on the management pool; tenant handles are pools
/// opened with the shared connection parameters.
#[derive(Clone)]
pub struct PgDatabaseServer {
    admin: PgPool,
    settings: DbSettings,
}

impl PgDatabaseServer {
    pub fn new(admin: PgPool, settings: DbSettings) -> Self {
        PgDatabaseServer { admin, settings }
    }
}

#[async_trait]
impl DatabaseServer for PgDatabaseServer {
    type Handle = PgPool;

    async fn create_database(&self, db_name: &str) -> Result<(), TenantError> {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(db_name)))
            .execute(&self.admin)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .and_then(|d| d.code())
                    .map(|code| code == DUPLICATE_DATABASE)
                    .unwrap_or(false);
                if duplicate {
                    TenantError::Conflict(format!("database {} already exists", db_name))
                } else {
                    TenantError::Provisioning {
                        db_name: db_name.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;
        Ok(())
    }

    async fn connect(&self, db_name: &str) -> Result<PgPool, TenantError> {
        PgPoolOptions::new()
            .max_connections(TENANT_POOL_SIZE)
            .connect_with(self.settings.connect_options(db_name))
            .await
            .map_err(|e| TenantError::ConnectionFailure {
                db_name: db_name.to_string(),
                message: e.to_string(),
            })
    }

    async fn bootstrap_schema(&self, db_name: &str, handle: &PgPool) -> Result<(), TenantError> {
        bootstrap_tenant_schema(handle)
            .await
            .map_err(|e| TenantError::SchemaBootstrap {
                db_name: db_name.to_string(),
                message: e.to_string(),
            })
    }

    async fn close(&self, handle: PgPool) -> Result<(), TenantError> {
        handle.close().await;
        Ok(())
    }
}
