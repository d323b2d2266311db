//! Shared application state for all routes. Owns the management pool and the
//! tenant connection registry for the life of the process.

use crate::auth::TokenService;
use crate::error::AppError;
use crate::provisioner::PgTenantProvisioner;
use crate::registry::PgConnectionRegistry;
use crate::server::PgDatabaseServer;
use crate::settings::Settings;
use crate::store::{ensure_management_database, ensure_management_tables, PgTenantDirectory};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Management store pool.
    pub pool: PgPool,
    pub tenants: Arc<PgConnectionRegistry>,
    pub provisioner: Arc<PgTenantProvisioner>,
    pub tokens: Arc<TokenService>,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Bootstrap the management store and build the registry over it.
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        ensure_management_database(&settings.db).await?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(settings.db.connect_options(&settings.db.management_database))
            .await?;
        ensure_management_tables(&pool).await?;
        tracing::info!(database = %settings.db.management_database, "management store ready");
        Ok(Self::from_pool(pool, settings))
    }

    /// State over an already bootstrapped management pool.
    pub fn from_pool(pool: PgPool, settings: &Settings) -> Self {
        let directory = Arc::new(PgTenantDirectory::new(pool.clone()));
        let server = Arc::new(PgDatabaseServer::new(pool.clone(), settings.db.clone()));
        let tenants = Arc::new(PgConnectionRegistry::new(directory, server));
        let provisioner = Arc::new(PgTenantProvisioner::new(Arc::clone(&tenants)));
        AppState {
            pool,
            tenants,
            provisioner,
            tokens: Arc::new(TokenService::new(&settings.jwt_secret)),
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    /// Close every tenant handle, then the management pool.
    pub async fn shutdown(&self) {
        self.tenants.close_all().await;
        self.pool.close().await;
        tracing::info!("management store closed");
    }
}
