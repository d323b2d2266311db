//! Tenant provisioning: physical database, baseline schema, directory entry, cached handle.
//!
//! The steps are independent and not atomic. A database whose schema bootstrap
//! fails is left on the server for an operator to inspect or drop.

use crate::error::TenantError;
use crate::registry::ConnectionRegistry;
use crate::server::{DatabaseServer, PgDatabaseServer};
use crate::store::{PgTenantDirectory, TenantDirectory};
use crate::tenant::{database_name_for, Tenant};
use std::sync::Arc;

pub type PgTenantProvisioner = TenantProvisioner<PgTenantDirectory, PgDatabaseServer>;

pub struct TenantProvisioner<D, S>
where
    D: TenantDirectory,
    S: DatabaseServer,
{
    registry: Arc<ConnectionRegistry<D, S>>,
}

impl<D, S> TenantProvisioner<D, S>
where
    D: TenantDirectory,
    S: DatabaseServer,
{
    /// Provisioner sharing the registry's directory and server.
    pub fn new(registry: Arc<ConnectionRegistry<D, S>>) -> Self {
        TenantProvisioner { registry }
    }

    /// Create a tenant: its database, schema and directory entry. The opened
    /// handle is cached so the tenant's first request does not reconnect.
    ///
    /// `Conflict` when the name, or the database identifier derived from it, is
    /// already taken.
    pub async fn create_tenant(&self, name: &str) -> Result<Tenant, TenantError> {
        let db_name = database_name_for(name)?;
        let directory = self.registry.directory();
        let server = self.registry.server();

        if let Some(existing) = directory.find_conflicting(name, &db_name).await? {
            return Err(if existing.name == name {
                TenantError::Conflict(format!("tenant '{}' already exists", name))
            } else {
                TenantError::Conflict(format!(
                    "database {} already belongs to tenant '{}'",
                    db_name, existing.name
                ))
            });
        }

        server.create_database(&db_name).await?;
        tracing::info!(tenant = name, db_name = %db_name, "created tenant database");

        let handle = match server.connect(&db_name).await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(db_name = %db_name, error = %e, "tenant database left without schema");
                return Err(e);
            }
        };
        if let Err(e) = server.bootstrap_schema(&db_name, &handle).await {
            tracing::error!(db_name = %db_name, error = %e, "tenant database left without schema");
            self.release(&db_name, handle).await;
            return Err(e);
        }

        let tenant = match directory.insert(name, &db_name).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(db_name = %db_name, error = %e, "tenant database not registered");
                self.release(&db_name, handle).await;
                return Err(e);
            }
        };

        self.registry.adopt(&db_name, handle).await;
        tracing::info!(tenant_id = tenant.id, tenant = name, "tenant provisioned");
        Ok(tenant)
    }

    async fn release(&self, db_name: &str, handle: S::Handle) {
        if let Err(e) = self.registry.server().close(handle).await {
            tracing::warn!(db_name, error = %e, "closing tenant connection");
        }
    }
}
