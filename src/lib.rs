//! Multi-tenant database provisioning: one PostgreSQL database per tenant, a
//! management store recording them, and a registry of live tenant connections.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod password;
pub mod provisioner;
pub mod registry;
pub mod response;
pub mod routes;
pub mod schema;
pub mod server;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;
pub mod tenant;

#[cfg(test)]
mod test_support;

pub use auth::{Claims, TokenService};
pub use error::{AppError, AuthError, ConfigError, TenantError};
pub use provisioner::{PgTenantProvisioner, TenantProvisioner};
pub use registry::{ConnectionRegistry, PgConnectionRegistry};
pub use routes::{api_routes, app, common_routes};
pub use server::{DatabaseServer, PgDatabaseServer};
pub use settings::{DbSettings, Settings};
pub use state::AppState;
pub use store::{ensure_management_database, ensure_management_tables, PgTenantDirectory, TenantDirectory};
pub use tenant::{database_name_for, Tenant};
