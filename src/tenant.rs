//! Tenant records from the management store and database-name derivation.

use crate::error::{AppError, TenantError};
use crate::service::{RequestValidator, Validate, MAX_VARCHAR};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prefix on every tenant database, keeping them apart from system databases.
pub const DATABASE_PREFIX: &str = "tenant_";

/// PostgreSQL truncates identifiers longer than this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Row of `tenants` in the management store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Tenant {
    pub id: i32,
    pub name: String,
    pub db_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    #[schema(example = "Example Company")]
    pub name: String,
}

impl Validate for CreateTenantRequest {
    fn validate(&self) -> Result<(), AppError> {
        RequestValidator::required("name", &self.name)?;
        RequestValidator::max_length("name", &self.name, MAX_VARCHAR)
    }
}

/// Derive the database identifier for a tenant name: lowercased, each whitespace
/// character replaced by `_`, prefixed with `tenant_`.
///
/// Distinct names can collapse to one identifier ("Acme" and "acme"); callers
/// check the directory for the identifier as well as the name.
pub fn database_name_for(name: &str) -> Result<String, TenantError> {
    if name.trim().is_empty() {
        return Err(TenantError::InvalidName("name must not be empty".into()));
    }
    let mut db_name = String::with_capacity(DATABASE_PREFIX.len() + name.len());
    db_name.push_str(DATABASE_PREFIX);
    for c in name.chars() {
        if c.is_whitespace() {
            db_name.push('_');
        } else {
            db_name.extend(c.to_lowercase());
        }
    }
    if db_name.len() > MAX_IDENTIFIER_LEN {
        return Err(TenantError::InvalidName(format!(
            "database name {} exceeds {} bytes",
            db_name, MAX_IDENTIFIER_LEN
        )));
    }
    Ok(db_name)
}
