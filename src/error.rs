//! Typed errors and HTTP mapping.

use crate::response::error_body;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures of the tenant registry and provisioner. Nothing in the core retries;
/// every failure is returned to the caller as one of these.
#[derive(Error, Debug)]
pub enum TenantError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unknown tenant: {0}")]
    UnknownTenant(i32),
    #[error("tenant directory unavailable: {0}")]
    DirectoryUnavailable(String),
    #[error("could not create database {db_name}: {message}")]
    Provisioning { db_name: String, message: String },
    #[error("could not apply schema to database {db_name}: {message}")]
    SchemaBootstrap { db_name: String, message: String },
    #[error("could not connect to database {db_name}: {message}")]
    ConnectionFailure { db_name: String, message: String },
    #[error("invalid tenant name: {0}")]
    InvalidName(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("token signing: {0}")]
    Signing(String),
    #[error("password hashing: {0}")]
    Hashing(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Tenant(#[from] TenantError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// Status code and stable error code for the response envelope.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Tenant(e) => match e {
                TenantError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                TenantError::UnknownTenant(_) => (StatusCode::NOT_FOUND, "unknown_tenant"),
                TenantError::InvalidName(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
                TenantError::DirectoryUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "directory_unavailable"),
                TenantError::Provisioning { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "provisioning_error"),
                TenantError::SchemaBootstrap { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "schema_bootstrap_error"),
                TenantError::ConnectionFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "connection_error"),
            },
            AppError::Auth(AuthError::InvalidCredential) => (StatusCode::UNAUTHORIZED, "invalid_credential"),
            AppError::Auth(_) => (StatusCode::INTERNAL_SERVER_ERROR, "auth_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(error_body(code, self.to_string()))).into_response()
    }
}

/// True when a sqlx error is a unique-constraint violation reported by the server.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
