//! Users of one tenant database. Email is unique within a tenant only.

use crate::error::{is_unique_violation, AppError};
use crate::service::validation::{RequestValidator, Validate, MAX_VARCHAR, MIN_PASSWORD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub tenant_id: i32,
    #[schema(example = "owner@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub tenant_id: i32,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        RequestValidator::positive_id("tenant_id", self.tenant_id)?;
        RequestValidator::required("email", &self.email)?;
        RequestValidator::max_length("email", &self.email, MAX_VARCHAR)?;
        RequestValidator::email("email", &self.email)?;
        RequestValidator::min_length("password", &self.password, MIN_PASSWORD)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        RequestValidator::positive_id("tenant_id", self.tenant_id)?;
        RequestValidator::email("email", &self.email)?;
        RequestValidator::required("password", &self.password)
    }
}

pub struct UserService;

impl UserService {
    pub async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
        Ok(exists.0)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Insert a user. A concurrent registration of the same email is a `Conflict`.
    pub async fn create(pool: &PgPool, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id, email, password_hash, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("user already exists".into())
            } else {
                AppError::Db(e)
            }
        })
    }
}
