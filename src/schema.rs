//! Baseline DDL for the management store and for every tenant database.
//! Statements run in order; `posts` depends on `users`.

use sqlx::PgPool;

/// Tenant directory in the management store.
pub const MANAGEMENT_SCHEMA: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        db_name VARCHAR(255) NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#];

/// Tables created in each new tenant database.
pub const TENANT_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id SERIAL PRIMARY KEY,
        user_id INT NOT NULL REFERENCES users(id),
        title VARCHAR(255) NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Apply `TENANT_SCHEMA` to a tenant database. Idempotent.
pub async fn bootstrap_tenant_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in TENANT_SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
