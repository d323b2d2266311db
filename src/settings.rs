//! Process settings from environment variables, read once at start.
//!
//! Connection parameters are shared by the admin database, the management store
//! and every tenant database; only the database name differs.

use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;

pub const DEFAULT_MANAGEMENT_DATABASE: &str = "tenant_management";
pub const DEFAULT_BCRYPT_COST: u32 = 14;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// PostgreSQL server parameters.
#[derive(Clone, Debug)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub ssl_mode: PgSslMode,
    /// Database connected to for `CREATE DATABASE` of the management store.
    pub admin_database: String,
    pub management_database: String,
}

impl DbSettings {
    /// Connect options for `database` on the configured server.
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(self.ssl_mode)
            .database(database)
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub db: DbSettings,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub bcrypt_cost: u32,
}

impl Settings {
    /// Read settings from the process environment, falling back to a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Read settings through `lookup`; unset and empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("DB_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "DB_PORT", value: v })?,
            None => 5432,
        };
        let ssl_mode = match get("DB_SSLMODE") {
            Some(v) => PgSslMode::from_str(v.trim())
                .map_err(|_| ConfigError::Invalid { key: "DB_SSLMODE", value: v })?,
            None => PgSslMode::Disable,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(v) => match v.trim().parse::<u32>() {
                Ok(c) if BCRYPT_COST_RANGE.contains(&c) => c,
                _ => return Err(ConfigError::Invalid { key: "BCRYPT_COST", value: v }),
            },
            None => DEFAULT_BCRYPT_COST,
        };
        let jwt_secret = get("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        Ok(Settings {
            db: DbSettings {
                host: or("DB_HOST", "localhost"),
                port,
                user: or("DB_USER", "postgres"),
                password: lookup("DB_PASSWORD").unwrap_or_default(),
                ssl_mode,
                admin_database: or("DB_ADMIN_DATABASE", "postgres"),
                management_database: or("MANAGEMENT_DATABASE", DEFAULT_MANAGEMENT_DATABASE),
            },
            jwt_secret,
            bind_addr: or("BIND_ADDR", "0.0.0.0:8080"),
            bcrypt_cost,
        })
    }
}
