//! In-memory directory and server used by unit tests.

use crate::error::TenantError;
use crate::server::DatabaseServer;
use crate::store::TenantDirectory;
use crate::tenant::Tenant;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    tenants: Mutex<Vec<Tenant>>,
    unavailable: AtomicBool,
    /// Fails only `insert`, with the given error, after lookups have passed.
    insert_failure: Mutex<Option<fn(&str) -> TenantError>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, name: &str, db_name: &str) -> Tenant {
        Self::push(&mut self.tenants.lock(), name, db_name)
    }

    fn push(tenants: &mut Vec<Tenant>, name: &str, db_name: &str) -> Tenant {
        let tenant = Tenant {
            id: tenants.len() as i32 + 1,
            name: name.to_string(),
            db_name: db_name.to_string(),
            created_at: Utc::now(),
        };
        tenants.push(tenant.clone());
        tenant
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `insert` report a unique-constraint race as `Conflict`.
    pub fn conflict_on_insert(&self) {
        *self.insert_failure.lock() =
            Some(|name| TenantError::Conflict(format!("tenant '{}' is already registered", name)));
    }

    /// Make `insert` fail as if the store dropped the connection.
    pub fn fail_insert(&self) {
        *self.insert_failure.lock() =
            Some(|_| TenantError::DirectoryUnavailable("connection reset by peer".into()));
    }

    pub fn tenants(&self) -> Vec<Tenant> {
        self.tenants.lock().clone()
    }

    fn check_available(&self) -> Result<(), TenantError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TenantError::DirectoryUnavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for MemoryDirectory {
    async fn find_conflicting(&self, name: &str, db_name: &str) -> Result<Option<Tenant>, TenantError> {
        self.check_available()?;
        Ok(self
            .tenants
            .lock()
            .iter()
            .find(|t| t.name == name || t.db_name == db_name)
            .cloned())
    }

    async fn db_name_for(&self, tenant_id: i32) -> Result<Option<String>, TenantError> {
        self.check_available()?;
        Ok(self
            .tenants
            .lock()
            .iter()
            .find(|t| t.id == tenant_id)
            .map(|t| t.db_name.clone()))
    }

    async fn insert(&self, name: &str, db_name: &str) -> Result<Tenant, TenantError> {
        self.check_available()?;
        if let Some(failure) = *self.insert_failure.lock() {
            return Err(failure(name));
        }
        let mut tenants = self.tenants.lock();
        if tenants.iter().any(|t| t.name == name || t.db_name == db_name) {
            return Err(TenantError::Conflict(format!("tenant '{}' is already registered", name)));
        }
        Ok(Self::push(&mut tenants, name, db_name))
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryDatabase {
    schema_ready: bool,
    users: Vec<String>,
}

/// Handle to an in-memory database. Clones share one connection id.
#[derive(Clone, Debug)]
pub(crate) struct MemoryHandle {
    db_name: String,
    connection: usize,
    db: Arc<Mutex<MemoryDatabase>>,
    closed: Arc<AtomicBool>,
}

impl MemoryHandle {
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn same_connection(&self, other: &MemoryHandle) -> bool {
        self.connection == other.connection
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Insert into `users`; fails before schema bootstrap or on a duplicate email.
    pub fn insert_user(&self, email: &str) -> Result<i32, String> {
        if self.is_closed() {
            return Err("connection closed".into());
        }
        let mut db = self.db.lock();
        if !db.schema_ready {
            return Err("relation \"users\" does not exist".into());
        }
        if db.users.iter().any(|e| e == email) {
            return Err("duplicate key value violates unique constraint".into());
        }
        db.users.push(email.to_string());
        Ok(db.users.len() as i32)
    }
}

#[derive(Default)]
pub(crate) struct MemoryServer {
    databases: Mutex<HashMap<String, Arc<Mutex<MemoryDatabase>>>>,
    connect_delay: Option<Duration>,
    next_connection: AtomicUsize,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub close_attempts: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_bootstrap: AtomicBool,
    pub fail_close: AtomicBool,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_delay(mut self, millis: u64) -> Self {
        self.connect_delay = Some(Duration::from_millis(millis));
        self
    }

    /// Create a database with its schema already applied.
    pub fn seed_database(&self, db_name: &str) {
        let db = MemoryDatabase {
            schema_ready: true,
            users: Vec::new(),
        };
        self.databases
            .lock()
            .insert(db_name.to_string(), Arc::new(Mutex::new(db)));
    }

    pub fn has_database(&self, db_name: &str) -> bool {
        self.databases.lock().contains_key(db_name)
    }

    pub fn database_count(&self) -> usize {
        self.databases.lock().len()
    }
}

#[async_trait]
impl DatabaseServer for MemoryServer {
    type Handle = MemoryHandle;

    async fn create_database(&self, db_name: &str) -> Result<(), TenantError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(TenantError::Provisioning {
                db_name: db_name.to_string(),
                message: "permission denied to create database".into(),
            });
        }
        let mut databases = self.databases.lock();
        if databases.contains_key(db_name) {
            return Err(TenantError::Conflict(format!("database {} already exists", db_name)));
        }
        databases.insert(db_name.to_string(), Arc::default());
        Ok(())
    }

    async fn connect(&self, db_name: &str) -> Result<MemoryHandle, TenantError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        let failure = |message: &str| TenantError::ConnectionFailure {
            db_name: db_name.to_string(),
            message: message.to_string(),
        };
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(failure("connection refused"));
        }
        let db = self
            .databases
            .lock()
            .get(db_name)
            .cloned()
            .ok_or_else(|| failure("database does not exist"))?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryHandle {
            db_name: db_name.to_string(),
            connection: self.next_connection.fetch_add(1, Ordering::SeqCst),
            db,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn bootstrap_schema(&self, db_name: &str, handle: &MemoryHandle) -> Result<(), TenantError> {
        if self.fail_bootstrap.load(Ordering::SeqCst) {
            return Err(TenantError::SchemaBootstrap {
                db_name: db_name.to_string(),
                message: "syntax error".into(),
            });
        }
        handle.db.lock().schema_ready = true;
        Ok(())
    }

    async fn close(&self, handle: MemoryHandle) -> Result<(), TenantError> {
        self.close_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(TenantError::ConnectionFailure {
                db_name: handle.db_name,
                message: "close failed".into(),
            });
        }
        handle.closed.store(true, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
