//! Connection registry: tenant id → database identifier → live handle.
//!
//! Handles are opened on first resolution and kept for the life of the registry.
//! Concurrent first resolutions of the same database share one connection
//! attempt; callers that arrive while it is in flight wait for it and reuse the
//! result. A failed attempt leaves the slot empty so the next caller retries.

use crate::error::TenantError;
use crate::server::{DatabaseServer, PgDatabaseServer};
use crate::store::{PgTenantDirectory, TenantDirectory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::sync::SetError;

type Slot<H> = Arc<OnceCell<H>>;

/// Registry over the management store and PostgreSQL server.
pub type PgConnectionRegistry = ConnectionRegistry<PgTenantDirectory, PgDatabaseServer>;

pub struct ConnectionRegistry<D, S>
where
    D: TenantDirectory,
    S: DatabaseServer,
{
    directory: Arc<D>,
    server: Arc<S>,
    handles: Mutex<HashMap<String, Slot<S::Handle>>>,
}

impl<D, S> ConnectionRegistry<D, S>
where
    D: TenantDirectory,
    S: DatabaseServer,
{
    pub fn new(directory: Arc<D>, server: Arc<S>) -> Self {
        ConnectionRegistry {
            directory,
            server,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub fn server(&self) -> &Arc<S> {
        &self.server
    }

    /// Handle for the database of `tenant_id`.
    ///
    /// `UnknownTenant` when the directory has no such tenant; no connection is
    /// attempted in that case.
    pub async fn resolve(&self, tenant_id: i32) -> Result<S::Handle, TenantError> {
        let db_name = self
            .directory
            .db_name_for(tenant_id)
            .await?
            .ok_or(TenantError::UnknownTenant(tenant_id))?;
        self.handle_for(&db_name).await
    }

    /// Cached handle for `db_name`, opening it if this is the first request.
    pub async fn handle_for(&self, db_name: &str) -> Result<S::Handle, TenantError> {
        let slot = self.slot(db_name);
        let handle = slot
            .get_or_try_init(|| async {
                tracing::debug!(db_name, "opening tenant connection");
                let handle = self.server.connect(db_name).await?;
                tracing::info!(db_name, "cached tenant connection");
                Ok::<_, TenantError>(handle)
            })
            .await?;
        Ok(handle.clone())
    }

    /// Take ownership of a handle opened elsewhere (provisioning). If the
    /// database already has a cached handle, `handle` is closed and the cached
    /// one kept. Returns true when `handle` was cached.
    pub async fn adopt(&self, db_name: &str, handle: S::Handle) -> bool {
        let slot = self.slot(db_name);
        let redundant = match slot.set(handle) {
            Ok(()) => return true,
            Err(SetError::AlreadyInitializedError(h)) => h,
            Err(SetError::InitializingError(h)) => h,
        };
        tracing::debug!(db_name, "handle already cached, closing the new one");
        if let Err(e) = self.server.close(redundant).await {
            tracing::warn!(db_name, error = %e, "closing redundant tenant connection");
        }
        false
    }

    /// True when `db_name` has a live cached handle.
    pub fn is_cached(&self, db_name: &str) -> bool {
        self.handles
            .lock()
            .get(db_name)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Number of cached handles.
    pub fn len(&self) -> usize {
        self.handles.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close every cached handle. Close failures are logged and skipped.
    ///
    /// Opens already in flight are awaited and their handles closed too. A
    /// resolution that starts after this call opens and caches a fresh handle.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Slot<S::Handle>)> = self.handles.lock().drain().collect();
        let mut closed = 0usize;
        for (db_name, slot) in drained {
            let handle = match slot.get() {
                Some(h) => h.clone(),
                // waits for an in-flight open; fails at once when there is none
                None => match slot.get_or_try_init(|| async { Err(()) }).await {
                    Ok(h) => h.clone(),
                    Err(()) => continue,
                },
            };
            match self.server.close(handle).await {
                Ok(()) => closed += 1,
                Err(e) => tracing::warn!(db_name = %db_name, error = %e, "closing tenant connection"),
            }
        }
        tracing::info!(closed, "tenant connections closed");
    }

    fn slot(&self, db_name: &str) -> Slot<S::Handle> {
        self.handles
            .lock()
            .entry(db_name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryDirectory, MemoryServer};
    use std::sync::atomic::Ordering;

    fn registry(directory: MemoryDirectory, server: MemoryServer) -> ConnectionRegistry<MemoryDirectory, MemoryServer> {
        ConnectionRegistry::new(Arc::new(directory), Arc::new(server))
    }

    #[tokio::test]
    async fn test_resolve_returns_handle_for_recorded_database() {
        let directory = MemoryDirectory::new();
        let tenant = directory.seed("Acme", "tenant_acme");
        let server = MemoryServer::new();
        server.seed_database("tenant_acme");
        let registry = registry(directory, server);

        let handle = registry.resolve(tenant.id).await.unwrap();
        assert_eq!(handle.db_name(), "tenant_acme");
        assert!(registry.is_cached("tenant_acme"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_cached() {
        let directory = MemoryDirectory::new();
        let tenant = directory.seed("Acme", "tenant_acme");
        let server = MemoryServer::new();
        server.seed_database("tenant_acme");
        let registry = registry(directory, server);

        let first = registry.resolve(tenant.id).await.unwrap();
        let second = registry.resolve(tenant.id).await.unwrap();
        assert_eq!(first.db_name(), second.db_name());
        assert!(first.same_connection(&second));
        assert_eq!(registry.server().connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tenant_never_connects() {
        let registry = registry(MemoryDirectory::new(), MemoryServer::new());

        let err = registry.resolve(999_999).await.unwrap_err();
        assert!(matches!(err, TenantError::UnknownTenant(999_999)));
        assert_eq!(registry.server().connects.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_directory_unavailable_is_distinct() {
        let directory = MemoryDirectory::new();
        let tenant = directory.seed("Acme", "tenant_acme");
        directory.set_unavailable(true);
        let registry = registry(directory, MemoryServer::new());

        let err = registry.resolve(tenant.id).await.unwrap_err();
        assert!(matches!(err, TenantError::DirectoryUnavailable(_)));
        assert_eq!(registry.server().connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_resolutions_open_one_connection() {
        let directory = MemoryDirectory::new();
        let tenant = directory.seed("Acme", "tenant_acme");
        let server = MemoryServer::new().with_connect_delay(20);
        server.seed_database("tenant_acme");
        let registry = Arc::new(registry(directory, server));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move { registry.resolve(tenant.id).await }));
        }
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(registry.server().connects.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| h.same_connection(&handles[0])));
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried_by_next_caller() {
        let directory = MemoryDirectory::new();
        let tenant = directory.seed("Acme", "tenant_acme");
        let server = MemoryServer::new();
        server.seed_database("tenant_acme");
        server.fail_connect.store(true, Ordering::SeqCst);
        let registry = registry(directory, server);

        let err = registry.resolve(tenant.id).await.unwrap_err();
        assert!(matches!(err, TenantError::ConnectionFailure { .. }));
        assert!(!registry.is_cached("tenant_acme"));

        registry.server().fail_connect.store(false, Ordering::SeqCst);
        let handle = registry.resolve(tenant.id).await.unwrap();
        assert_eq!(handle.db_name(), "tenant_acme");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_adopt_keeps_existing_handle() {
        let server = MemoryServer::new();
        server.seed_database("tenant_acme");
        let registry = registry(MemoryDirectory::new(), server);

        let cached = registry.handle_for("tenant_acme").await.unwrap();
        let extra = registry.server().connect("tenant_acme").await.unwrap();
        assert!(!registry.adopt("tenant_acme", extra.clone()).await);
        assert!(extra.is_closed());

        let again = registry.handle_for("tenant_acme").await.unwrap();
        assert!(again.same_connection(&cached));
        assert!(!again.is_closed());
        assert_eq!(registry.server().closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_all_closes_in_flight_open() {
        let server = MemoryServer::new().with_connect_delay(50);
        server.seed_database("tenant_acme");
        let registry = Arc::new(registry(MemoryDirectory::new(), server));

        let opening = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.handle_for("tenant_acme").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        registry.close_all().await;

        let handle = opening.await.unwrap().unwrap();
        assert!(handle.is_closed());
        assert_eq!(registry.server().closes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_all_continues_past_failures() {
        let server = MemoryServer::new();
        server.seed_database("tenant_a");
        server.seed_database("tenant_b");
        let registry = registry(MemoryDirectory::new(), server);
        registry.handle_for("tenant_a").await.unwrap();
        registry.handle_for("tenant_b").await.unwrap();
        registry.server().fail_close.store(true, Ordering::SeqCst);

        registry.close_all().await;

        assert!(registry.is_empty());
        assert_eq!(registry.server().close_attempts.load(Ordering::SeqCst), 2);
    }
}
