//! NameRegistry - scoped name → provider store
//!
//! Scope table in a DashMap; each scope has its own store with an
//! exclusive lock for mutations and shared access for lookups.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{BinderError, Result};
use crate::event_log::{EventKind, EventLog};
use crate::name::Name;
use crate::provider::ValueProvider;
use crate::scope::{Scope, ScopeConfig};

use super::binding::{BindingEntry, BindingHandle, DeploymentId};
use super::scope_store::{ScopeHandle, ScopeStore, Waiter};

/// Process-wide registry
static GLOBAL_REGISTRY: Lazy<NameRegistry> = Lazy::new(NameRegistry::new);

struct RegistryInner {
    scopes: DashMap<Scope, Arc<ScopeStore>>,
    next_binding_id: AtomicU64,
    events: EventLog,
}

/// Thread-safe name registry (cheap to clone, clones share state)
#[derive(Clone)]
pub struct NameRegistry {
    inner: Arc<RegistryInner>,
}

impl NameRegistry {
    /// Create an independent registry
    pub fn new() -> Self {
        Self::with_events(EventLog::new())
    }

    /// Registry whose event log keeps at most `capacity` events
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self::with_events(EventLog::with_capacity(capacity))
    }

    fn with_events(events: EventLog) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                scopes: DashMap::new(),
                next_binding_id: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// The process-wide registry shared by every deployment
    pub fn global() -> &'static NameRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn events(&self) -> &EventLog {
        &self.inner.events
    }

    fn handle(&self, store: Arc<ScopeStore>) -> ScopeHandle {
        ScopeHandle {
            store,
            events: self.inner.events.clone(),
        }
    }

    fn store(&self, scope: &Scope) -> Option<Arc<ScopeStore>> {
        self.inner.scopes.get(scope).map(|s| Arc::clone(s.value()))
    }

    // ═══════════════════════════════════════════════════════════════
    // Scopes
    // ═══════════════════════════════════════════════════════════════

    /// Create a scope (idempotent for an identical config)
    ///
    /// Fails with `ScopeConflict` when the scope already exists with a
    /// different config.
    pub fn create_scope(&self, scope: Scope, config: ScopeConfig) -> Result<ScopeHandle> {
        let store = match self.inner.scopes.entry(scope.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().config() != config {
                    warn!(scope = %scope, "Scope re-created with a different config");
                    return Err(BinderError::ScopeConflict {
                        scope: scope.to_string(),
                    });
                }
                return Ok(self.handle(Arc::clone(existing.get())));
            }
            Entry::Vacant(slot) => {
                let store = Arc::new(ScopeStore::new(scope, config));
                slot.insert(Arc::clone(&store));
                store
            }
        };

        Ok(self.publish_new_scope(store))
    }

    /// Existing scope handle, or a new deferred scope
    ///
    /// Unlike `create_scope` this never conflicts: the existing config
    /// wins. Installers use it to declare their dependency.
    pub fn ensure_scope(&self, scope: &Scope) -> ScopeHandle {
        let (store, created) = match self.inner.scopes.entry(scope.clone()) {
            Entry::Occupied(existing) => (Arc::clone(existing.get()), false),
            Entry::Vacant(slot) => {
                let store = Arc::new(ScopeStore::new(scope.clone(), ScopeConfig::deferred()));
                slot.insert(Arc::clone(&store));
                (store, true)
            }
        };

        if created {
            self.publish_new_scope(store)
        } else {
            self.handle(store)
        }
    }

    fn publish_new_scope(&self, store: Arc<ScopeStore>) -> ScopeHandle {
        let ready = store.config().ready_on_create;
        info!(scope = %store.label(), ready, "Scope created");
        self.inner.events.emit(EventKind::ScopeCreated {
            scope: Arc::clone(store.label()),
            ready,
        });

        let handle = self.handle(store);
        if ready {
            handle.mark_ready();
        }
        handle
    }

    /// Handle for an existing scope
    pub fn scope(&self, scope: &Scope) -> Option<ScopeHandle> {
        self.store(scope).map(|store| self.handle(store))
    }

    /// All known scopes, sorted
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes: Vec<Scope> = self.inner.scopes.iter().map(|s| s.key().clone()).collect();
        scopes.sort();
        scopes
    }

    // ═══════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════

    /// Register `provider` under `name` in `scope`
    ///
    /// The binding stays `Pending` (invisible to lookups) until
    /// `depends_on` is ready.
    pub fn bind(
        &self,
        name: Name,
        scope: &Scope,
        provider: Arc<dyn ValueProvider>,
        depends_on: &ScopeHandle,
    ) -> Result<BindingHandle> {
        self.bind_owned(name, scope, provider, depends_on, None)
    }

    /// `bind` with an owner whose teardown releases the binding
    #[instrument(skip(self, provider, depends_on), fields(dependency = %depends_on.scope()))]
    pub fn bind_owned(
        &self,
        name: Name,
        scope: &Scope,
        provider: Arc<dyn ValueProvider>,
        depends_on: &ScopeHandle,
        owner: Option<DeploymentId>,
    ) -> Result<BindingHandle> {
        let target = self.store(scope).ok_or_else(|| BinderError::UnknownScope {
            scope: scope.to_string(),
        })?;

        let id = self.inner.next_binding_id.fetch_add(1, Ordering::Relaxed);
        let state = target.insert_pending(&name, id, provider, owner.clone())?;

        debug!("Binding pending");
        self.inner.events.emit(EventKind::BindingPending {
            scope: Arc::clone(target.label()),
            name: name.to_string().into(),
            depends_on: Arc::clone(depends_on.store.label()),
        });

        depends_on.register(Waiter {
            target: Arc::downgrade(&target),
            name: name.clone(),
            id,
        });

        Ok(BindingHandle {
            id,
            name,
            scope: scope.clone(),
            owner,
            state,
        })
    }

    /// Value bound under `name` in `scope`
    ///
    /// Fails with `NotFound` when unbound or still pending. Never releases
    /// the provider.
    pub fn lookup(&self, name: &Name, scope: &Scope) -> Result<Value> {
        let not_found = || BinderError::NotFound {
            name: name.to_string(),
            scope: scope.to_string(),
        };
        let store = self.store(scope).ok_or_else(not_found)?;
        store.get_active(name).map_err(|err| match err {
            BinderError::DependencyUnready { .. } => not_found(),
            other => other,
        })
    }

    /// Remove a binding and release its provider
    ///
    /// Fails with `NotBound` if nothing is bound under `name`.
    pub fn unbind(&self, name: &Name, scope: &Scope) -> Result<()> {
        let entry = self
            .store(scope)
            .and_then(|store| store.remove(name))
            .ok_or_else(|| BinderError::NotBound {
                name: name.to_string(),
                scope: scope.to_string(),
            })?;
        self.release_entry(scope, name, entry);
        Ok(())
    }

    /// Unbind exactly the binding behind `handle`
    ///
    /// Fails with `NotBound` once that binding is gone, even if the name
    /// has been bound again since.
    pub fn unbind_handle(&self, handle: &BindingHandle) -> Result<()> {
        let entry = self
            .store(&handle.scope)
            .and_then(|store| store.remove_if(&handle.name, handle.id))
            .ok_or_else(|| BinderError::NotBound {
                name: handle.name.to_string(),
                scope: handle.scope.to_string(),
            })?;
        self.release_entry(&handle.scope, &handle.name, entry);
        Ok(())
    }

    /// Unbind every binding owned by `owner`, across all scopes
    ///
    /// Returns how many bindings were released.
    pub fn teardown(&self, owner: &DeploymentId) -> usize {
        let stores: Vec<Arc<ScopeStore>> = self
            .inner
            .scopes
            .iter()
            .map(|s| Arc::clone(s.value()))
            .collect();

        let mut released = 0;
        for store in stores {
            for (name, entry) in store.remove_owned(owner) {
                if self.release_entry(store.scope(), &name, entry) {
                    released += 1;
                }
            }
        }

        info!(owner = %owner, released, "Deployment torn down");
        self.inner.events.emit(EventKind::OwnerTornDown {
            owner: owner.as_str().into(),
            released,
        });
        released
    }

    fn release_entry(&self, scope: &Scope, name: &Name, entry: BindingEntry) -> bool {
        if !entry.release() {
            return false;
        }
        debug!(scope = %scope, name = %name, "Binding released");
        self.inner.events.emit(EventKind::BindingReleased {
            scope: scope.to_string().into(),
            name: name.to_string().into(),
        });
        true
    }

    /// Active names in `scope`, sorted
    pub fn list(&self, scope: &Scope) -> Result<Vec<Name>> {
        self.store(scope)
            .map(|store| store.active_names())
            .ok_or_else(|| BinderError::UnknownScope {
                scope: scope.to_string(),
            })
    }

    /// Active names in `scope` at or below `prefix`, sorted
    pub fn list_under(&self, scope: &Scope, prefix: &Name) -> Result<Vec<Name>> {
        let mut names = self.list(scope)?;
        names.retain(|name| name.starts_with(prefix));
        Ok(names)
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameRegistry")
            .field("scopes", &self.inner.scopes.len())
            .field("events", &self.inner.events.len())
            .finish()
    }
}
