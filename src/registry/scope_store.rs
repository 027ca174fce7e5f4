//! Per-scope backing store and its readiness signal
//!
//! Each scope owns a `RwLock`-guarded name map (mutations exclusive,
//! lookups shared) and a readiness flag. Bindings that depend on a store
//! are queued as waiters until the store is marked ready; the queue is
//! drained exactly once, and readiness is published only after every
//! drained waiter has been activated.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{BinderError, Result};
use crate::event_log::{EventKind, EventLog};
use crate::name::Name;
use crate::provider::ValueProvider;
use crate::scope::{Scope, ScopeConfig};

use super::binding::{BindingEntry, BindingState, DeploymentId, StateCell};

/// Deferred activation of one binding, queued on its dependency
pub(crate) struct Waiter {
    pub(crate) target: Weak<ScopeStore>,
    pub(crate) name: Name,
    pub(crate) id: u64,
}

struct Readiness {
    /// Queue closed; drained waiters are being activated
    draining: bool,
    ready: bool,
    waiters: Vec<Waiter>,
}

pub(crate) struct ScopeStore {
    scope: Scope,
    label: Arc<str>,
    config: ScopeConfig,
    bindings: RwLock<HashMap<Name, BindingEntry>>,
    readiness: Mutex<Readiness>,
    ready_tx: watch::Sender<bool>,
}

impl ScopeStore {
    pub(crate) fn new(scope: Scope, config: ScopeConfig) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            label: scope.to_string().into(),
            scope,
            config,
            bindings: RwLock::new(HashMap::new()),
            readiness: Mutex::new(Readiness {
                draining: false,
                ready: false,
                waiters: Vec::new(),
            }),
            ready_tx,
        }
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn label(&self) -> &Arc<str> {
        &self.label
    }

    pub(crate) fn config(&self) -> ScopeConfig {
        self.config
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.lock().ready
    }

    // ─────────────────────────────────────────────────────────────
    // Name map
    // ─────────────────────────────────────────────────────────────

    /// Insert a new binding in `Pending` state
    pub(crate) fn insert_pending(
        &self,
        name: &Name,
        id: u64,
        provider: Arc<dyn ValueProvider>,
        owner: Option<DeploymentId>,
    ) -> Result<Arc<StateCell>> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(name) {
            return Err(BinderError::DuplicateName {
                name: name.to_string(),
                scope: self.label.to_string(),
            });
        }
        let entry = BindingEntry::new(id, provider, owner);
        let state = Arc::clone(&entry.state);
        bindings.insert(name.clone(), entry);
        Ok(state)
    }

    /// `Pending -> Active` for the binding registered under `id`
    ///
    /// Returns false when the binding was removed or replaced meanwhile.
    pub(crate) fn activate(&self, name: &Name, id: u64) -> bool {
        let bindings = self.bindings.write();
        match bindings.get(name) {
            Some(entry) if entry.id == id => entry.state.activate(),
            _ => false,
        }
    }

    /// Value of an active binding
    ///
    /// Pending bindings report `DependencyUnready`; the registry maps that
    /// to `NotFound` before it reaches callers.
    pub(crate) fn get_active(&self, name: &Name) -> Result<Value> {
        let bindings = self.bindings.read();
        let entry = bindings.get(name).ok_or_else(|| BinderError::NotFound {
            name: name.to_string(),
            scope: self.label.to_string(),
        })?;
        match entry.state.get() {
            BindingState::Active => Ok(entry.provider.get_instance()),
            BindingState::Pending => Err(BinderError::DependencyUnready {
                scope: self.label.to_string(),
            }),
            BindingState::Released => Err(BinderError::NotFound {
                name: name.to_string(),
                scope: self.label.to_string(),
            }),
        }
    }

    pub(crate) fn remove(&self, name: &Name) -> Option<BindingEntry> {
        self.bindings.write().remove(name)
    }

    /// Remove only if the stored binding is the one registered under `id`
    pub(crate) fn remove_if(&self, name: &Name, id: u64) -> Option<BindingEntry> {
        let mut bindings = self.bindings.write();
        match bindings.get(name) {
            Some(entry) if entry.id == id => bindings.remove(name),
            _ => None,
        }
    }

    /// Remove every binding owned by `owner`
    pub(crate) fn remove_owned(&self, owner: &DeploymentId) -> Vec<(Name, BindingEntry)> {
        let mut bindings = self.bindings.write();
        let owned: Vec<Name> = bindings
            .iter()
            .filter(|(_, entry)| entry.owner.as_ref() == Some(owner))
            .map(|(name, _)| name.clone())
            .collect();
        owned
            .into_iter()
            .filter_map(|name| bindings.remove(&name).map(|entry| (name, entry)))
            .collect()
    }

    /// Names of active bindings, sorted
    pub(crate) fn active_names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self
            .bindings
            .read()
            .iter()
            .filter(|(_, entry)| entry.state.get() == BindingState::Active)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    // ─────────────────────────────────────────────────────────────
    // Readiness
    // ─────────────────────────────────────────────────────────────

    /// Queue a waiter, or hand it back once the queue is closed
    fn enqueue(&self, waiter: Waiter) -> Option<Waiter> {
        let mut readiness = self.readiness.lock();
        if readiness.draining || readiness.ready {
            Some(waiter)
        } else {
            readiness.waiters.push(waiter);
            None
        }
    }

    /// Close the queue and take its waiters; `None` if already closed
    fn take_waiters(&self) -> Option<Vec<Waiter>> {
        let mut readiness = self.readiness.lock();
        if readiness.draining || readiness.ready {
            return None;
        }
        readiness.draining = true;
        Some(std::mem::take(&mut readiness.waiters))
    }

    /// Publish readiness to `is_ready` and `wait_ready` observers
    fn publish_ready(&self) {
        let mut readiness = self.readiness.lock();
        readiness.draining = false;
        readiness.ready = true;
        self.ready_tx.send_replace(true);
    }
}

fn activate_waiter(waiter: Waiter, events: &EventLog) -> bool {
    let Some(target) = waiter.target.upgrade() else {
        return false;
    };
    if !target.activate(&waiter.name, waiter.id) {
        return false;
    }
    debug!(scope = %target.label(), name = %waiter.name, "Binding activated");
    events.emit(EventKind::BindingActivated {
        scope: Arc::clone(target.label()),
        name: waiter.name.to_string().into(),
    });
    true
}

/// Handle to a scope's backing store
///
/// Bindings declare their dependency on a store through this handle.
#[derive(Clone)]
pub struct ScopeHandle {
    pub(crate) store: Arc<ScopeStore>,
    pub(crate) events: EventLog,
}

impl ScopeHandle {
    pub fn scope(&self) -> &Scope {
        self.store.scope()
    }

    pub fn config(&self) -> ScopeConfig {
        self.store.config()
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Mark the store ready and activate every binding waiting on it
    ///
    /// Idempotent: only the first call activates anything. Returns the
    /// number of bindings activated. Observers see the store ready only
    /// after those bindings are visible to lookups.
    pub fn mark_ready(&self) -> usize {
        let Some(waiters) = self.store.take_waiters() else {
            return 0;
        };
        let activated = waiters
            .into_iter()
            .map(|waiter| activate_waiter(waiter, &self.events))
            .filter(|activated| *activated)
            .count();
        self.store.publish_ready();

        info!(scope = %self.store.label(), activated, "Scope ready");
        self.events.emit(EventKind::ScopeReady {
            scope: Arc::clone(self.store.label()),
            activated,
        });
        activated
    }

    /// Wait until the store is ready
    ///
    /// `None` waits indefinitely. A timeout is an opt-in startup guard and
    /// fails with `ActivationTimeout`.
    pub async fn wait_ready(&self, timeout: Option<Duration>) -> Result<()> {
        let mut rx = self.store.ready_tx.subscribe();
        let wait = async {
            // Sender lives in the store we hold, so the channel never closes
            let _ = rx.wait_for(|ready| *ready).await;
        };
        match timeout {
            None => {
                wait.await;
                Ok(())
            }
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                BinderError::ActivationTimeout {
                    scope: self.store.label().to_string(),
                    waited: limit,
                }
            }),
        }
    }

    /// Register a pending binding against this dependency
    pub(crate) fn register(&self, waiter: Waiter) {
        if let Some(waiter) = self.store.enqueue(waiter) {
            activate_waiter(waiter, &self.events);
        }
    }
}

impl std::fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("scope", self.store.scope())
            .field("ready", &self.is_ready())
            .finish()
    }
}
