//! Binding entries, lifecycle state and handles

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::name::Name;
use crate::provider::ValueProvider;
use crate::scope::Scope;

/// Binding lifecycle: `Pending -> Active -> Released`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingState {
    /// Dependency not ready, invisible to lookups
    Pending,
    /// Visible to lookups
    Active,
    /// Terminal
    Released,
}

impl BindingState {
    fn as_u8(self) -> u8 {
        match self {
            BindingState::Pending => 0,
            BindingState::Active => 1,
            BindingState::Released => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => BindingState::Pending,
            1 => BindingState::Active,
            _ => BindingState::Released,
        }
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingState::Pending => f.write_str("pending"),
            BindingState::Active => f.write_str("active"),
            BindingState::Released => f.write_str("released"),
        }
    }
}

/// Shared state cell, readable from handles without taking the scope lock
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(BindingState::Pending.as_u8()))
    }

    pub(crate) fn get(&self) -> BindingState {
        BindingState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Pending -> Active`; false if the binding was not pending
    pub(crate) fn activate(&self) -> bool {
        self.0
            .compare_exchange(
                BindingState::Pending.as_u8(),
                BindingState::Active.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Any state -> `Released`; false if already released
    pub(crate) fn release(&self) -> bool {
        self.0.swap(BindingState::Released.as_u8(), Ordering::AcqRel)
            != BindingState::Released.as_u8()
    }
}

/// Deployment unit owning a set of bindings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(Arc<str>);

impl DeploymentId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeploymentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored binding (lives inside a scope's map)
pub(crate) struct BindingEntry {
    pub(crate) id: u64,
    pub(crate) provider: Arc<dyn ValueProvider>,
    pub(crate) state: Arc<StateCell>,
    /// Owner whose teardown removes (and releases) this binding
    pub(crate) owner: Option<DeploymentId>,
}

impl BindingEntry {
    pub(crate) fn new(id: u64, provider: Arc<dyn ValueProvider>, owner: Option<DeploymentId>) -> Self {
        Self {
            id,
            provider,
            state: Arc::new(StateCell::new()),
            owner,
        }
    }

    /// Mark released and call the provider hook, at most once
    pub(crate) fn release(&self) -> bool {
        if self.state.release() {
            self.provider.release();
            true
        } else {
            false
        }
    }
}

/// Caller-side view of one registered binding
#[derive(Debug, Clone)]
pub struct BindingHandle {
    pub(crate) id: u64,
    pub(crate) name: Name,
    pub(crate) scope: Scope,
    pub(crate) owner: Option<DeploymentId>,
    pub(crate) state: Arc<StateCell>,
}

impl BindingHandle {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn owner(&self) -> Option<&DeploymentId> {
        self.owner.as_ref()
    }

    pub fn state(&self) -> BindingState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state() == BindingState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StringProvider;
    use std::sync::atomic::AtomicUsize;

    struct Counting(Arc<AtomicUsize>);

    impl ValueProvider for Counting {
        fn get_instance(&self) -> serde_json::Value {
            serde_json::Value::Null
        }

        fn release(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn state_transitions() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), BindingState::Pending);
        assert!(cell.activate());
        assert!(!cell.activate());
        assert_eq!(cell.get(), BindingState::Active);
        assert!(cell.release());
        assert!(!cell.release());
        assert!(!cell.activate());
        assert_eq!(cell.get(), BindingState::Released);
    }

    #[test]
    fn entry_release_calls_provider_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let entry = BindingEntry::new(1, Arc::new(Counting(count.clone())), None);
        assert!(entry.release());
        assert!(!entry.release());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pending_entry_can_be_released() {
        let entry = BindingEntry::new(7, StringProvider::shared("x"), Some("shop".into()));
        assert_eq!(entry.state.get(), BindingState::Pending);
        assert!(entry.release());
        assert_eq!(entry.state.get(), BindingState::Released);
    }

    #[test]
    fn state_display() {
        assert_eq!(BindingState::Pending.to_string(), "pending");
        assert_eq!(BindingState::Released.to_string(), "released");
    }
}
