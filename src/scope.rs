//! Scopes: namespace partitions of the registry

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Namespace partition within which binding names are unique
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Global,
    Application(Arc<str>),
}

impl Scope {
    pub fn application(id: impl Into<Arc<str>>) -> Self {
        Scope::Application(id.into())
    }

    /// Application id for application scopes
    pub fn application_id(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Application(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Application(id) => write!(f, "app/{}", id),
        }
    }
}

/// Backing store configuration, fixed at creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Store is ready as soon as it is created
    #[serde(default)]
    pub ready_on_create: bool,
}

impl ScopeConfig {
    /// Config for a store that accepts bindings immediately
    pub fn ready() -> Self {
        Self {
            ready_on_create: true,
        }
    }

    /// Config for a store that waits for an explicit `mark_ready`
    pub fn deferred() -> Self {
        Self::default()
    }
}
