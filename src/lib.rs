//! Binder - scoped name registry with dependency-ordered bindings
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`registry`] | `NameRegistry`: scopes, bind/lookup/unbind, readiness |
//! | [`installer`] | `BindingInstaller`: per-deployment startup hook |
//! | [`name`] | Hierarchical binding names |
//! | [`scope`] | `Global` / `Application(id)` scopes and their config |
//! | [`provider`] | `ValueProvider` capability objects |
//! | [`event_log`] | Audit trail of scope and binding transitions |
//! | [`error`] | Error types with fix suggestions |

pub mod error;
pub mod event_log;
pub mod installer;
pub mod name;
pub mod provider;
pub mod registry;
pub mod scope;

pub use error::{BinderError, FixSuggestion, Result};
pub use event_log::{Event, EventKind, EventLog, DEFAULT_EVENT_CAPACITY};
pub use installer::{
    ArchiveContext, BindingInstaller, BindingSpec, BindingsConfig, DeploymentContext, EnvContext,
    InstallReport, ScopeKind, StaticContext,
};
pub use name::Name;
pub use provider::{StringProvider, ValueProvider};
pub use registry::{BindingHandle, BindingState, DeploymentId, NameRegistry, ScopeHandle};
pub use scope::{Scope, ScopeConfig};
