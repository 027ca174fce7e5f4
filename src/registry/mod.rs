//! Registry Module - scoped name registry
//!
//! Key types:
//! - `NameRegistry`: scope table and bind/lookup/unbind operations
//! - `ScopeHandle`: a scope's backing store, used as a binding dependency
//! - `BindingHandle`: caller-side view of one binding
//! - `BindingState`: Pending → Active → Released

mod binding;
mod name_registry;
mod scope_store;

pub use binding::{BindingHandle, BindingState, DeploymentId};
pub use name_registry::NameRegistry;
pub use scope_store::ScopeHandle;
