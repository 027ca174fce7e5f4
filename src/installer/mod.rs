//! Binding installer - startup hook for one deployment
//!
//! Resolves the application id from the deployment context, then binds
//! every configured value (global scope first, then the application
//! scope). Each binding depends on its own scope's store being ready.
//! The first failing bind aborts the install; nothing already bound is
//! rolled back.

mod config;
mod context;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::provider::{StringProvider, ValueProvider};
use crate::registry::{BindingHandle, DeploymentId, ScopeHandle};

pub use config::{
    BindingSpec, BindingsConfig, ScopeKind, APP_BINDING_NAME, APP_BINDING_VALUE,
    GLOBAL_BINDING_NAME, GLOBAL_BINDING_VALUE, SCHEMA,
};
pub use context::{
    application_id_from_module, ArchiveContext, DeploymentContext, EnvContext, StaticContext,
    APP_ID_ENV, MODULE_PREFIX,
};

#[derive(Debug, Clone, Default)]
pub struct BindingInstaller {
    config: BindingsConfig,
}

impl BindingInstaller {
    pub fn new(config: BindingsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BindingsConfig {
        &self.config
    }

    /// Bind every configured value for the deployment behind `ctx`
    #[instrument(skip_all)]
    pub fn install(&self, ctx: &dyn DeploymentContext) -> Result<InstallReport> {
        let application_id = ctx.resolve_application_id()?;
        let registry = ctx.registry();
        let owner = DeploymentId::new(application_id.as_str());

        info!(
            application_id = %application_id,
            bindings = self.config.bindings.len(),
            "Installing bindings"
        );

        let mut report = InstallReport {
            application_id,
            owner: owner.clone(),
            bindings: Vec::with_capacity(self.config.bindings.len()),
            dependencies: Vec::new(),
            startup_timeout: self.config.startup_timeout(),
        };

        for spec in self.config.ordered() {
            let scope = spec.scope.resolve(&report.application_id);
            let dependency = registry.ensure_scope(&scope);
            let provider: Arc<dyn ValueProvider> = Arc::new(StringProvider::new(spec.value.as_str()));

            let handle = registry.bind_owned(
                spec.name.clone(),
                &scope,
                provider,
                &dependency,
                Some(owner.clone()),
            )?;
            debug!(scope = %scope, name = %spec.name, state = %handle.state(), "Bound");

            report.bindings.push(handle);
            if !report.dependencies.iter().any(|d| d.scope() == dependency.scope()) {
                report.dependencies.push(dependency);
            }
        }

        Ok(report)
    }
}

/// Outcome of one successful `install`
#[derive(Debug, Clone)]
pub struct InstallReport {
    application_id: String,
    owner: DeploymentId,
    bindings: Vec<BindingHandle>,
    dependencies: Vec<ScopeHandle>,
    startup_timeout: Option<Duration>,
}

impl InstallReport {
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Owner recorded on every binding; pass to `NameRegistry::teardown`
    pub fn owner(&self) -> &DeploymentId {
        &self.owner
    }

    /// Bindings in install order
    pub fn bindings(&self) -> &[BindingHandle] {
        &self.bindings
    }

    /// Distinct scope stores the bindings depend on
    pub fn dependencies(&self) -> &[ScopeHandle] {
        &self.dependencies
    }

    pub fn all_active(&self) -> bool {
        self.bindings.iter().all(BindingHandle::is_active)
    }

    pub fn pending(&self) -> usize {
        self.bindings.iter().filter(|b| !b.is_active()).count()
    }

    /// Wait for every dependency to become ready
    ///
    /// Waits indefinitely unless the bindings file set
    /// `startup_timeout_ms`, in which case each dependency gets that long
    /// before `ActivationTimeout`.
    pub async fn wait_active(&self) -> Result<()> {
        for dependency in &self.dependencies {
            dependency.wait_ready(self.startup_timeout).await?;
        }
        Ok(())
    }
}
