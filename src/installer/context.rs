//! Deployment contexts: where the application id comes from

use crate::error::{BinderError, Result};
use crate::registry::NameRegistry;

/// Environment variable read by `EnvContext`
pub const APP_ID_ENV: &str = "BINDER_APP_ID";

/// Prefix of deployment module identifiers
pub const MODULE_PREFIX: &str = "deployment.";

/// What an installer needs from the deployment it runs in
pub trait DeploymentContext: Send + Sync {
    /// Application id, stable for the deployment's lifetime
    fn resolve_application_id(&self) -> Result<String>;

    /// Registry the deployment binds into
    fn registry(&self) -> &NameRegistry;
}

/// Fixed application id
#[derive(Debug, Clone)]
pub struct StaticContext {
    application_id: String,
    registry: NameRegistry,
}

impl StaticContext {
    pub fn new(application_id: impl Into<String>, registry: NameRegistry) -> Self {
        Self {
            application_id: application_id.into(),
            registry,
        }
    }
}

impl DeploymentContext for StaticContext {
    fn resolve_application_id(&self) -> Result<String> {
        non_empty(&self.application_id, "application id is empty")
    }

    fn registry(&self) -> &NameRegistry {
        &self.registry
    }
}

/// Application id from an environment variable (`BINDER_APP_ID` by default)
#[derive(Debug, Clone)]
pub struct EnvContext {
    var: String,
    registry: NameRegistry,
}

impl EnvContext {
    pub fn new(registry: NameRegistry) -> Self {
        Self::with_var(APP_ID_ENV, registry)
    }

    pub fn with_var(var: impl Into<String>, registry: NameRegistry) -> Self {
        Self {
            var: var.into(),
            registry,
        }
    }
}

impl DeploymentContext for EnvContext {
    fn resolve_application_id(&self) -> Result<String> {
        let value = std::env::var(&self.var).map_err(|_| BinderError::ApplicationIdUnresolvable {
            reason: format!("{} is not set", self.var),
        })?;
        non_empty(value.trim(), &format!("{} is empty", self.var))
    }

    fn registry(&self) -> &NameRegistry {
        &self.registry
    }
}

/// Application id derived from a deployment module identifier
///
/// `deployment.shop.war` resolves to `shop`.
#[derive(Debug, Clone)]
pub struct ArchiveContext {
    module_identifier: String,
    registry: NameRegistry,
}

impl ArchiveContext {
    pub fn new(module_identifier: impl Into<String>, registry: NameRegistry) -> Self {
        Self {
            module_identifier: module_identifier.into(),
            registry,
        }
    }
}

impl DeploymentContext for ArchiveContext {
    fn resolve_application_id(&self) -> Result<String> {
        application_id_from_module(&self.module_identifier)
    }

    fn registry(&self) -> &NameRegistry {
        &self.registry
    }
}

/// Strip the `deployment.` prefix and the archive extension
///
/// The extension is a dot plus three characters (`.war`, `.ear`, `.jar`).
pub fn application_id_from_module(module_identifier: &str) -> Result<String> {
    let unresolvable = |reason: String| BinderError::ApplicationIdUnresolvable { reason };

    let archive = module_identifier.strip_prefix(MODULE_PREFIX).ok_or_else(|| {
        unresolvable(format!(
            "module '{}' does not start with '{}'",
            module_identifier, MODULE_PREFIX
        ))
    })?;

    let stem = match archive.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().count() == 3 && !stem.is_empty() => stem,
        _ => {
            return Err(unresolvable(format!(
                "archive '{}' has no three-letter extension",
                archive
            )))
        }
    };
    Ok(stem.to_string())
}

fn non_empty(value: &str, reason: &str) -> Result<String> {
    if value.is_empty() {
        return Err(BinderError::ApplicationIdUnresolvable {
            reason: reason.to_string(),
        });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names_resolve() {
        assert_eq!(application_id_from_module("deployment.shop.war").unwrap(), "shop");
        assert_eq!(
            application_id_from_module("deployment.jndi-example.ear").unwrap(),
            "jndi-example"
        );
        assert_eq!(
            application_id_from_module("deployment.my.app.jar").unwrap(),
            "my.app"
        );
    }

    #[test]
    fn archive_extension_counts_characters() {
        assert_eq!(application_id_from_module("deployment.shop.wär").unwrap(), "shop");
        assert_eq!(application_id_from_module("deployment.café.日本語").unwrap(), "café");
        assert!(application_id_from_module("deployment.shop.wa").is_err());
    }

    #[test]
    fn archive_names_without_prefix_fail() {
        let err = application_id_from_module("shop.war").unwrap_err();
        assert!(matches!(err, BinderError::ApplicationIdUnresolvable { .. }));
    }

    #[test]
    fn archive_names_without_extension_fail() {
        assert!(application_id_from_module("deployment.shop").is_err());
        assert!(application_id_from_module("deployment..war").is_err());
        assert!(application_id_from_module("deployment.shop.tar.gz").is_err());
    }

    #[test]
    fn static_context_rejects_empty() {
        let ctx = StaticContext::new("", NameRegistry::new());
        assert!(ctx.resolve_application_id().is_err());

        let ctx = StaticContext::new("shop", NameRegistry::new());
        assert_eq!(ctx.resolve_application_id().unwrap(), "shop");
    }

    #[test]
    fn env_context_reads_variable() {
        let var = "BINDER_TEST_APP_ID_CONTEXT";
        std::env::set_var(var, "inventory");
        let ctx = EnvContext::with_var(var, NameRegistry::new());
        assert_eq!(ctx.resolve_application_id().unwrap(), "inventory");
        std::env::remove_var(var);
        assert!(matches!(
            ctx.resolve_application_id(),
            Err(BinderError::ApplicationIdUnresolvable { .. })
        ));
    }
}
