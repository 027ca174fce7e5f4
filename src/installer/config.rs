//! Bindings file (YAML)
//!
//! ```yaml
//! schema: binder/bindings@0.1
//! bindings:
//!   - name: global-binding
//!     scope: global
//!     value: Hello World!
//!   - name: app-binding
//!     scope: application
//!     value: Hello Application!
//! startup_timeout_ms: 5000
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BinderError, Result};
use crate::name::Name;
use crate::scope::Scope;

/// Accepted schema marker
pub const SCHEMA: &str = "binder/bindings@0.1";

pub const GLOBAL_BINDING_NAME: &str = "global-binding";
pub const GLOBAL_BINDING_VALUE: &str = "Hello World!";
pub const APP_BINDING_NAME: &str = "app-binding";
pub const APP_BINDING_VALUE: &str = "Hello Application!";

/// Which scope a configured binding lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Global,
    Application,
}

impl ScopeKind {
    /// Concrete scope for the deployment's application id
    pub fn resolve(self, application_id: &str) -> Scope {
        match self {
            ScopeKind::Global => Scope::Global,
            ScopeKind::Application => Scope::application(application_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub name: Name,
    pub scope: ScopeKind,
    pub value: String,
}

impl BindingSpec {
    pub fn new(name: Name, scope: ScopeKind, value: impl Into<String>) -> Self {
        Self {
            name,
            scope,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingsConfig {
    pub schema: String,
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
    /// Optional guard for `InstallReport::wait_active`; absent means wait forever
    #[serde(default)]
    pub startup_timeout_ms: Option<u64>,
}

impl BindingsConfig {
    /// The two built-in bindings
    pub fn defaults() -> Self {
        let spec = |name: &str, scope, value: &str| {
            let name = Name::parse(name).expect("built-in binding names are valid");
            BindingSpec::new(name, scope, value)
        };
        Self {
            schema: SCHEMA.to_string(),
            bindings: vec![
                spec(GLOBAL_BINDING_NAME, ScopeKind::Global, GLOBAL_BINDING_VALUE),
                spec(APP_BINDING_NAME, ScopeKind::Application, APP_BINDING_VALUE),
            ],
            startup_timeout_ms: None,
        }
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BindingsConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a bindings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema != SCHEMA {
            return Err(BinderError::InvalidConfig {
                reason: format!("expected schema '{}', got '{}'", SCHEMA, self.schema),
            });
        }
        if self.bindings.is_empty() {
            return Err(BinderError::InvalidConfig {
                reason: "no bindings declared".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for spec in &self.bindings {
            if !seen.insert((spec.scope, &spec.name)) {
                return Err(BinderError::InvalidConfig {
                    reason: format!(
                        "'{}' declared twice for scope '{}'",
                        spec.name,
                        scope_kind_label(spec.scope)
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn startup_timeout(&self) -> Option<Duration> {
        self.startup_timeout_ms.map(Duration::from_millis)
    }

    /// Bindings in install order: global entries first, then application
    /// entries, each group keeping file order
    pub fn ordered(&self) -> Vec<&BindingSpec> {
        let (global, application): (Vec<&BindingSpec>, Vec<&BindingSpec>) = self
            .bindings
            .iter()
            .partition(|spec| spec.scope == ScopeKind::Global);
        global.into_iter().chain(application).collect()
    }
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

fn scope_kind_label(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::Global => "global",
        ScopeKind::Application => "application",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_have_both_bindings() {
        let config = BindingsConfig::defaults();
        config.validate().unwrap();
        assert_eq!(config.bindings.len(), 2);
        assert_eq!(config.bindings[0].name.to_string(), GLOBAL_BINDING_NAME);
        assert_eq!(config.bindings[0].scope, ScopeKind::Global);
        assert_eq!(config.bindings[1].name.to_string(), APP_BINDING_NAME);
        assert_eq!(config.bindings[1].scope, ScopeKind::Application);
        assert_eq!(config.bindings[1].value, APP_BINDING_VALUE);
        assert_eq!(config.startup_timeout(), None);
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
schema: binder/bindings@0.1
bindings:
  - name: env/greeting
    scope: application
    value: Hi
  - name: motd
    scope: global
    value: Welcome
startup_timeout_ms: 250
"#;
        let config = BindingsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bindings.len(), 2);
        assert_eq!(config.bindings[0].name.depth(), 2);
        assert_eq!(config.startup_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn ordered_puts_global_first_stably() {
        let yaml = r#"
schema: binder/bindings@0.1
bindings:
  - { name: a1, scope: application, value: x }
  - { name: g1, scope: global, value: x }
  - { name: a2, scope: application, value: x }
  - { name: g2, scope: global, value: x }
"#;
        let config = BindingsConfig::from_yaml(yaml).unwrap();
        let order: Vec<String> = config.ordered().iter().map(|s| s.name.to_string()).collect();
        assert_eq!(order, ["g1", "g2", "a1", "a2"]);
    }

    #[test]
    fn rejects_wrong_schema() {
        let yaml = "schema: other@1\nbindings:\n  - { name: a, scope: global, value: x }\n";
        let err = BindingsConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, BinderError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_empty_bindings() {
        let err = BindingsConfig::from_yaml("schema: binder/bindings@0.1\n").unwrap_err();
        assert!(err.to_string().contains("no bindings"));
    }

    #[test]
    fn rejects_duplicate_in_same_scope_only() {
        let dup = r#"
schema: binder/bindings@0.1
bindings:
  - { name: a, scope: global, value: x }
  - { name: a, scope: global, value: y }
"#;
        assert!(BindingsConfig::from_yaml(dup).is_err());

        let split = r#"
schema: binder/bindings@0.1
bindings:
  - { name: a, scope: global, value: x }
  - { name: a, scope: application, value: y }
"#;
        assert!(BindingsConfig::from_yaml(split).is_ok());
    }

    #[test]
    fn invalid_name_is_a_parse_error() {
        let yaml = "schema: binder/bindings@0.1\nbindings:\n  - { name: 'bad name', scope: global, value: x }\n";
        assert!(matches!(
            BindingsConfig::from_yaml(yaml),
            Err(BinderError::YamlParse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bindings.yaml");
        fs::write(&path, serde_yaml::to_string(&BindingsConfig::defaults()).unwrap()).unwrap();

        let loaded = BindingsConfig::load(&path).unwrap();
        assert_eq!(loaded, BindingsConfig::defaults());

        assert!(matches!(
            BindingsConfig::load(dir.path().join("missing.yaml")),
            Err(BinderError::Io(_))
        ));
    }

    #[test]
    fn scope_kind_resolves() {
        assert_eq!(ScopeKind::Global.resolve("shop"), Scope::Global);
        assert_eq!(ScopeKind::Application.resolve("shop"), Scope::application("shop"));
    }
}
