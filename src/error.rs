//! Error types with fix suggestions
//!
//! Error code ranges:
//! - BIND-000-009: Bindings file / CLI errors
//! - BIND-010-019: Scope errors
//! - BIND-020-029: Binding errors
//! - BIND-030-039: Installation errors

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BinderError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Bindings file errors (BIND-001 to BIND-002)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-001: Invalid bindings file: {reason}")]
    InvalidConfig { reason: String },

    #[error("BIND-002: Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Scope errors (BIND-010 to BIND-013)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-010: Scope '{scope}' already exists with a different configuration")]
    ScopeConflict { scope: String },

    #[error("BIND-011: Scope '{scope}' has not been created")]
    UnknownScope { scope: String },

    /// Only seen inside the registry; lookups report it as `NotFound`.
    #[error("BIND-012: Scope '{scope}' is not ready yet")]
    DependencyUnready { scope: String },

    #[error("BIND-013: Scope '{scope}' did not become ready within {waited:?}")]
    ActivationTimeout { scope: String, waited: Duration },

    // ─────────────────────────────────────────────────────────────
    // Binding errors (BIND-020 to BIND-022)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-020: '{name}' is already bound in scope '{scope}'")]
    DuplicateName { name: String, scope: String },

    #[error("BIND-021: '{name}' not found in scope '{scope}'")]
    NotFound { name: String, scope: String },

    #[error("BIND-022: '{name}' is not bound in scope '{scope}'")]
    NotBound { name: String, scope: String },

    // ─────────────────────────────────────────────────────────────
    // Installation errors (BIND-030)
    // ─────────────────────────────────────────────────────────────
    #[error("BIND-030: Cannot resolve application id: {reason}")]
    ApplicationIdUnresolvable { reason: String },
}

impl BinderError {
    /// Stable error code (e.g. "BIND-020"), if the variant carries one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            BinderError::YamlParse(_) | BinderError::Io(_) => None,
            BinderError::InvalidConfig { .. } => Some("BIND-001"),
            BinderError::InvalidName { .. } => Some("BIND-002"),
            BinderError::ScopeConflict { .. } => Some("BIND-010"),
            BinderError::UnknownScope { .. } => Some("BIND-011"),
            BinderError::DependencyUnready { .. } => Some("BIND-012"),
            BinderError::ActivationTimeout { .. } => Some("BIND-013"),
            BinderError::DuplicateName { .. } => Some("BIND-020"),
            BinderError::NotFound { .. } => Some("BIND-021"),
            BinderError::NotBound { .. } => Some("BIND-022"),
            BinderError::ApplicationIdUnresolvable { .. } => Some("BIND-030"),
        }
    }
}

impl FixSuggestion for BinderError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BinderError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            BinderError::Io(_) => Some("Check file path and permissions"),
            BinderError::InvalidConfig { .. } => {
                Some("Use 'schema: binder/bindings@0.1' and at least one binding")
            }
            BinderError::InvalidName { .. } => {
                Some("Use '/'-separated segments of letters, digits, '.', '_' or '-'")
            }
            BinderError::ScopeConflict { .. } => {
                Some("Create the scope once, or reuse the existing handle")
            }
            BinderError::UnknownScope { .. } => Some("Create the scope before binding into it"),
            BinderError::DependencyUnready { .. } => {
                Some("Mark the dependency scope ready to activate its bindings")
            }
            BinderError::ActivationTimeout { .. } => {
                Some("Increase startup_timeout_ms or check who marks the scope ready")
            }
            BinderError::DuplicateName { .. } => {
                Some("Unbind the existing name first or choose a different name")
            }
            BinderError::NotFound { .. } => {
                Some("Verify the name is bound and its scope has been marked ready")
            }
            BinderError::NotBound { .. } => Some("The binding was already removed"),
            BinderError::ApplicationIdUnresolvable { .. } => {
                Some("Pass --app-id, set BINDER_APP_ID, or use a 'deployment.<name>.<ext>' module id")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = BinderError::DuplicateName {
            name: "global-binding".into(),
            scope: "global".into(),
        };
        assert_eq!(
            err.to_string(),
            "BIND-020: 'global-binding' is already bound in scope 'global'"
        );
        assert_eq!(err.code(), Some("BIND-020"));
    }

    #[test]
    fn every_coded_error_has_a_suggestion() {
        let errors = [
            BinderError::InvalidConfig { reason: "x".into() },
            BinderError::ScopeConflict { scope: "global".into() },
            BinderError::NotBound {
                name: "a".into(),
                scope: "global".into(),
            },
            BinderError::ApplicationIdUnresolvable { reason: "x".into() },
        ];
        for err in errors {
            assert!(err.code().is_some());
            assert!(err.fix_suggestion().is_some());
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BinderError = io.into();
        assert!(matches!(err, BinderError::Io(_)));
        assert_eq!(err.code(), None);
    }
}
