//! Value providers: what a binding hands out on lookup

use std::sync::Arc;

use serde_json::Value;

/// Capability object producing a value on demand
///
/// `release` is called by the registry exactly once when the binding is
/// removed through its lifecycle (unbind or owner teardown). Plain lookups
/// never call it.
pub trait ValueProvider: Send + Sync {
    fn get_instance(&self) -> Value;

    fn release(&self) {}
}

/// Provider backed by a fixed string
#[derive(Debug, Clone)]
pub struct StringProvider {
    value: Arc<str>,
}

impl StringProvider {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Boxed as a trait object, ready for `NameRegistry::bind`
    pub fn shared(value: impl Into<Arc<str>>) -> Arc<dyn ValueProvider> {
        Arc::new(Self::new(value))
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl ValueProvider for StringProvider {
    fn get_instance(&self) -> Value {
        Value::String(self.value.to_string())
    }

    fn release(&self) {
        tracing::trace!(value = %self.value, "String provider released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_provider_returns_value() {
        let provider = StringProvider::new("Hello World!");
        assert_eq!(provider.get_instance(), Value::String("Hello World!".into()));
        assert_eq!(provider.value(), "Hello World!");
    }

    #[test]
    fn repeated_instances_are_equal() {
        let provider = StringProvider::shared("x");
        assert_eq!(provider.get_instance(), provider.get_instance());
    }
}
