use serde_json::{Map, Value};

/// Context passed alongside an error into recovery execution.
///
/// The `component` field drives policy resolution: when present it wins over
/// classification by error kind. The value map carries whatever the caller
/// wants visible to hooks (symbol, order id, venue).
#[derive(Debug, Clone, Default)]
pub struct RecoveryContext {
    component: Option<String>,
    values: Map<String, Value>,
}

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that resolves to the given component's policy.
    pub fn for_component(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            values: Map::new(),
        }
    }

    /// Adds a value visible to recovery hooks.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}
