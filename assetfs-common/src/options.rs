use serde_json::{Map, Value};

/// Options supplied with a single call.
///
/// Remote-specific settings live in a nested block keyed by the remote's
/// name (e.g. `{"cloudinary": {"secure": false}}`); everything else is
/// ignored by adapters that do not recognize it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    values: Map<String, Value>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Set a top-level option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set an option inside the nested block for `remote`.
    pub fn with_remote(
        mut self,
        remote: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let block = self
            .values
            .entry(remote.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !block.is_object() {
            *block = Value::Object(Map::new());
        }
        if let Value::Object(map) = block {
            map.insert(key.into(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The override block for `remote`, or an empty map.
    pub fn remote_block(&self, remote: &str) -> Map<String, Value> {
        self.values
            .get(remote)
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default()
    }
}
