//! Runtime configuration.

use serde::{Deserialize, Serialize};

use memory_manager::HeapConfig;

/// Configuration of a [`Runtime`](crate::Runtime).
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
///
/// # Example
///
/// ```
/// use runtime_module::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "heap_capacity": 1024 }"#).unwrap();
/// assert_eq!(config.heap_capacity, 1024);
/// assert!(config.verify_single_persistent);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Object slots reserved in the heap up front
    pub heap_capacity: usize,
    /// Weak-reference cells reserved up front
    pub weak_ref_capacity: usize,
    /// Identifiers reserved in the identifier table up front
    pub identifier_capacity: usize,
    /// Warn when more than one persistent module is registered
    pub verify_single_persistent: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            heap_capacity: 256,
            weak_ref_capacity: 64,
            identifier_capacity: 1024,
            verify_single_persistent: true,
        }
    }
}

impl RuntimeConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Heap sizing derived from this configuration.
    pub fn heap_config(&self) -> HeapConfig {
        HeapConfig {
            initial_capacity: self.heap_capacity,
            weak_slot_capacity: self.weak_ref_capacity,
        }
    }
}
