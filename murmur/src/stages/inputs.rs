//! Resolved inputs handed to a stage.

use crate::core::OutputBag;
use anyhow::anyhow;
use std::collections::BTreeSet;

/// The input bag for one `Stage::process` call.
///
/// Values are already resolved from literals, configuration and upstream
/// outputs. Keys whose reference could not be resolved are present as
/// `null` and listed in [`StageInputs::missing`], so a stage can tell an
/// explicit `null` from an absent config key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageInputs {
    /// The node being processed (for error messages).
    node: String,
    /// Input values keyed by input name.
    values: OutputBag,
    /// Keys whose wiring resolved to the missing marker.
    missing: BTreeSet<String>,
}

impl StageInputs {
    /// Creates stage inputs with every key resolved.
    #[must_use]
    pub fn new(node: impl Into<String>, values: OutputBag) -> Self {
        Self {
            node: node.into(),
            values,
            missing: BTreeSet::new(),
        }
    }

    /// Records keys that resolved to the missing marker.
    #[must_use]
    pub fn with_missing(mut self, missing: impl IntoIterator<Item = String>) -> Self {
        self.missing.extend(missing);
        self
    }

    /// Returns the node being processed.
    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Gets an input value. Unresolved keys yield `Some(Null)`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Gets an input value as a string slice.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(serde_json::Value::as_str)
    }

    /// Gets an input value, failing if it is absent or unresolved.
    ///
    /// # Errors
    ///
    /// Returns an error naming the node and key.
    pub fn require(&self, key: &str) -> anyhow::Result<&serde_json::Value> {
        match self.values.get(key) {
            Some(value) if !self.missing.contains(key) => Ok(value),
            _ => Err(anyhow!("node '{}' requires input '{key}'", self.node)),
        }
    }

    /// Returns true if the key's reference could not be resolved.
    #[must_use]
    pub fn is_missing(&self, key: &str) -> bool {
        self.missing.contains(key)
    }

    /// Returns the keys whose references could not be resolved.
    #[must_use]
    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    /// Returns all input values.
    #[must_use]
    pub fn values(&self) -> &OutputBag {
        &self.values
    }

    /// Consumes the inputs and returns the values.
    #[must_use]
    pub fn into_values(self) -> OutputBag {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs() -> StageInputs {
        let mut values = OutputBag::new();
        values.insert("script".to_string(), json!("Hello"));
        values.insert("voice".to_string(), serde_json::Value::Null);
        StageInputs::new("synthesize", values).with_missing(["voice".to_string()])
    }

    #[test]
    fn test_get_and_get_str() {
        let inputs = inputs();

        assert_eq!(inputs.get_str("script"), Some("Hello"));
        assert_eq!(inputs.get("voice"), Some(&serde_json::Value::Null));
        assert_eq!(inputs.get("absent"), None);
        assert_eq!(inputs.node(), "synthesize");
    }

    #[test]
    fn test_require_rejects_missing_marker() {
        let inputs = inputs();

        assert!(inputs.require("script").is_ok());
        let err = inputs.require("voice").unwrap_err();
        assert_eq!(err.to_string(), "node 'synthesize' requires input 'voice'");
        assert!(inputs.require("absent").is_err());
        assert!(inputs.is_missing("voice"));
    }
}
