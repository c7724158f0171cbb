//! Input resolution against configuration and upstream outputs.

use super::spec::NodeDefinition;
use super::wiring::Wiring;
use crate::config::ConfigBag;
use crate::core::OutputBag;
use crate::stages::StageInputs;
use std::collections::BTreeMap;

/// The outcome of resolving one wiring expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The reference resolved to a value (possibly an explicit `null`).
    Value(serde_json::Value),
    /// The config key or upstream output does not exist.
    Missing,
}

impl Resolution {
    /// Returns true for the missing marker.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the value, mapping the missing marker to `null`.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Value(value) => value,
            Self::Missing => serde_json::Value::Null,
        }
    }
}

/// Resolves wiring for one run.
///
/// Reads the configuration bag and the outputs recorded so far; never
/// mutates either.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a ConfigBag,
    outputs: &'a BTreeMap<String, OutputBag>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over a config bag and the recorded node outputs.
    #[must_use]
    pub fn new(config: &'a ConfigBag, outputs: &'a BTreeMap<String, OutputBag>) -> Self {
        Self { config, outputs }
    }

    /// Resolves a single wiring expression.
    ///
    /// Missing elements of a list become `null` in place, so the list keeps
    /// its length.
    #[must_use]
    pub fn resolve(&self, wiring: &Wiring) -> Resolution {
        match wiring {
            Wiring::Literal(value) => Resolution::Value(value.clone()),
            Wiring::Config(key) => self
                .config
                .get(key)
                .cloned()
                .map_or(Resolution::Missing, Resolution::Value),
            Wiring::Node { node, output } => self
                .outputs
                .get(node)
                .and_then(|bag| bag.get(output))
                .cloned()
                .map_or(Resolution::Missing, Resolution::Value),
            Wiring::List(items) => Resolution::Value(serde_json::Value::Array(
                items.iter().map(|item| self.resolve(item).into_value()).collect(),
            )),
        }
    }

    /// Resolves every input of a node into a stage input bag.
    ///
    /// A top-level input that resolves to the missing marker is passed as
    /// `null`, recorded in [`StageInputs::missing`] and logged as a warning.
    /// A `required` key the node never wires is treated the same way.
    #[must_use]
    pub fn resolve_inputs(&self, node: &NodeDefinition, required: &[String]) -> StageInputs {
        let mut values = OutputBag::new();
        let mut missing = Vec::new();

        for (key, wiring) in &node.inputs {
            let resolution = self.resolve(wiring);
            if resolution.is_missing() {
                tracing::warn!(
                    node = %node.name,
                    input = %key,
                    reference = %wiring,
                    "Input reference did not resolve; passing null"
                );
                missing.push(key.clone());
            }
            values.insert(key.clone(), resolution.into_value());
        }

        for key in required {
            if !values.contains_key(key) {
                tracing::warn!(
                    node = %node.name,
                    input = %key,
                    "Required input is not wired; passing null"
                );
                missing.push(key.clone());
                values.insert(key.clone(), serde_json::Value::Null);
            }
        }

        StageInputs::new(node.name.clone(), values).with_missing(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixtures() -> (ConfigBag, BTreeMap<String, OutputBag>) {
        let config = ConfigBag::new()
            .with("start", json!(5))
            .with("explicit_null", serde_json::Value::Null);

        let mut gather = OutputBag::new();
        gather.insert("value".to_string(), json!(5));
        gather.insert("source".to_string(), json!({"name": "news", "data": []}));
        let mut outputs = BTreeMap::new();
        outputs.insert("gather".to_string(), gather);

        (config, outputs)
    }

    #[test]
    fn test_resolve_each_form() {
        let (config, outputs) = fixtures();
        let resolver = Resolver::new(&config, &outputs);

        assert_eq!(resolver.resolve(&Wiring::literal("x")), Resolution::Value(json!("x")));
        assert_eq!(resolver.resolve(&Wiring::config("start")), Resolution::Value(json!(5)));
        assert_eq!(resolver.resolve(&Wiring::node("gather", "value")), Resolution::Value(json!(5)));
        assert_eq!(resolver.resolve(&Wiring::config("absent")), Resolution::Missing);
        assert_eq!(resolver.resolve(&Wiring::node("gather", "absent")), Resolution::Missing);
        assert_eq!(resolver.resolve(&Wiring::node("later", "value")), Resolution::Missing);
    }

    #[test]
    fn test_explicit_null_is_not_missing() {
        let (config, outputs) = fixtures();
        let resolver = Resolver::new(&config, &outputs);

        assert_eq!(
            resolver.resolve(&Wiring::config("explicit_null")),
            Resolution::Value(serde_json::Value::Null)
        );
    }

    #[test]
    fn test_list_resolves_element_wise() {
        let (config, outputs) = fixtures();
        let resolver = Resolver::new(&config, &outputs);

        let wiring = Wiring::list([
            Wiring::node("gather", "source"),
            Wiring::node("slack", "source"),
            Wiring::config("start"),
        ]);
        assert_eq!(
            resolver.resolve(&wiring),
            Resolution::Value(json!([{"name": "news", "data": []}, null, 5]))
        );
    }

    #[test]
    fn test_resolve_inputs_marks_missing() {
        let (config, outputs) = fixtures();
        let resolver = Resolver::new(&config, &outputs);
        let node = NodeDefinition::new("transform", "double")
            .with_input("x", Wiring::node("gather", "value"))
            .with_input("voice", Wiring::config("voice"))
            .with_input("label", Wiring::literal("daily"));

        let inputs = resolver.resolve_inputs(&node, &["x".to_string()]);

        assert_eq!(inputs.node(), "transform");
        assert_eq!(inputs.get("x"), Some(&json!(5)));
        assert_eq!(inputs.get("voice"), Some(&serde_json::Value::Null));
        assert!(inputs.is_missing("voice"));
        assert!(!inputs.is_missing("label"));
        assert_eq!(inputs.values().len(), 3);
    }

    #[test]
    fn test_unwired_required_input_is_missing() {
        let (config, outputs) = fixtures();
        let resolver = Resolver::new(&config, &outputs);
        let node = NodeDefinition::new("summarize", "llm").with_input("text", Wiring::node("gather", "value"));
        let required = vec!["text".to_string(), "style".to_string()];

        let inputs = resolver.resolve_inputs(&node, &required);

        assert_eq!(inputs.get("text"), Some(&json!(5)));
        assert_eq!(inputs.get("style"), Some(&serde_json::Value::Null));
        assert!(inputs.is_missing("style"));
        assert!(!inputs.is_missing("text"));
        assert_eq!(inputs.missing().len(), 1);
    }
}
