//! Stage output type and the output bag it carries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A node's output values keyed by output name.
///
/// Backed by an ordered map so serialized run states and snapshots are
/// byte-stable across runs.
pub type OutputBag = serde_json::Map<String, serde_json::Value>;

/// The result of one `Stage::process` call.
///
/// `data` must hold at least the outputs the stage declares. `artifacts`
/// names files the stage wrote (an audio file, a transcript); they are
/// collected into the run state but never snapshotted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Output values keyed by output name.
    #[serde(default)]
    pub data: OutputBag,

    /// File artifacts keyed by artifact name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl StageOutput {
    /// Creates an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an output from an existing bag.
    #[must_use]
    pub fn from_data(data: OutputBag) -> Self {
        Self {
            data,
            artifacts: BTreeMap::new(),
        }
    }

    /// Creates an output with a single value.
    #[must_use]
    pub fn value(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new().with_value(key, value)
    }

    /// Adds an output value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Adds a file artifact.
    #[must_use]
    pub fn with_artifact(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.artifacts.insert(name.into(), path.into());
        self
    }

    /// Gets an output value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Returns the declared outputs missing from `data`.
    #[must_use]
    pub fn missing_outputs<'a>(&self, declared: &'a [String]) -> Vec<&'a str> {
        declared
            .iter()
            .filter(|key| !self.data.contains_key(key.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_builders() {
        let output = StageOutput::value("script", json!("Good morning"))
            .with_value("word_count", json!(2))
            .with_artifact("audio", "/tmp/brief.wav");

        assert_eq!(output.get("script"), Some(&json!("Good morning")));
        assert_eq!(output.data.len(), 2);
        assert_eq!(output.artifacts.get("audio"), Some(&PathBuf::from("/tmp/brief.wav")));
    }

    #[test]
    fn test_missing_outputs() {
        let output = StageOutput::value("plan", json!({}));
        let declared = vec!["plan".to_string(), "summary".to_string()];

        assert_eq!(output.missing_outputs(&declared), vec!["summary"]);
    }

    #[test]
    fn test_output_serialization_omits_empty_artifacts() {
        let output = StageOutput::value("value", json!(5));
        let json = serde_json::to_string(&output).unwrap();

        assert_eq!(json, r#"{"data":{"value":5}}"#);
    }
}
