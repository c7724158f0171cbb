//! The opaque plugin payload exchanged between leaf and aggregating stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Data gathered by a leaf stage for an aggregating stage.
///
/// The engine never inspects `data`; its shape is a private agreement
/// between the producing stage and whoever reads the interpretation guide.
/// New sources are added by writing a stage that emits a `DataSource` and
/// wiring it into the aggregator's list input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Name of the source (e.g., "news", "slack").
    pub name: String,

    /// Source-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Document explaining how to read `data`, typically a prompt fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation_guide: Option<PathBuf>,
}

impl DataSource {
    /// Creates a new data source without an interpretation guide.
    #[must_use]
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
            interpretation_guide: None,
        }
    }

    /// Sets the interpretation guide.
    #[must_use]
    pub fn with_interpretation_guide(mut self, guide: impl Into<PathBuf>) -> Self {
        self.interpretation_guide = Some(guide.into());
        self
    }

    /// Decodes a data source from a resolved input value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a data source object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Encodes the data source as an output value.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "data": self.data,
            "interpretation_guide": self.interpretation_guide,
        })
    }
}

/// Decodes a fanned-in list of data sources.
///
/// Accepts a single source or a list of sources. `null` entries, which is
/// how unresolved references appear inside a list, are skipped.
///
/// # Errors
///
/// Returns an error if a non-null entry is not a data source object.
pub fn collect_data_sources(value: &serde_json::Value) -> Result<Vec<DataSource>, serde_json::Error> {
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| DataSource::from_value(item.clone()))
            .collect(),
        other => Ok(vec![DataSource::from_value(other.clone())?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_optional_guide() {
        let source = DataSource::new("simple-source", json!({"value": 42}));

        assert_eq!(source.name, "simple-source");
        assert!(source.interpretation_guide.is_none());
    }

    #[test]
    fn test_data_source_value_keeps_guide() {
        let source = DataSource::new("slack", json!({"messages": []}))
            .with_interpretation_guide("prompts/sources/slack.md");

        let decoded = DataSource::from_value(source.clone().into_value()).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_collect_skips_missing_entries() {
        let value = json!([
            {"name": "news", "data": {"items": [1, 2]}},
            null,
            {"name": "calendar", "data": {"events": []}, "interpretation_guide": "prompts/calendar.md"}
        ]);

        let sources = collect_data_sources(&value).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["news", "calendar"]);
        assert_eq!(
            sources[1].interpretation_guide,
            Some(PathBuf::from("prompts/calendar.md"))
        );
    }

    #[test]
    fn test_collect_single_and_null() {
        assert!(collect_data_sources(&serde_json::Value::Null).unwrap().is_empty());

        let single = collect_data_sources(&json!({"name": "news", "data": 1})).unwrap();
        assert_eq!(single.len(), 1);

        assert!(collect_data_sources(&json!(["not a source"])).is_err());
    }
}
