//! Pipeline definition loading.
//!
//! Documents are YAML or JSON with a top-level `name` and a `nodes` list.
//! Each node needs `name` and `stage` (`transformer` is accepted as an
//! alias) and may carry an `inputs` mapping whose order is preserved.

use super::spec::{NodeDefinition, PipelineDefinition};
use super::wiring::{MalformedReference, Wiring};
use crate::errors::PipelineLoadError;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawPipeline {
    name: String,
    #[serde(default)]
    nodes: Option<Vec<RawNode>>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "transformer")]
    stage: Option<String>,
    #[serde(default)]
    inputs: Option<RawInputs>,
}

/// Input mapping in document order.
#[derive(Debug, Default)]
struct RawInputs(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RawInputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InputsVisitor;

        impl<'de> Visitor<'de> for InputsVisitor {
            type Value = RawInputs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of input names to wiring")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawInputs, A::Error> {
                let mut entries: Vec<(String, serde_json::Value)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(RawInputs(entries))
            }
        }

        deserializer.deserialize_map(InputsVisitor)
    }
}

/// Loads a pipeline definition, choosing the format from the file extension.
///
/// # Errors
///
/// Returns `PipelineLoadError` if the file cannot be read, has an
/// unsupported extension, fails to parse or is structurally invalid.
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<PipelineDefinition, PipelineLoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let parse: fn(&str) -> Result<PipelineDefinition, PipelineLoadError> = match extension.as_deref() {
        Some("yaml" | "yml") => parse_yaml,
        Some("json") => parse_json,
        _ => {
            return Err(PipelineLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let text = std::fs::read_to_string(path).map_err(|source| PipelineLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definition = parse(&text)?;

    tracing::debug!(
        path = %path.display(),
        pipeline = %definition.name,
        nodes = definition.len(),
        "Loaded pipeline definition"
    );
    Ok(definition)
}

/// Parses a pipeline definition from YAML text.
///
/// # Errors
///
/// Returns `PipelineLoadError` on malformed YAML or an invalid structure.
pub fn parse_yaml(text: &str) -> Result<PipelineDefinition, PipelineLoadError> {
    let raw: RawPipeline = serde_yaml::from_str(text)?;
    into_definition(raw)
}

/// Parses a pipeline definition from JSON text.
///
/// # Errors
///
/// Returns `PipelineLoadError` on malformed JSON or an invalid structure.
pub fn parse_json(text: &str) -> Result<PipelineDefinition, PipelineLoadError> {
    let raw: RawPipeline = serde_json::from_str(text)?;
    into_definition(raw)
}

fn into_definition(raw: RawPipeline) -> Result<PipelineDefinition, PipelineLoadError> {
    let mut definition = PipelineDefinition::new(raw.name);

    for (index, raw_node) in raw.nodes.unwrap_or_default().into_iter().enumerate() {
        let name = raw_node
            .name
            .filter(|name| !name.is_empty())
            .ok_or(PipelineLoadError::MissingField { index, field: "name" })?;
        let stage = raw_node
            .stage
            .filter(|stage| !stage.is_empty())
            .ok_or(PipelineLoadError::MissingField { index, field: "stage" })?;

        let mut node = NodeDefinition::new(name, stage);
        for (input, value) in raw_node.inputs.unwrap_or_default().0 {
            let wiring = Wiring::parse(value).map_err(|MalformedReference(reference)| {
                PipelineLoadError::InvalidReference {
                    node: node.name.clone(),
                    input: input.clone(),
                    reference,
                }
            })?;
            node.inputs.push((input, wiring));
        }
        definition.nodes.push(node);
    }

    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    const BRIEFING: &str = r#"
name: morning-briefing
nodes:
  - name: gather
    stage: news-fetcher
    inputs:
      topics: $config.news_topics
      limit: 5
  - name: plan
    transformer: brief-planner
    inputs:
      sources: [$gather.source, $config.extra_source]
      style: {tone: calm}
"#;

    #[test]
    fn test_parse_yaml_builds_typed_wiring() {
        let definition = parse_yaml(BRIEFING).unwrap();

        assert_eq!(definition.name, "morning-briefing");
        assert_eq!(definition.node_names(), vec!["gather", "plan"]);

        let gather = definition.node("gather").unwrap();
        assert_eq!(gather.stage, "news-fetcher");
        assert_eq!(gather.input("topics"), Some(&Wiring::config("news_topics")));
        assert_eq!(gather.input("limit"), Some(&Wiring::literal(5)));

        let plan = definition.node("plan").unwrap();
        assert_eq!(plan.stage, "brief-planner");
        assert_eq!(
            plan.input("sources"),
            Some(&Wiring::list([Wiring::node("gather", "source"), Wiring::config("extra_source")]))
        );
        assert_eq!(plan.input("style"), Some(&Wiring::literal(json!({"tone": "calm"}))));
    }

    #[test]
    fn test_input_order_preserved() {
        let definition = parse_yaml(
            "name: p\nnodes:\n  - name: n\n    stage: s\n    inputs:\n      zeta: 1\n      alpha: 2\n      mid: 3\n",
        )
        .unwrap();

        let keys: Vec<_> = definition.nodes[0].inputs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_json() {
        let definition = parse_json(
            r#"{"name": "p", "nodes": [{"name": "a", "stage": "s", "inputs": {"x": "$b.y"}}]}"#,
        )
        .unwrap();

        assert_eq!(definition.nodes[0].input("x"), Some(&Wiring::node("b", "y")));
    }

    #[test]
    fn test_missing_nodes_is_empty_pipeline() {
        let definition = parse_yaml("name: empty\n").unwrap();
        assert!(definition.is_empty());
    }

    #[test]
    fn test_missing_stage_field() {
        let err = parse_yaml("name: p\nnodes:\n  - name: a\n  - name: b\n").unwrap_err();

        assert!(matches!(
            err,
            PipelineLoadError::MissingField { index: 0, field: "stage" }
        ));
    }

    #[test]
    fn test_missing_name_field() {
        let err = parse_yaml("name: p\nnodes:\n  - stage: s\n").unwrap_err();
        assert!(matches!(err, PipelineLoadError::MissingField { index: 0, field: "name" }));
    }

    #[test]
    fn test_malformed_reference_names_node_and_input() {
        let err = parse_yaml("name: p\nnodes:\n  - name: a\n    stage: s\n    inputs:\n      x: $nodot\n")
            .unwrap_err();

        match err {
            PipelineLoadError::InvalidReference { node, input, reference } => {
                assert_eq!(node, "a");
                assert_eq!(input, "x");
                assert_eq!(reference, "$nodot");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(parse_yaml("name: [unclosed"), Err(PipelineLoadError::Yaml(_))));
    }

    #[test]
    fn test_load_pipeline_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("briefing.yaml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(BRIEFING.as_bytes())
            .unwrap();

        let definition = load_pipeline(&path).unwrap();
        assert_eq!(definition.len(), 2);
    }

    #[test]
    fn test_load_pipeline_rejects_unknown_extension() {
        let err = load_pipeline("pipeline.toml").unwrap_err();
        assert!(matches!(err, PipelineLoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_pipeline_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pipeline(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, PipelineLoadError::Io { .. }));
    }
}
