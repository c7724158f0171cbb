//! Error types for the murmur pipeline engine.
//!
//! The taxonomy follows the lifecycle of a run: a definition that cannot be
//! loaded, a graph that fails validation, a stage that fails while running,
//! and failures of the artifact store. Internal invariant violations are kept
//! separate because they indicate a defect rather than bad input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for murmur operations.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// The pipeline definition could not be loaded.
    #[error("{0}")]
    Load(#[from] PipelineLoadError),

    /// The pipeline graph failed validation.
    #[error("{0}")]
    Validation(#[from] GraphValidationError),

    /// A stage failed while processing a node.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// The artifact store failed to read or write a snapshot.
    #[error("{0}")]
    Artifact(#[from] ArtifactStoreError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MurmurError {
    /// Returns the node at fault, when the error is attributable to one.
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::StageExecution(err) => Some(&err.node),
            Self::Validation(err) => Some(err.primary_node()),
            Self::Load(PipelineLoadError::InvalidReference { node, .. }) => Some(node),
            _ => None,
        }
    }
}

/// Metadata about a graph error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "GRAPH-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised while loading a pipeline definition.
#[derive(Debug, Error)]
pub enum PipelineLoadError {
    /// The definition file could not be read.
    #[error("Failed to read pipeline definition '{}': {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A node is missing a required field.
    #[error("Node #{index} is missing required field '{field}'")]
    MissingField {
        /// Position of the node in the `nodes` list.
        index: usize,
        /// The missing field.
        field: &'static str,
    },

    /// A wiring expression starts with `$` but is not a valid reference.
    #[error("Node '{node}' input '{input}' has malformed reference '{reference}' (expected '$config.<key>' or '$<node>.<output>')")]
    InvalidReference {
        /// The node declaring the input.
        node: String,
        /// The input key.
        input: String,
        /// The raw reference text.
        reference: String,
    },

    /// The file extension does not name a supported format.
    #[error("Unsupported pipeline definition format: '{}' (expected .yaml, .yml or .json)", path.display())]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
    },
}

/// Error raised when a cycle is detected in the node graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Circular dependency detected: {}", .cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The nodes forming the cycle; the first node is repeated at the end.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

/// Error raised when graph validation fails.
///
/// Validation stops at the first problem found, so a graph with several
/// defects reports them one at a time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphValidationError {
    /// Two nodes share a name.
    #[error("Duplicate node name '{node}'")]
    DuplicateNode {
        /// The repeated node name.
        node: String,
    },

    /// A node references a stage that is not registered.
    #[error("Unknown stage '{stage}' referenced by node '{node}'")]
    UnknownStage {
        /// The node declaring the stage.
        node: String,
        /// The missing stage name.
        stage: String,
    },

    /// A wiring entry references a node that does not exist.
    #[error("Node '{node}' references unknown node '{reference}' (input '{input}')")]
    UnknownNode {
        /// The node declaring the input.
        node: String,
        /// The input key.
        input: String,
        /// The missing node.
        reference: String,
    },

    /// A wiring entry references an output the upstream stage never declares.
    #[error(
        "Node '{node}' references output '{output}' but stage '{stage}' only produces: {} (input '{input}', node '{reference}')",
        .produced.join(", ")
    )]
    UndeclaredOutput {
        /// The node declaring the input.
        node: String,
        /// The input key.
        input: String,
        /// The upstream node.
        reference: String,
        /// The requested output.
        output: String,
        /// The upstream node's stage.
        stage: String,
        /// Outputs the upstream stage declares.
        produced: Vec<String>,
    },

    /// The wiring forms a cycle.
    #[error("{0}")]
    Cycle(#[from] CycleDetectedError),
}

impl GraphValidationError {
    /// Returns the nodes involved in the error.
    #[must_use]
    pub fn nodes(&self) -> Vec<String> {
        match self {
            Self::DuplicateNode { node } | Self::UnknownStage { node, .. } => vec![node.clone()],
            Self::UnknownNode { node, reference, .. }
            | Self::UndeclaredOutput { node, reference, .. } => {
                vec![node.clone(), reference.clone()]
            }
            Self::Cycle(err) => err.cycle_path.clone(),
        }
    }

    /// Returns the node whose declaration is at fault.
    #[must_use]
    pub fn primary_node(&self) -> &str {
        match self {
            Self::DuplicateNode { node }
            | Self::UnknownStage { node, .. }
            | Self::UnknownNode { node, .. }
            | Self::UndeclaredOutput { node, .. } => node,
            Self::Cycle(err) => err.cycle_path.first().map_or("", String::as_str),
        }
    }

    /// Returns diagnostic metadata with an error code and a fix hint.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        match self {
            Self::DuplicateNode { node } => {
                ContractErrorInfo::new("GRAPH-DUPLICATE-NODE", format!("Node '{node}' is declared more than once"))
                    .with_fix_hint("Give every node in the pipeline a unique name.")
                    .with_context_entry("node", node)
            }
            Self::UnknownStage { node, stage } => {
                ContractErrorInfo::new("GRAPH-UNKNOWN-STAGE", format!("Stage '{stage}' is not registered"))
                    .with_fix_hint("Check the stage name for typos or register the stage before validating.")
                    .with_context_entry("node", node)
                    .with_context_entry("stage", stage)
            }
            Self::UnknownNode { node, input, reference } => {
                ContractErrorInfo::new("GRAPH-UNKNOWN-NODE", format!("Node '{reference}' does not exist"))
                    .with_fix_hint("References take the form '$<node>.<output>'; check the node name.")
                    .with_context_entry("node", node)
                    .with_context_entry("input", input)
                    .with_context_entry("reference", reference)
            }
            Self::UndeclaredOutput { node, input, reference, output, stage, .. } => {
                ContractErrorInfo::new(
                    "GRAPH-UNDECLARED-OUTPUT",
                    format!("Stage '{stage}' does not declare output '{output}'"),
                )
                .with_fix_hint("Reference one of the outputs the upstream stage declares.")
                .with_context_entry("node", node)
                .with_context_entry("input", input)
                .with_context_entry("reference", reference)
                .with_context_entry("output", output)
            }
            Self::Cycle(err) => ContractErrorInfo::new(
                "GRAPH-CYCLE",
                format!("Pipeline contains a dependency cycle: {}", err.cycle_path.join(" -> ")),
            )
            .with_fix_hint("Remove one of the references in the cycle to break it."),
        }
    }
}

/// Error raised when a stage lookup misses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown stage: '{name}'")]
pub struct StageNotFoundError {
    /// The missing stage name.
    pub name: String,
}

impl StageNotFoundError {
    /// Creates a new not-found error.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Error raised when a stage fails while processing a node.
///
/// Fatal to the run: the engine never retries or substitutes.
#[derive(Debug, Error)]
#[error("Node '{node}' (stage '{stage}') failed: {message}")]
pub struct StageExecutionError {
    /// The node being processed.
    pub node: String,
    /// The stage that failed.
    pub stage: String,
    /// The stage error rendered with its full context chain.
    pub message: String,
    /// The stage's own error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl StageExecutionError {
    /// Wraps a stage error with the node and stage it came from.
    #[must_use]
    pub fn new(node: impl Into<String>, stage: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            node: node.into(),
            stage: stage.into(),
            message: format!("{source:#}"),
            source: source.into(),
        }
    }
}

/// Errors raised by artifact stores.
#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    /// Reading or writing a snapshot failed.
    #[error("Artifact IO error at '{}': {source}", path.display())]
    Io {
        /// The snapshot path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("Artifact serialization error for node '{node}': {source}")]
    Serialization {
        /// The node whose snapshot failed.
        node: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot exists but does not hold an output bag.
    #[error("Snapshot for node '{node}' in run '{run_id}' is not a JSON object")]
    Corrupt {
        /// The run id.
        run_id: String,
        /// The node.
        node: String,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration '{}': {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(String),

    /// The configuration document is not a mapping.
    #[error("Configuration must be a mapping of keys to values")]
    NotAMapping,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_full_path() {
        let err = CycleDetectedError::new(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ]);

        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> c -> a");
    }

    #[test]
    fn test_unknown_stage_message() {
        let err = GraphValidationError::UnknownStage {
            node: "gather".to_string(),
            stage: "news-fetcher".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Unknown stage 'news-fetcher' referenced by node 'gather'"
        );
        assert_eq!(err.error_info().code, "GRAPH-UNKNOWN-STAGE");
        assert_eq!(err.nodes(), vec!["gather".to_string()]);
    }

    #[test]
    fn test_undeclared_output_message() {
        let err = GraphValidationError::UndeclaredOutput {
            node: "plan".to_string(),
            input: "gathered".to_string(),
            reference: "gather".to_string(),
            output: "items".to_string(),
            stage: "news-fetcher".to_string(),
            produced: vec!["gathered_data".to_string(), "count".to_string()],
        };

        let message = err.to_string();
        assert!(message.starts_with(
            "Node 'plan' references output 'items' but stage 'news-fetcher' only produces: gathered_data, count"
        ));
        assert!(message.contains("input 'gathered'"));
        assert_eq!(err.error_info().context.get("output"), Some(&"items".to_string()));
    }

    #[test]
    fn test_stage_execution_error_keeps_context_chain() {
        let source = anyhow::anyhow!("connection refused").context("fetching headlines");
        let err = StageExecutionError::new("gather", "news-fetcher", source);

        let message = err.to_string();
        assert!(message.contains("Node 'gather'"));
        assert!(message.contains("fetching headlines: connection refused"));
    }

    #[test]
    fn test_murmur_error_names_failing_node() {
        let err: MurmurError =
            StageExecutionError::new("plan", "brief-planner", anyhow::anyhow!("boom")).into();
        assert_eq!(err.node(), Some("plan"));

        let err = MurmurError::Internal("scheduler could not order nodes: a".to_string());
        assert_eq!(err.node(), None);
    }
}
