//! Input wiring expressions.
//!
//! Wiring is parsed once when a definition is loaded. Strings of the form
//! `$config.<key>` and `$<node>.<output>` become references; lists become
//! element-wise wiring; everything else is a literal.

use serde::{Serialize, Serializer};
use std::fmt;

const CONFIG_PREFIX: &str = "$config.";

/// Where a node input's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Wiring {
    /// A value used as written.
    Literal(serde_json::Value),
    /// A key in the run's configuration bag.
    Config(String),
    /// An output of an earlier node.
    Node {
        /// The upstream node.
        node: String,
        /// The upstream node's output key.
        output: String,
    },
    /// An ordered list of sources, resolved element-wise.
    List(Vec<Wiring>),
}

/// A string that starts with `$` but is not a well-formed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedReference(pub String);

impl Wiring {
    /// Creates a literal wiring.
    #[must_use]
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a configuration reference.
    #[must_use]
    pub fn config(key: impl Into<String>) -> Self {
        Self::Config(key.into())
    }

    /// Creates a node output reference.
    #[must_use]
    pub fn node(node: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Node {
            node: node.into(),
            output: output.into(),
        }
    }

    /// Creates a list of sources.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Parses a wiring expression from its document form.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReference` for a `$`-string that names neither a
    /// config key nor a node output, anywhere inside a list included.
    pub fn parse(value: serde_json::Value) -> Result<Self, MalformedReference> {
        match value {
            serde_json::Value::String(text) if text.starts_with('$') => Self::parse_reference(text),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Ok(Self::Literal(other)),
        }
    }

    fn parse_reference(text: String) -> Result<Self, MalformedReference> {
        if let Some(key) = text.strip_prefix(CONFIG_PREFIX) {
            if key.is_empty() {
                return Err(MalformedReference(text));
            }
            return Ok(Self::Config(key.to_string()));
        }

        let reference = text[1..]
            .split_once('.')
            .filter(|(node, output)| !node.is_empty() && !output.is_empty())
            .map(|(node, output)| Self::node(node, output));
        reference.ok_or(MalformedReference(text))
    }

    /// Returns every `(node, output)` reference, in document order.
    #[must_use]
    pub fn node_refs(&self) -> Vec<(&str, &str)> {
        let mut refs = Vec::new();
        self.collect_node_refs(&mut refs);
        refs
    }

    fn collect_node_refs<'a>(&'a self, refs: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Self::Node { node, output } => refs.push((node, output)),
            Self::List(items) => {
                for item in items {
                    item.collect_node_refs(refs);
                }
            }
            Self::Literal(_) | Self::Config(_) => {}
        }
    }

    /// Converts the wiring back to its document form.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Config(key) => serde_json::Value::String(format!("{CONFIG_PREFIX}{key}")),
            Self::Node { node, output } => serde_json::Value::String(format!("${node}.{output}")),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }
}

impl fmt::Display for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(key) => write!(f, "{CONFIG_PREFIX}{key}"),
            Self::Node { node, output } => write!(f, "${node}.{output}"),
            Self::Literal(_) | Self::List(_) => write!(f, "{}", self.to_value()),
        }
    }
}

impl Serialize for Wiring {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
