//! Typed pipeline definitions.

use super::wiring::Wiring;

/// A named, ordered list of nodes.
///
/// Node order is the declaration order used to break scheduling ties; it
/// carries no other meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineDefinition {
    /// The pipeline name.
    pub name: String,
    /// Nodes in declaration order.
    pub nodes: Vec<NodeDefinition>,
}

impl PipelineDefinition {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Appends a node.
    #[must_use]
    pub fn with_node(mut self, node: NodeDefinition) -> Self {
        self.nodes.push(node);
        self
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Returns node names in declaration order.
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name.as_str()).collect()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the pipeline has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One placement of a stage in a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDefinition {
    /// Unique node name within the pipeline.
    pub name: String,
    /// The registered stage this node runs.
    pub stage: String,
    /// Input wiring in declaration order.
    pub inputs: Vec<(String, Wiring)>,
}

impl NodeDefinition {
    /// Creates a node with no inputs.
    #[must_use]
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            inputs: Vec::new(),
        }
    }

    /// Wires an input. A repeated key replaces the earlier wiring in place.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, wiring: Wiring) -> Self {
        let key = key.into();
        match self.inputs.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = wiring,
            None => self.inputs.push((key, wiring)),
        }
        self
    }

    /// Gets the wiring for an input key.
    #[must_use]
    pub fn input(&self, key: &str) -> Option<&Wiring> {
        self.inputs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, wiring)| wiring)
    }

    /// Returns the distinct upstream nodes this node reads from.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for (_, wiring) in &self.inputs {
            for (node, _) in wiring.node_refs() {
                if !deps.contains(&node) {
                    deps.push(node);
                }
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn briefing() -> PipelineDefinition {
        PipelineDefinition::new("briefing")
            .with_node(
                NodeDefinition::new("gather", "news-fetcher")
                    .with_input("topics", Wiring::config("news_topics")),
            )
            .with_node(
                NodeDefinition::new("plan", "brief-planner")
                    .with_input(
                        "sources",
                        Wiring::list([Wiring::node("gather", "source"), Wiring::node("gather", "source")]),
                    )
                    .with_input("notes", Wiring::node("gather", "notes")),
            )
    }

    #[test]
    fn test_lookup_and_names() {
        let pipeline = briefing();

        assert_eq!(pipeline.node_names(), vec!["gather", "plan"]);
        assert_eq!(pipeline.node("plan").unwrap().stage, "brief-planner");
        assert!(pipeline.node("synthesize").is_none());
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn test_dependencies_are_distinct() {
        let pipeline = briefing();

        assert_eq!(pipeline.node("plan").unwrap().dependencies(), vec!["gather"]);
        assert!(pipeline.node("gather").unwrap().dependencies().is_empty());
    }

    #[test]
    fn test_with_input_replaces_in_place() {
        let node = NodeDefinition::new("n", "s")
            .with_input("a", Wiring::literal(1))
            .with_input("b", Wiring::literal(2))
            .with_input("a", Wiring::literal(3));

        let keys: Vec<_> = node.inputs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(node.input("a"), Some(&Wiring::literal(3)));
    }
}
