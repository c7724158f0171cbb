//! Static validation of a pipeline against a stage registry.

use super::graph::DependencyGraph;
use super::spec::{NodeDefinition, PipelineDefinition};
use crate::errors::GraphValidationError;
use crate::stages::{Stage, StageRegistry};
use std::collections::HashSet;
use std::sync::Arc;

/// A pipeline whose stages, references and dependency edges have been checked.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    definition: PipelineDefinition,
    stages: Vec<Arc<dyn Stage>>,
    graph: DependencyGraph,
}

impl ValidatedGraph {
    /// Returns the validated definition.
    #[must_use]
    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    /// Returns the dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Looks up a node and the stage it resolved to.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<(&NodeDefinition, &Arc<dyn Stage>)> {
        let index = self.graph.index_of(name)?;
        Some((&self.definition.nodes[index], &self.stages[index]))
    }
}

/// Validates a pipeline definition.
///
/// Node names must be unique. Nodes are then checked one at a time in
/// declaration order: the node's stage must be registered, and every
/// `$node.output` reference must name an existing node whose stage declares
/// that output (config references and literals are not checked). The
/// dependency graph must be acyclic. The first failure is returned.
///
/// # Errors
///
/// Returns the first `GraphValidationError` found.
pub fn validate(
    definition: &PipelineDefinition,
    registry: &StageRegistry,
) -> Result<ValidatedGraph, GraphValidationError> {
    let mut seen = HashSet::with_capacity(definition.len());
    for node in &definition.nodes {
        if !seen.insert(node.name.as_str()) {
            return Err(GraphValidationError::DuplicateNode {
                node: node.name.clone(),
            });
        }
    }

    let stages: Vec<Option<Arc<dyn Stage>>> = definition
        .nodes
        .iter()
        .map(|node| registry.get(&node.stage).ok())
        .collect();
    let unknown_stage = |index: usize| {
        let node = &definition.nodes[index];
        GraphValidationError::UnknownStage {
            node: node.name.clone(),
            stage: node.stage.clone(),
        }
    };

    let mut graph = DependencyGraph::new(definition.node_names());
    for (position, node) in definition.nodes.iter().enumerate() {
        if stages[position].is_none() {
            return Err(unknown_stage(position));
        }

        for (input, wiring) in &node.inputs {
            for (reference, output) in wiring.node_refs() {
                let Some(index) = graph.index_of(reference) else {
                    return Err(GraphValidationError::UnknownNode {
                        node: node.name.clone(),
                        input: input.clone(),
                        reference: reference.to_string(),
                    });
                };
                let Some(upstream) = &stages[index] else {
                    return Err(unknown_stage(index));
                };

                let descriptor = upstream.descriptor();
                if !descriptor.produces(output) {
                    return Err(GraphValidationError::UndeclaredOutput {
                        node: node.name.clone(),
                        input: input.clone(),
                        reference: reference.to_string(),
                        output: output.to_string(),
                        stage: descriptor.name.clone(),
                        produced: descriptor.produced_outputs.clone(),
                    });
                }

                graph.add_dependency(&node.name, reference);
            }
        }
    }

    graph.check_acyclic()?;

    tracing::debug!(
        pipeline = %definition.name,
        nodes = definition.len(),
        "Pipeline validated"
    );

    Ok(ValidatedGraph {
        definition: definition.clone(),
        stages: stages.into_iter().flatten().collect(),
        graph,
    })
}
