//! Stage trait and implementations.
//!
//! Stages are the reusable units of work a pipeline places into nodes. A
//! stage is stateless: it declares what it reads and produces, and maps an
//! input bag to an output bag.

mod inputs;
mod registry;

pub use inputs::StageInputs;
pub use registry::StageRegistry;

use crate::core::{Effect, StageOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Static metadata a stage declares about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// The unique stage name nodes refer to.
    pub name: String,
    /// Input keys the stage reads.
    #[serde(default)]
    pub required_inputs: Vec<String>,
    /// Output keys the stage always produces.
    #[serde(default)]
    pub produced_outputs: Vec<String>,
    /// What the stage reads from outside the graph.
    #[serde(default)]
    pub input_effects: Vec<Effect>,
    /// What the stage writes to outside the graph.
    #[serde(default)]
    pub output_effects: Vec<Effect>,
}

impl StageDescriptor {
    /// Creates a descriptor with no inputs, outputs or effects.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_inputs: Vec::new(),
            produced_outputs: Vec::new(),
            input_effects: Vec::new(),
            output_effects: Vec::new(),
        }
    }

    /// Sets the required inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the produced outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.produced_outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an input effect.
    #[must_use]
    pub fn with_input_effect(mut self, effect: Effect) -> Self {
        self.input_effects.push(effect);
        self
    }

    /// Adds an output effect.
    #[must_use]
    pub fn with_output_effect(mut self, effect: Effect) -> Self {
        self.output_effects.push(effect);
        self
    }

    /// Returns true if the stage declares the given output.
    #[must_use]
    pub fn produces(&self, output: &str) -> bool {
        self.produced_outputs.iter().any(|o| o == output)
    }
}

/// Trait for pipeline stages.
///
/// `process` must depend only on its inputs and must return at least the
/// declared outputs. An error is fatal to the run; the engine never retries.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the stage's static metadata.
    fn descriptor(&self) -> &StageDescriptor;

    /// Returns the name of the stage.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Processes one node's resolved inputs.
    async fn process(&self, inputs: StageInputs) -> anyhow::Result<StageOutput>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(StageInputs) -> anyhow::Result<StageOutput> + Send + Sync,
{
    descriptor: StageDescriptor,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(StageInputs) -> anyhow::Result<StageOutput> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(descriptor: StageDescriptor, func: F) -> Self {
        Self { descriptor, func }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(StageInputs) -> anyhow::Result<StageOutput> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(StageInputs) -> anyhow::Result<StageOutput> + Send + Sync,
{
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    async fn process(&self, inputs: StageInputs) -> anyhow::Result<StageOutput> {
        (self.func)(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_stage() -> FnStage<impl Fn(StageInputs) -> anyhow::Result<StageOutput> + Send + Sync> {
        FnStage::new(
            StageDescriptor::new("echo")
                .with_inputs(["message"])
                .with_outputs(["echoed"]),
            |inputs| Ok(StageOutput::value("echoed", inputs.get("message").cloned().unwrap_or_default())),
        )
    }

    #[test]
    fn test_descriptor_metadata() {
        let stage = echo_stage();

        assert_eq!(stage.name(), "echo");
        assert_eq!(stage.descriptor().required_inputs, vec!["message".to_string()]);
        assert!(stage.descriptor().produces("echoed"));
        assert!(!stage.descriptor().produces("message"));
        assert!(stage.descriptor().input_effects.is_empty());
    }

    #[test]
    fn test_descriptor_effects() {
        let descriptor = StageDescriptor::new("piper-synthesizer")
            .with_inputs(["script", "output_dir"])
            .with_outputs(["audio"])
            .with_output_effect(Effect::TTS)
            .with_output_effect(Effect::FILESYSTEM);

        assert_eq!(descriptor.output_effects, vec![Effect::TTS, Effect::FILESYSTEM]);
    }

    #[tokio::test]
    async fn test_fn_stage_process() {
        let stage = echo_stage();
        let mut values = crate::core::OutputBag::new();
        values.insert("message".to_string(), json!("hello"));

        let output = stage.process(StageInputs::new("echo-node", values)).await.unwrap();
        assert_eq!(output.get("echoed"), Some(&json!("hello")));
    }
}
