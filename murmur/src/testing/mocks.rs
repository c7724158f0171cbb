//! Stub stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Effect, StageOutput};
use crate::stages::{Stage, StageDescriptor, StageInputs};

/// A stage that counts calls and returns a configurable output.
///
/// Unless an output is set, every declared output is returned as `null`.
#[derive(Debug)]
pub struct MockStage {
    descriptor: StageDescriptor,
    output: Mutex<Option<StageOutput>>,
    call_count: Mutex<usize>,
}

impl MockStage {
    /// Creates a new mock stage with no inputs or outputs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: StageDescriptor::new(name),
            output: Mutex::new(None),
            call_count: Mutex::new(0),
        }
    }

    /// Declares the stage's inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor = self.descriptor.with_inputs(inputs);
        self
    }

    /// Declares the stage's outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor = self.descriptor.with_outputs(outputs);
        self
    }

    /// Declares an input effect.
    #[must_use]
    pub fn with_input_effect(mut self, effect: Effect) -> Self {
        self.descriptor = self.descriptor.with_input_effect(effect);
        self
    }

    /// Sets the output returned by every call.
    #[must_use]
    pub fn returning(self, output: StageOutput) -> Self {
        self.set_output(output);
        self
    }

    /// Replaces the output returned by every call.
    pub fn set_output(&self, output: StageOutput) {
        *self.output.lock() = Some(output);
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        *self.call_count.lock() = 0;
    }
}

#[async_trait]
impl Stage for MockStage {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    async fn process(&self, _inputs: StageInputs) -> anyhow::Result<StageOutput> {
        *self.call_count.lock() += 1;

        if let Some(output) = self.output.lock().clone() {
            return Ok(output);
        }

        let data = self
            .descriptor
            .produced_outputs
            .iter()
            .map(|key| (key.clone(), serde_json::Value::Null))
            .collect();
        Ok(StageOutput::from_data(data))
    }
}

/// A stage that always fails.
#[derive(Debug)]
pub struct FailingStage {
    descriptor: StageDescriptor,
    error: String,
    call_count: Mutex<usize>,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            descriptor: StageDescriptor::new(name),
            error: error.into(),
            call_count: Mutex::new(0),
        }
    }

    /// Declares the stage's outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor = self.descriptor.with_outputs(outputs);
        self
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    async fn process(&self, _inputs: StageInputs) -> anyhow::Result<StageOutput> {
        *self.call_count.lock() += 1;
        Err(anyhow::anyhow!("{}", self.error))
    }
}

/// A stage that records every input bag it receives.
#[derive(Debug)]
pub struct RecordingStage {
    descriptor: StageDescriptor,
    output: StageOutput,
    executions: Mutex<Vec<StageInputs>>,
}

impl RecordingStage {
    /// Creates a new recording stage returning an empty output.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: StageDescriptor::new(name),
            output: StageOutput::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Declares the stage's inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor = self.descriptor.with_inputs(inputs);
        self
    }

    /// Sets the output returned by every call, declaring its keys.
    #[must_use]
    pub fn returning(mut self, output: StageOutput) -> Self {
        self.descriptor = self.descriptor.with_outputs(output.data.keys().cloned());
        self.output = output;
        self
    }

    /// Returns all recorded input bags.
    #[must_use]
    pub fn executions(&self) -> Vec<StageInputs> {
        self.executions.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    async fn process(&self, inputs: StageInputs) -> anyhow::Result<StageOutput> {
        self.executions.lock().push(inputs);
        Ok(self.output.clone())
    }
}
