//! Sequential graph execution with snapshot replay.

use super::loader::load_pipeline;
use super::resolve::Resolver;
use super::schedule::schedule;
use super::spec::{NodeDefinition, PipelineDefinition};
use super::validate::{validate, ValidatedGraph};
use crate::config::{ConfigBag, EngineSettings};
use crate::core::{NodeState, OutputBag};
use crate::errors::{MurmurError, StageExecutionError};
use crate::events::{EventKind, EventSink, NoOpEventSink};
use crate::observability::NodeTimer;
use crate::stages::{Stage, StageRegistry};
use crate::store::{ArtifactStore, FileArtifactStore};
use crate::utils::{generate_run_id, iso_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

/// The order a validated pipeline would run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The pipeline name.
    pub pipeline: String,
    /// Node names in execution order.
    pub order: Vec<String>,
}

/// What happened to one node during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The node name.
    pub node: String,
    /// The stage the node ran.
    pub stage: String,
    /// Final state.
    pub state: NodeState,
    /// Time spent on the node, including snapshot IO.
    pub duration_ms: f64,
}

/// The outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// The run id snapshots were read and written under.
    pub run_id: String,
    /// Output bags keyed by node name.
    pub outputs: BTreeMap<String, OutputBag>,
    /// File artifacts reported by executed stages. A later node's artifact
    /// replaces an earlier one with the same name.
    pub artifacts: BTreeMap<String, PathBuf>,
    /// Per-node records in execution order.
    pub nodes: Vec<NodeRecord>,
    /// Wall time of the whole run.
    pub duration_ms: f64,
}

impl RunState {
    fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Gets one output of one node.
    #[must_use]
    pub fn output(&self, node: &str, key: &str) -> Option<&serde_json::Value> {
        self.outputs.get(node).and_then(|bag| bag.get(key))
    }

    /// Returns a node's final state, `Pending` if it never ran.
    #[must_use]
    pub fn node_state(&self, node: &str) -> NodeState {
        self.nodes
            .iter()
            .find(|record| record.node == node)
            .map_or(NodeState::Pending, |record| record.state)
    }

    /// Returns the nodes that were replayed from snapshots.
    #[must_use]
    pub fn cache_hits(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|record| record.state == NodeState::CacheHit)
            .map(|record| record.node.as_str())
            .collect()
    }

    fn record(&mut self, node: &NodeDefinition, state: NodeState, outputs: OutputBag, timer: NodeTimer) {
        self.outputs.insert(node.name.clone(), outputs);
        self.nodes.push(NodeRecord {
            node: node.name.clone(),
            stage: node.stage.clone(),
            state,
            duration_ms: timer.elapsed_ms(),
        });
    }
}

/// Runs pipelines against a stage registry.
///
/// Nodes run one at a time in schedule order. A node listed in the cached
/// set is restored from its snapshot when one exists under this executor's
/// run id; otherwise it runs normally. The first stage failure stops the run.
pub struct GraphExecutor<'r> {
    registry: &'r StageRegistry,
    store: Option<Arc<dyn ArtifactStore>>,
    cached_nodes: BTreeSet<String>,
    run_id: String,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for GraphExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphExecutor")
            .field("registry", self.registry)
            .field("has_store", &self.store.is_some())
            .field("cached_nodes", &self.cached_nodes)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

impl<'r> GraphExecutor<'r> {
    /// Creates an executor with a fresh run id, no store and no cached nodes.
    #[must_use]
    pub fn new(registry: &'r StageRegistry) -> Self {
        Self {
            registry,
            store: None,
            cached_nodes: BTreeSet::new(),
            run_id: generate_run_id(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Creates an executor from engine settings.
    ///
    /// An artifact directory enables a [`FileArtifactStore`] rooted there.
    #[must_use]
    pub fn from_settings(registry: &'r StageRegistry, settings: &EngineSettings) -> Self {
        let mut executor = Self::new(registry)
            .with_run_id(settings.resolve_run_id())
            .with_cached_nodes(settings.cached_nodes.iter().cloned());
        if let Some(dir) = &settings.artifact_dir {
            executor = executor.with_store(Arc::new(FileArtifactStore::new(dir)));
        }
        executor
    }

    /// Sets the snapshot store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the nodes to replay from snapshots.
    #[must_use]
    pub fn with_cached_nodes(mut self, nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cached_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns the nodes that will be replayed when snapshots exist.
    #[must_use]
    pub fn cached_nodes(&self) -> &BTreeSet<String> {
        &self.cached_nodes
    }

    /// Validates and schedules a pipeline without running it.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or an internal error if scheduling fails.
    pub fn plan(&self, definition: &PipelineDefinition) -> Result<ExecutionPlan, MurmurError> {
        let validated = validate(definition, self.registry)?;
        let order = schedule(validated.graph())?;
        Ok(ExecutionPlan {
            pipeline: definition.name.clone(),
            order,
        })
    }

    /// Loads a pipeline definition from a file and executes it.
    ///
    /// # Errors
    ///
    /// Returns a load error, or any error [`GraphExecutor::execute`] returns.
    pub async fn execute_file(&self, path: impl AsRef<Path>, config: &ConfigBag) -> Result<RunState, MurmurError> {
        let definition = load_pipeline(path)?;
        self.execute(&definition, config).await
    }

    /// Validates, schedules and runs a pipeline.
    ///
    /// Nothing executes unless validation passes. Node outputs are recorded
    /// in the returned [`RunState`] and, when a store is configured,
    /// snapshotted under this executor's run id.
    ///
    /// # Errors
    ///
    /// Returns the validation error, the first stage failure, or a snapshot
    /// store failure.
    pub async fn execute(&self, definition: &PipelineDefinition, config: &ConfigBag) -> Result<RunState, MurmurError> {
        let span = tracing::info_span!(
            "pipeline_run",
            pipeline = %definition.name,
            run_id = %self.run_id,
        );
        self.execute_inner(definition, config).instrument(span).await
    }

    async fn execute_inner(&self, definition: &PipelineDefinition, config: &ConfigBag) -> Result<RunState, MurmurError> {
        let run_timer = NodeTimer::start();
        let validated = validate(definition, self.registry)?;
        let order = schedule(validated.graph())?;
        self.warn_on_cache_settings(&validated);
        tracing::debug!(order = ?order, "Scheduled nodes");

        tracing::info!(nodes = order.len(), "Pipeline run started");
        self.emit(
            EventKind::RunStarted,
            json!({
                "pipeline": definition.name,
                "run_id": self.run_id,
                "order": order,
                "at": iso_timestamp(),
            }),
        )
        .await;

        let mut state = RunState::new(self.run_id.clone());
        for name in &order {
            let (node, stage) = validated
                .node(name)
                .ok_or_else(|| MurmurError::Internal(format!("scheduled node '{name}' is not in the graph")))?;

            if let Err(err) = self.run_node(node, stage, config, &mut state).await {
                tracing::error!(node = %name, error = %err, "Pipeline run failed");
                self.emit(
                    EventKind::RunFailed,
                    json!({
                        "pipeline": definition.name,
                        "run_id": self.run_id,
                        "node": name,
                        "error": err.to_string(),
                        "at": iso_timestamp(),
                    }),
                )
                .await;
                return Err(err);
            }
        }

        state.duration_ms = run_timer.elapsed_ms();
        tracing::info!(
            nodes = state.nodes.len(),
            cache_hits = state.cache_hits().len(),
            duration_ms = state.duration_ms,
            "Pipeline run completed"
        );
        self.emit(
            EventKind::RunCompleted,
            json!({
                "pipeline": definition.name,
                "run_id": self.run_id,
                "duration_ms": state.duration_ms,
                "at": iso_timestamp(),
            }),
        )
        .await;
        Ok(state)
    }

    async fn run_node(
        &self,
        node: &NodeDefinition,
        stage: &Arc<dyn Stage>,
        config: &ConfigBag,
        state: &mut RunState,
    ) -> Result<(), MurmurError> {
        let timer = NodeTimer::start();

        if let Some(outputs) = self.restore(node).await? {
            tracing::info!(node = %node.name, "Node restored from snapshot");
            state.record(node, NodeState::CacheHit, outputs, timer);
            self.emit(EventKind::NodeCacheHit, self.node_payload(node, NodeState::CacheHit, &timer))
                .await;
            return Ok(());
        }

        tracing::debug!(node = %node.name, stage = %node.stage, "Executing node");
        self.emit(EventKind::NodeStarted, self.node_payload(node, NodeState::Running, &timer))
            .await;

        let required = &stage.descriptor().required_inputs;
        let inputs = Resolver::new(config, &state.outputs).resolve_inputs(node, required);
        let output = match stage.process(inputs).await {
            Ok(output) => output,
            Err(err) => {
                let err = StageExecutionError::new(node.name.clone(), stage.name(), err);
                self.emit(
                    EventKind::NodeFailed,
                    json!({
                        "node": node.name,
                        "stage": node.stage,
                        "run_id": self.run_id,
                        "state": NodeState::Failed,
                        "error": err.message,
                        "duration_ms": timer.elapsed_ms(),
                    }),
                )
                .await;
                return Err(err.into());
            }
        };

        let missing = output.missing_outputs(&stage.descriptor().produced_outputs);
        if !missing.is_empty() {
            tracing::warn!(
                node = %node.name,
                stage = %node.stage,
                missing = %missing.join(", "),
                "Stage omitted declared outputs"
            );
        }

        state.artifacts.extend(output.artifacts);
        state.record(node, NodeState::Completed, output.data, timer);

        if let Some(store) = &self.store {
            if let Some(outputs) = state.outputs.get(&node.name) {
                store.save(&self.run_id, &node.name, outputs).await?;
            }
        }

        tracing::info!(node = %node.name, duration_ms = timer.elapsed_ms(), "Node completed");
        self.emit(EventKind::NodeCompleted, self.node_payload(node, NodeState::Completed, &timer))
            .await;
        Ok(())
    }

    /// Loads a cached node's snapshot. `None` means run the node.
    async fn restore(&self, node: &NodeDefinition) -> Result<Option<OutputBag>, MurmurError> {
        if !self.cached_nodes.contains(&node.name) {
            return Ok(None);
        }
        let Some(store) = &self.store else {
            return Ok(None);
        };

        match store.load(&self.run_id, &node.name).await? {
            Some(outputs) => Ok(Some(outputs)),
            None => {
                tracing::warn!(
                    node = %node.name,
                    snapshot = %store.locate(&self.run_id, &node.name),
                    "Cached node has no snapshot; executing instead"
                );
                self.emit(EventKind::NodeCacheMiss, json!({"node": node.name, "run_id": self.run_id}))
                    .await;
                Ok(None)
            }
        }
    }

    fn warn_on_cache_settings(&self, validated: &ValidatedGraph) {
        if self.cached_nodes.is_empty() {
            return;
        }
        if self.store.is_none() {
            tracing::warn!(
                cached = ?self.cached_nodes,
                "Cached nodes requested without an artifact store; every node will execute"
            );
        }
        for name in &self.cached_nodes {
            if validated.node(name).is_none() {
                tracing::warn!(node = %name, "Cached node is not in the pipeline; ignoring");
            }
        }
    }

    fn node_payload(&self, node: &NodeDefinition, state: NodeState, timer: &NodeTimer) -> serde_json::Value {
        json!({
            "node": node.name,
            "stage": node.stage,
            "run_id": self.run_id,
            "state": state,
            "duration_ms": timer.elapsed_ms(),
        })
    }

    async fn emit(&self, kind: EventKind, data: serde_json::Value) {
        self.event_sink.emit(kind, data).await;
    }
}
