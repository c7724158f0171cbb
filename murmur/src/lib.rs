//! # Murmur
//!
//! A pipeline execution engine for staged content generation.
//!
//! A pipeline is a named list of nodes. Each node places a registered
//! [`Stage`](stages::Stage) into the graph and wires its inputs from
//! literals, configuration keys (`$config.<key>`) or other nodes' outputs
//! (`$<node>.<output>`). The engine:
//!
//! - **Validates** the graph before anything runs: stages exist, every
//!   reference names a real node and a declared output, no cycles
//! - **Schedules** nodes in a deterministic topological order
//! - **Executes** nodes one at a time, stopping at the first failure
//! - **Replays** selected nodes from per-run snapshots, so a long pipeline
//!   can be resumed from the middle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use murmur::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = StageRegistry::new();
//! registry.register(Arc::new(NewsFetcher::new()));
//! registry.register(Arc::new(BriefPlanner::new()));
//!
//! let profile = Profile::load("profiles/morning.yaml")?;
//! let executor = GraphExecutor::from_settings(&registry, &EngineSettings::from_env());
//! let state = executor.execute_file("graphs/briefing.yaml", &profile.config_bag()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigBag, EngineSettings, Profile};
    pub use crate::core::{collect_data_sources, DataSource, Effect, NodeState, OutputBag, StageOutput};
    pub use crate::errors::{
        ArtifactStoreError, ConfigError, ContractErrorInfo, CycleDetectedError, GraphValidationError,
        MurmurError, PipelineLoadError, StageExecutionError, StageNotFoundError,
    };
    pub use crate::events::{CollectingEventSink, EventKind, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, TracingConfig};
    pub use crate::pipeline::{
        load_pipeline, parse_json, parse_yaml, ExecutionPlan, GraphExecutor, NodeDefinition,
        PipelineDefinition, RunState, Wiring,
    };
    pub use crate::stages::{FnStage, Stage, StageDescriptor, StageInputs, StageRegistry};
    pub use crate::store::{ArtifactStore, FileArtifactStore, InMemoryArtifactStore};
}
