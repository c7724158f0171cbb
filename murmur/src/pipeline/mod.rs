//! Pipeline definitions, validation and execution.
//!
//! This module provides:
//! - Definition loading from YAML and JSON
//! - Typed input wiring
//! - Static validation and cycle detection
//! - Deterministic topological scheduling
//! - Sequential execution with snapshot replay

mod executor;
mod graph;
mod loader;
mod resolve;
mod schedule;
mod spec;
mod validate;
mod wiring;


pub use executor::{ExecutionPlan, GraphExecutor, NodeRecord, RunState};
pub use graph::DependencyGraph;
pub use loader::{load_pipeline, parse_json, parse_yaml};
pub use resolve::{Resolution, Resolver};
pub use schedule::schedule;
pub use spec::{NodeDefinition, PipelineDefinition};
pub use validate::{validate, ValidatedGraph};
pub use wiring::{MalformedReference, Wiring};
