//! Core domain model types for murmur.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Stage outputs and the output bag they carry
//! - Node execution states
//! - Declared side-effect tags
//! - The opaque `DataSource` plugin payload

mod data_source;
mod effect;
mod output;
mod status;

pub use data_source::{collect_data_sources, DataSource};
pub use effect::Effect;
pub use output::{OutputBag, StageOutput};
pub use status::NodeState;
