//! Per-node output snapshots.
//!
//! After a node executes, its output bag is saved under `(run_id, node)`;
//! distinct pairs never share a snapshot.
//! A later run with the same run id can replay that node from the snapshot
//! instead of executing it. Only the output bag is stored; file artifacts a
//! stage reports are not.

mod file;
mod memory;

pub use file::FileArtifactStore;
pub use memory::InMemoryArtifactStore;

use crate::core::OutputBag;
use crate::errors::ArtifactStoreError;
use async_trait::async_trait;

/// Storage for per-node output snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Saves a node's outputs, replacing any earlier snapshot for the pair.
    async fn save(&self, run_id: &str, node: &str, outputs: &OutputBag) -> Result<(), ArtifactStoreError>;

    /// Loads a node's outputs. Returns `Ok(None)` when no snapshot exists.
    async fn load(&self, run_id: &str, node: &str) -> Result<Option<OutputBag>, ArtifactStoreError>;

    /// Describes where a snapshot lives, for logs.
    fn locate(&self, run_id: &str, node: &str) -> String;
}
