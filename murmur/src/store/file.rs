//! Snapshot files in a directory.

use super::ArtifactStore;
use crate::core::OutputBag;
use crate::errors::ArtifactStoreError;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// Bytes kept as-is in a path component; everything else is `%XX`-encoded,
/// including `.`, `%` and path separators.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Stores each snapshot as `{dir}/{run_id}/{node}.json`.
///
/// Both components are percent-encoded, so every `(run_id, node)` pair maps
/// to its own file inside `dir`. Files hold the bare output bag as
/// pretty-printed JSON. Writes go to a temporary sibling first and are
/// renamed into place, so a reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the directory holding a run's snapshots.
    #[must_use]
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.dir.join(encode_component(run_id))
    }

    /// Returns the snapshot path for a node in a run.
    #[must_use]
    pub fn snapshot_path(&self, run_id: &str, node: &str) -> PathBuf {
        self.run_dir(run_id).join(format!("{}.json", encode_component(node)))
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactStoreError + '_ {
        move |source| ArtifactStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(&self, run_id: &str, node: &str, outputs: &OutputBag) -> Result<(), ArtifactStoreError> {
        let path = self.snapshot_path(run_id, node);
        let bytes = serde_json::to_vec_pretty(outputs).map_err(|source| ArtifactStoreError::Serialization {
            node: node.to_string(),
            source,
        })?;

        let run_dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&run_dir)
            .await
            .map_err(Self::io_error(&run_dir))?;

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::warn!(
                run_id,
                node,
                path = %path.display(),
                "Replacing existing snapshot"
            );
        }

        let tmp = run_dir.join(format!(".{}.json.tmp", encode_component(node)));
        tokio::fs::write(&tmp, &bytes).await.map_err(Self::io_error(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(Self::io_error(&path))?;

        tracing::debug!(run_id, node, path = %path.display(), "Saved snapshot");
        Ok(())
    }

    async fn load(&self, run_id: &str, node: &str) -> Result<Option<OutputBag>, ArtifactStoreError> {
        let path = self.snapshot_path(run_id, node);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ArtifactStoreError::Io { path, source }),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| ArtifactStoreError::Serialization {
                node: node.to_string(),
                source,
            })?;

        match value {
            serde_json::Value::Object(outputs) => Ok(Some(outputs)),
            _ => Err(ArtifactStoreError::Corrupt {
                run_id: run_id.to_string(),
                node: node.to_string(),
            }),
        }
    }

    fn locate(&self, run_id: &str, node: &str) -> String {
        self.snapshot_path(run_id, node).display().to_string()
    }
}
