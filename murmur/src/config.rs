//! Run configuration and engine settings.
//!
//! A [`ConfigBag`] is the flat key/value map `$config.<key>` references read
//! from. A [`Profile`] is the on-disk form a caller keeps per use case: an
//! optional graph path plus the config bag. [`EngineSettings`] carries the
//! knobs for the engine itself (artifact directory, run id, cached nodes).

use crate::errors::ConfigError;
use crate::utils::generate_run_id;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config key that defaults to `"output"` when a profile omits it.
pub const OUTPUT_DIR_KEY: &str = "output_dir";

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Environment variable naming the artifact directory.
pub const ENV_ARTIFACT_DIR: &str = "MURMUR_ARTIFACT_DIR";
/// Environment variable naming the run id.
pub const ENV_RUN_ID: &str = "MURMUR_RUN_ID";
/// Environment variable listing nodes to replay, comma separated.
pub const ENV_CACHED_NODES: &str = "MURMUR_CACHED_NODES";

/// Flat configuration map read by `$config.<key>` references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigBag(serde_json::Map<String, serde_json::Value>);

impl ConfigBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bag from an existing map.
    #[must_use]
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value)
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns true if the key is present (even with a `null` value).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }

    /// Parses a bag from YAML text. An empty document is an empty bag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text is not YAML or not a mapping.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_value(serde_yaml::from_str(text)?)
    }

    /// Parses a bag from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text is not JSON or not an object.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Loads a bag from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        if is_json(path) {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            serde_json::Value::Null => Ok(Self::default()),
            _ => Err(ConfigError::NotAMapping),
        }
    }
}

impl FromIterator<(String, serde_json::Value)> for ConfigBag {
    fn from_iter<T: IntoIterator<Item = (String, serde_json::Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A saved use case: which graph to run and the config to run it with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Path to the pipeline definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<PathBuf>,

    /// Values for `$config.<key>` references.
    #[serde(default)]
    pub config: ConfigBag,
}

impl Profile {
    /// Parses a profile from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text is not a valid profile.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a profile from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = read(path)?;
        let profile = if is_json(path) {
            serde_json::from_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::debug!(path = %path.display(), "Loaded profile");
        Ok(profile)
    }

    /// Returns the config bag with defaults applied.
    ///
    /// `output_dir` defaults to `"output"`.
    #[must_use]
    pub fn config_bag(&self) -> ConfigBag {
        let mut bag = self.config.clone();
        if !bag.contains_key(OUTPUT_DIR_KEY) {
            bag.insert(OUTPUT_DIR_KEY, serde_json::Value::String(DEFAULT_OUTPUT_DIR.to_string()));
        }
        bag
    }
}

/// Settings for the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Directory for per-node snapshots. No snapshots are kept when unset.
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,

    /// Run id to execute under. A fresh id is generated when unset.
    #[serde(default)]
    pub run_id: Option<String>,

    /// Nodes to replay from snapshots instead of executing.
    #[serde(default)]
    pub cached_nodes: Vec<String>,
}

impl EngineSettings {
    /// Creates settings with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from `MURMUR_ARTIFACT_DIR`, `MURMUR_RUN_ID` and
    /// `MURMUR_CACHED_NODES`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through a variable lookup function.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            artifact_dir: non_empty(ENV_ARTIFACT_DIR).map(PathBuf::from),
            run_id: non_empty(ENV_RUN_ID),
            cached_nodes: non_empty(ENV_CACHED_NODES)
                .map(|list| parse_node_list(&list))
                .unwrap_or_default(),
        }
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Sets the run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Sets the cached nodes.
    #[must_use]
    pub fn with_cached_nodes(mut self, nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cached_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the configured run id or generates a fresh one.
    #[must_use]
    pub fn resolve_run_id(&self) -> String {
        self.run_id.clone().unwrap_or_else(generate_run_id)
    }
}

/// Splits a comma-separated node list, trimming entries and dropping empties.
#[must_use]
pub fn parse_node_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
