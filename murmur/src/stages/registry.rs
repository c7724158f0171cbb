//! Registry mapping stage names to stage instances.

use super::{Stage, StageDescriptor};
use crate::errors::StageNotFoundError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of stage instances.
///
/// Constructed once by the caller and passed by reference to validation and
/// execution. Stages are shared across every graph that references them.
#[derive(Default)]
pub struct StageRegistry {
    /// Registered stages by name.
    stages: RwLock<HashMap<String, Arc<dyn Stage>>>,
    /// Names in first-registration order.
    order: RwLock<Vec<String>>,
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &*self.order.read())
            .finish()
    }
}

impl StageRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage under its own name.
    ///
    /// Registering a name twice silently replaces the earlier stage; the
    /// name keeps its original listing position.
    pub fn register(&self, stage: Arc<dyn Stage>) {
        let name = stage.name().to_string();
        let replaced = self.stages.write().insert(name.clone(), stage).is_some();

        if replaced {
            tracing::debug!(stage = %name, "Replaced registered stage");
        } else {
            self.order.write().push(name);
        }
    }

    /// Gets a stage by name.
    ///
    /// # Errors
    ///
    /// Returns `StageNotFoundError` naming the stage if it is not registered.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Stage>, StageNotFoundError> {
        self.stages
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StageNotFoundError::new(name))
    }

    /// Checks if a stage is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stages.read().contains_key(name)
    }

    /// Lists registered stage names in registration order.
    #[must_use]
    pub fn list_all(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Describes every registered stage, sorted by name.
    #[must_use]
    pub fn describe_all(&self) -> Vec<StageDescriptor> {
        let mut descriptors: Vec<StageDescriptor> = self
            .stages
            .read()
            .values()
            .map(|stage| stage.descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    /// Returns true if no stages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }
}
