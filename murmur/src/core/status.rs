//! Node execution states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution state of a node within one run.
///
/// Every node starts `Pending` and ends either `CacheHit` (outputs replayed
/// from a snapshot) or `Completed` (stage ran). Node events carry the state
/// the node entered: `Running` when its stage is invoked, then `Completed`,
/// or `Failed` when the stage errors and the run aborts. A run state only
/// records nodes that reached `CacheHit` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Node has not been reached yet.
    Pending,
    /// Outputs were loaded from a snapshot; the stage was not invoked.
    CacheHit,
    /// The stage is processing the node.
    Running,
    /// The stage finished and its outputs were recorded.
    Completed,
    /// The stage raised an error.
    Failed,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::CacheHit => write!(f, "cache_hit"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl NodeState {
    /// Returns true if the state is final for the node.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CacheHit | Self::Completed | Self::Failed)
    }

    /// Returns true if the node's outputs are available downstream.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CacheHit | Self::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Pending.to_string(), "pending");
        assert_eq!(NodeState::CacheHit.to_string(), "cache_hit");
        assert_eq!(NodeState::Completed.to_string(), "completed");
    }

    #[test]
    fn test_node_state_is_terminal() {
        assert!(NodeState::CacheHit.is_terminal());
        assert!(NodeState::Completed.is_terminal());
        assert!(NodeState::Failed.is_terminal());
        assert!(!NodeState::Pending.is_terminal());
        assert!(!NodeState::Running.is_terminal());
        assert!(!NodeState::Failed.is_success());
    }

    #[test]
    fn test_node_state_serialize() {
        let json = serde_json::to_string(&NodeState::CacheHit).unwrap();
        assert_eq!(json, r#""cache_hit""#);

        let deserialized: NodeState = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, NodeState::CacheHit);
    }
}
