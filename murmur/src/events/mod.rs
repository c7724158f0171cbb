//! Run lifecycle events.
//!
//! The executor reports every node transition to an [`EventSink`]. Sinks are
//! passed to the executor explicitly; there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of event the executor emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A run passed validation and scheduling.
    #[serde(rename = "run.started")]
    RunStarted,
    /// A node is about to be executed.
    #[serde(rename = "node.started")]
    NodeStarted,
    /// A node's outputs were restored from a snapshot.
    #[serde(rename = "node.cache_hit")]
    NodeCacheHit,
    /// A node was requested from cache but had no snapshot.
    #[serde(rename = "node.cache_miss")]
    NodeCacheMiss,
    /// A node's stage returned outputs.
    #[serde(rename = "node.completed")]
    NodeCompleted,
    /// A node's stage returned an error.
    #[serde(rename = "node.failed")]
    NodeFailed,
    /// Every node finished.
    #[serde(rename = "run.completed")]
    RunCompleted,
    /// The run stopped at a failure.
    #[serde(rename = "run.failed")]
    RunFailed,
}

impl EventKind {
    /// Returns the dotted event type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run.started",
            Self::NodeStarted => "node.started",
            Self::NodeCacheHit => "node.cache_hit",
            Self::NodeCacheMiss => "node.cache_miss",
            Self::NodeCompleted => "node.completed",
            Self::NodeFailed => "node.failed",
            Self::RunCompleted => "run.completed",
            Self::RunFailed => "run.failed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_match_serde() {
        for kind in [
            EventKind::RunStarted,
            EventKind::NodeStarted,
            EventKind::NodeCacheHit,
            EventKind::NodeCacheMiss,
            EventKind::NodeCompleted,
            EventKind::NodeFailed,
            EventKind::RunCompleted,
            EventKind::RunFailed,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), serde_json::json!(kind.as_str()));
        }
    }
}
