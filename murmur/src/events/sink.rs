//! Event sink trait and implementations.

use super::EventKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::Level;

/// Receives run lifecycle events.
///
/// Sinks must not fail the run: delivery problems are logged and dropped.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    async fn emit(&self, kind: EventKind, data: serde_json::Value);

    /// Emits an event without awaiting.
    fn try_emit(&self, kind: EventKind, data: serde_json::Value);
}

/// Discards every event. The executor's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _kind: EventKind, _data: serde_json::Value) {}

    fn try_emit(&self, _kind: EventKind, _data: serde_json::Value) {}
}

/// Writes events to the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a sink that logs at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log(&self, kind: EventKind, data: &serde_json::Value) {
        if self.level == Level::DEBUG || self.level == Level::TRACE {
            tracing::debug!(event_type = %kind, event_data = %data, "Event: {kind}");
        } else {
            tracing::info!(event_type = %kind, event_data = %data, "Event: {kind}");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, kind: EventKind, data: serde_json::Value) {
        self.log(kind, &data);
    }

    fn try_emit(&self, kind: EventKind, data: serde_json::Value) {
        self.log(kind, &data);
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(EventKind, serde_json::Value)>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(EventKind, serde_json::Value)> {
        self.events.read().clone()
    }

    /// Returns the collected event kinds in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|(kind, _)| *kind).collect()
    }

    /// Returns the payloads of every event of one kind.
    #[must_use]
    pub fn events_of(&self, kind: EventKind) -> Vec<serde_json::Value> {
        self.events
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Returns the `node` field of every event of one kind.
    #[must_use]
    pub fn nodes_for(&self, kind: EventKind) -> Vec<String> {
        self.events_of(kind)
            .iter()
            .filter_map(|data| data.get("node").and_then(serde_json::Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, kind: EventKind, data: serde_json::Value) {
        self.events.write().push((kind, data));
    }

    fn try_emit(&self, kind: EventKind, data: serde_json::Value) {
        self.events.write().push((kind, data));
    }
}
