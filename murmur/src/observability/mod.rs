//! Tracing setup and run span helpers.
//!
//! The engine only emits `tracing` events; installing a subscriber is the
//! caller's choice. [`init_tracing`] installs the default one.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "murmur=info";

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit one JSON object per line instead of human-readable text.
    #[serde(default)]
    pub json: bool,
    /// Include the event target in output.
    #[serde(default = "default_true")]
    pub with_target: bool,
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            with_target: true,
        }
    }
}

impl TracingConfig {
    /// Sets the fallback filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Switches to JSON output.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over [`TracingConfig::filter`].
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.with_target);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Times one node and reports its duration.
#[derive(Debug, Clone, Copy)]
pub struct NodeTimer {
    started: Instant,
}

impl NodeTimer {
    /// Starts timing.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Returns elapsed milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();

        assert_eq!(config.filter, "murmur=info");
        assert!(!config.json);
        assert!(config.with_target);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TracingConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();

        assert!(config.json);
        assert_eq!(config.filter, DEFAULT_FILTER);
    }

    #[test]
    fn test_second_init_fails() {
        let config = TracingConfig::default().with_filter("murmur=debug");
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn test_node_timer() {
        let timer = NodeTimer::start();
        assert!(timer.elapsed_ms() >= 0.0);
    }
}
