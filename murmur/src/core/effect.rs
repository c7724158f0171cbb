//! Declared side-effect tags.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A category of side effect a stage declares.
///
/// The engine records effects for introspection only; it never enforces
/// them. Input effects name what a stage reads from (a language model, an
/// MCP server), output effects name what it writes to (the filesystem, a
/// TTS engine).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Effect(Cow<'static, str>);

impl Effect {
    /// Calls out to a language model.
    pub const LLM: Self = Self(Cow::Borrowed("llm"));
    /// Reads or writes local files.
    pub const FILESYSTEM: Self = Self(Cow::Borrowed("filesystem"));
    /// Talks to a remote API.
    pub const NETWORK: Self = Self(Cow::Borrowed("network"));
    /// Drives a text-to-speech engine.
    pub const TTS: Self = Self(Cow::Borrowed("tts"));

    /// Creates a custom effect tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    /// Creates an effect for tools served by the named MCP server.
    #[must_use]
    pub fn mcp(server: &str) -> Self {
        Self(Cow::Owned(format!("mcp:{server}")))
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Effect {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
