//! Testing utilities for murmur pipelines.
//!
//! This module provides stub stages with call counting, forced failures and
//! input recording, for exercising graphs without real stage content.

mod mocks;

pub use mocks::{FailingStage, MockStage, RecordingStage};
