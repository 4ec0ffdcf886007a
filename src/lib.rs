//! storyteller - Streamed narration into illustrated story pages
//!
//! Splits a language model's text stream into pages, pulls out image
//! prompts, and drives bounded image generation alongside turn-taking cues.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conversation;
pub mod defaults;
pub mod error;
pub mod sounds;
pub mod streaming;

// Stage framework
pub use streaming::processor::{FrameProcessor, FramePusher};
pub use streaming::image::ImageGenerator;

// Pipeline
pub use streaming::pipeline::{StoryPipeline, StoryPipelineHandle};

// Error handling
pub use error::{Result, StoryError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
