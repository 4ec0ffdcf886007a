//! Error types for storyteller.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Sound asset errors
    #[error("Failed to load sound {name}: {message}")]
    SoundLoad { name: String, message: String },

    // Image generation errors
    #[error("Image generation failed: {message}")]
    ImageGeneration { message: String },

    #[error("Image generation timed out after {}ms", .after.as_millis())]
    GenerationTimeout { after: Duration },

    // Pipeline errors
    #[error("Channel closed while {stage} was pushing a frame")]
    ChannelClosed { stage: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, StoryError>;
