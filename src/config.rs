use crate::defaults;
use crate::error::{Result, StoryError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub story: StoryConfig,
    pub image: ImageConfig,
    pub sounds: SoundsConfig,
    pub pipeline: PipelineConfig,
}

/// Story segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoryConfig {
    /// Pages must be longer than this many characters.
    pub min_page_chars: usize,
    /// Buffer cap in characters (0 disables).
    pub max_buffer_chars: usize,
    /// Push the ding sound after every page.
    pub play_page_ding: bool,
}

/// Image generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub timeout_ms: u64,
    pub prompt_template: String,
}

/// Sound asset configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundsConfig {
    /// Directory holding the WAV files. `None` uses silent clips.
    pub dir: Option<PathBuf>,
    pub talking: String,
    pub listening: String,
    pub ding: String,
}

/// Pipeline wiring configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub channel_buffer_size: usize,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            min_page_chars: defaults::MIN_PAGE_CHARS,
            max_buffer_chars: defaults::MAX_BUFFER_CHARS,
            play_page_ding: false,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::IMAGE_TIMEOUT_MS,
            prompt_template: defaults::IMAGE_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl ImageConfig {
    /// Bound applied to each image generation.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Substitutes the tag payload into the prompt template.
    pub fn render_prompt(&self, text: &str) -> String {
        self.prompt_template
            .replace(defaults::PROMPT_PLACEHOLDER, text)
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            talking: defaults::TALKING_SOUND.to_string(),
            listening: defaults::LISTENING_SOUND.to_string(),
            ding: defaults::DING_SOUND.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: defaults::CHANNEL_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(StoryError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file missing, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - STORYTELLER_SOUNDS_DIR → sounds.dir
    /// - STORYTELLER_IMAGE_TIMEOUT_MS → image.timeout_ms
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("STORYTELLER_SOUNDS_DIR")
            && !dir.is_empty()
        {
            self.sounds.dir = Some(PathBuf::from(dir));
        }

        if let Ok(timeout) = std::env::var("STORYTELLER_IMAGE_TIMEOUT_MS")
            && !timeout.is_empty()
        {
            match timeout.parse::<u64>() {
                Ok(ms) => self.image.timeout_ms = ms,
                Err(e) => {
                    tracing::warn!(
                        value = %timeout,
                        error = %e,
                        "ignoring STORYTELLER_IMAGE_TIMEOUT_MS"
                    )
                }
            }
        }

        self
    }

    /// Checks values that deserialize fine but cannot drive a pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.image.timeout_ms == 0 {
            return Err(StoryError::ConfigInvalidValue {
                key: "image.timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !self.image.prompt_template.contains(defaults::PROMPT_PLACEHOLDER) {
            return Err(StoryError::ConfigInvalidValue {
                key: "image.prompt_template".to_string(),
                message: format!("must contain {}", defaults::PROMPT_PLACEHOLDER),
            });
        }
        if self.pipeline.channel_buffer_size == 0 {
            return Err(StoryError::ConfigInvalidValue {
                key: "pipeline.channel_buffer_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/storyteller/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("storyteller").join("config.toml"))
    }
}
