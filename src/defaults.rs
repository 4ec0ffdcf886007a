//! Default configuration constants for storyteller.
//!
//! Shared between the config types and the processors so the two never drift.

/// Default bound on a single image generation, in milliseconds.
///
/// Covers the whole generation stream, not each produced frame.
pub const IMAGE_TIMEOUT_MS: u64 = 7000;

/// A page must have more than this many characters after normalization.
pub const MIN_PAGE_CHARS: usize = 2;

/// Maximum characters held in the story buffer before the overflow policy kicks in.
///
/// `0` disables the cap.
pub const MAX_BUFFER_CHARS: usize = 4096;

/// Placeholder replaced by the image tag payload in the prompt template.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Default image prompt template.
pub const IMAGE_PROMPT_TEMPLATE: &str =
    "illustrative art of {prompt}. In the style of Studio Ghibli. colorful, whimsical, painterly, concept art.";

/// Bounded channel capacity between pipeline stages.
pub const CHANNEL_BUFFER_SIZE: usize = 100;

/// Sound played when the assistant starts talking.
pub const TALKING_SOUND: &str = "talking.wav";

/// Sound played when the assistant hands the turn back to the user.
pub const LISTENING_SOUND: &str = "listening.wav";

/// Optional sound played after each page.
pub const DING_SOUND: &str = "ding.wav";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_template_contains_placeholder() {
        assert!(IMAGE_PROMPT_TEMPLATE.contains(PROMPT_PLACEHOLDER));
    }

    #[test]
    fn test_image_timeout_is_seven_seconds() {
        assert_eq!(IMAGE_TIMEOUT_MS, 7000);
    }
}
