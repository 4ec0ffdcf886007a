//! Frame types for the story pipeline.
//!
//! Defines the closed set of messages that flow between pipeline stages.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Direction a frame travels through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameDirection {
    /// From the language model towards the transport.
    #[default]
    Downstream,
    /// Back towards the language model.
    Upstream,
}

/// Turn-taking cue sent to the UI over the transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    /// The assistant is narrating.
    AssistantTurn,
    /// The assistant is waiting for the user.
    UserTurn,
}

impl Cue {
    /// Serialize cue to the JSON message the UI expects.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Named sounds the story processor can cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Talking,
    Listening,
    Ding,
}

impl Sound {
    pub fn name(&self) -> &'static str {
        match self {
            Sound::Talking => "talking",
            Sound::Listening => "listening",
            Sound::Ding => "ding",
        }
    }
}

/// Decoded sound payload.
///
/// Samples are shared so pushing the same clip every turn never copies audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub sound: Sound,
    /// PCM samples (16-bit signed integers, interleaved).
    pub samples: Arc<[i16]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    /// Creates a clip from decoded samples.
    pub fn new(sound: Sound, samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            sound,
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Zero-length clip, used when no sound assets are configured.
    pub fn silent(sound: Sound) -> Self {
        Self::new(sound, Vec::new(), crate::sounds::SILENT_SAMPLE_RATE, 1)
    }

    /// Returns the duration of this clip in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        let frames = self.samples.len() as u64 / u64::from(self.channels.max(1));
        frames * 1000 / u64::from(self.sample_rate.max(1))
    }
}

/// Generated image produced by an image generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Encoded image bytes (format is up to the generator).
    pub bytes: Arc<[u8]>,
    /// Location of the image, when the generator hosts it.
    pub url: Option<String>,
    /// Pixel dimensions (width, height).
    pub size: (u32, u32),
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, size: (u32, u32)) -> Self {
        Self {
            bytes: bytes.into(),
            url: None,
            size,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Unified frame type that flows through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Incremental narration text from the language model.
    TextDelta(String),
    /// The language model finished its response for this turn.
    ResponseEnd,
    /// The user paused speaking.
    UserStoppedSpeaking,
    /// A validated page of the story.
    StoryPage(String),
    /// Request to illustrate the embedded prompt text.
    StoryImage(String),
    /// Unconsumed response text, replayed into the conversation context.
    StoryPrompt(String),
    /// UI cue for the transport channel.
    Transport(Cue),
    /// Audio cue.
    Audio(AudioClip),
    /// Generated image.
    Image(ImageData),
}

impl Frame {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::TextDelta(_) => "text_delta",
            Frame::ResponseEnd => "response_end",
            Frame::UserStoppedSpeaking => "user_stopped_speaking",
            Frame::StoryPage(_) => "story_page",
            Frame::StoryImage(_) => "story_image",
            Frame::StoryPrompt(_) => "story_prompt",
            Frame::Transport(_) => "transport",
            Frame::Audio(_) => "audio",
            Frame::Image(_) => "image",
        }
    }

    /// Text payload, for the variants that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Frame::TextDelta(t)
            | Frame::StoryPage(t)
            | Frame::StoryImage(t)
            | Frame::StoryPrompt(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_json_format() {
        assert_eq!(
            Cue::AssistantTurn.to_json().unwrap(),
            r#"{"cue":"assistant_turn"}"#
        );
        assert_eq!(Cue::UserTurn.to_json().unwrap(), r#"{"cue":"user_turn"}"#);
    }

    #[test]
    fn test_cue_deserializes_from_ui_message() {
        let cue: Cue = serde_json::from_str(r#"{"cue":"user_turn"}"#).unwrap();
        assert_eq!(cue, Cue::UserTurn);
    }

    #[test]
    fn test_frame_kind_names() {
        assert_eq!(Frame::TextDelta("hi".into()).kind(), "text_delta");
        assert_eq!(Frame::ResponseEnd.kind(), "response_end");
        assert_eq!(Frame::Transport(Cue::UserTurn).kind(), "transport");
        assert_eq!(
            Frame::Audio(AudioClip::silent(Sound::Ding)).kind(),
            "audio"
        );
    }

    #[test]
    fn test_frame_text_accessor() {
        assert_eq!(Frame::StoryPage("once".into()).text(), Some("once"));
        assert_eq!(Frame::StoryImage("a fox".into()).text(), Some("a fox"));
        assert_eq!(Frame::ResponseEnd.text(), None);
        assert_eq!(Frame::Image(ImageData::new(vec![1], (1, 1))).text(), None);
    }

    #[test]
    fn test_audio_clip_duration() {
        let clip = AudioClip::new(Sound::Ding, vec![0i16; 32000], 16000, 2);
        assert_eq!(clip.duration_ms(), 1000);
        assert_eq!(AudioClip::silent(Sound::Ding).duration_ms(), 0);
    }

    #[test]
    fn test_cloned_frame_shares_payload() {
        let frame = Frame::Image(ImageData::new(vec![7; 64], (8, 8)));
        let cloned = frame.clone();
        match (frame, cloned) {
            (Frame::Image(a), Frame::Image(b)) => assert!(Arc::ptr_eq(&a.bytes, &b.bytes)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_image_data_with_url() {
        let image = ImageData::new(vec![], (1024, 1024)).with_url("https://img.local/1");
        assert_eq!(image.url.as_deref(), Some("https://img.local/1"));
        assert_eq!(image.size, (1024, 1024));
    }
}
