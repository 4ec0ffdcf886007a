//! Story segmentation stage.
//!
//! Buffers streamed narration, pulls out image tags and page breaks as soon as
//! they are complete, and drives the turn-taking cues:
//!
//! ```text
//!   TextDelta ──▶ buffer ──▶ <tag>    ──▶ StoryImage
//!                        └─▶ [break]  ──▶ StoryPage + Transport(AssistantTurn)
//!   ResponseEnd ──▶ StoryPrompt(rest) + ResponseEnd + Transport(UserTurn) + Audio(listening)
//!   UserStoppedSpeaking ──▶ Transport(AssistantTurn) + Audio(talking)
//! ```

use crate::config::StoryConfig;
use crate::conversation::{Conversation, Story};
use crate::error::Result;
use crate::sounds::SoundBank;
use crate::streaming::frame::{Cue, Frame, FrameDirection, Sound};
use crate::streaming::markup::{Markup, normalize_page, unterminated_tag_start};
use crate::streaming::processor::{FramePusher, FrameProcessor};
use async_trait::async_trait;
use std::sync::Arc;

/// Whether the story processor is holding unconsumed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryState {
    /// Buffer is empty.
    Idle,
    /// Buffer holds text awaiting markup.
    Accumulating,
}

/// Turns the language model's text stream into pages and image triggers.
pub struct StoryProcessor {
    conversation: Conversation,
    story: Story,
    sounds: Arc<SoundBank>,
    config: StoryConfig,
    /// Text not yet matched against markup.
    buffer: String,
    /// Trailing whitespace kept out of a post-break buffer, restored if more text follows.
    held_whitespace: String,
    /// A break left the buffer empty: leading whitespace of the next text is dropped.
    trim_leading: bool,
    /// A break happened this turn, so the buffer is kept trimmed at both ends.
    after_break: bool,
    /// The cap cut off an open image tag; its tail is dropped up to the closing `>`.
    discarding_tag: bool,
}

impl StoryProcessor {
    /// Creates a story processor with default configuration.
    pub fn new(conversation: Conversation, story: Story, sounds: Arc<SoundBank>) -> Self {
        Self::with_config(conversation, story, sounds, StoryConfig::default())
    }

    /// Creates a story processor with custom configuration.
    pub fn with_config(
        conversation: Conversation,
        story: Story,
        sounds: Arc<SoundBank>,
        config: StoryConfig,
    ) -> Self {
        Self {
            conversation,
            story,
            sounds,
            config,
            buffer: String::new(),
            held_whitespace: String::new(),
            trim_leading: false,
            after_break: false,
            discarding_tag: false,
        }
    }

    /// Current unconsumed text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether text is waiting in the buffer.
    pub fn state(&self) -> StoryState {
        if self.buffer.is_empty() {
            StoryState::Idle
        } else {
            StoryState::Accumulating
        }
    }

    /// Handle to the shared story pages.
    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Handle to the conversation this story belongs to.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn append(&mut self, text: &str) {
        let text = self.skip_discarded_tag(text);
        let text = if self.trim_leading {
            text.trim_start()
        } else {
            text
        };
        if text.is_empty() {
            return;
        }
        self.trim_leading = false;
        let held = std::mem::take(&mut self.held_whitespace);
        self.buffer.push_str(&held);
        self.buffer.push_str(text);
        if self.after_break {
            self.hold_trailing_whitespace();
        }
    }

    /// Drops the tail of a tag the cap already cut off.
    fn skip_discarded_tag<'a>(&mut self, text: &'a str) -> &'a str {
        if !self.discarding_tag {
            return text;
        }
        match text.find('>') {
            Some(close) => {
                self.discarding_tag = false;
                tracing::debug!(dropped = close + 1, "end of discarded image tag");
                &text[close + 1..]
            }
            None => "",
        }
    }

    /// Moves trailing whitespace from the buffer into `held_whitespace`.
    ///
    /// A break remainder is trimmed, but whitespace at the end of one delta may sit
    /// between words once the next delta arrives.
    fn hold_trailing_whitespace(&mut self) {
        let body_end = self.buffer.trim_end().len();
        let tail = self.buffer.split_off(body_end);
        self.held_whitespace.push_str(&tail);
    }

    /// Replaces the buffer with the text after a break, trimmed.
    fn set_remainder(&mut self, remainder: &str) {
        self.after_break = true;
        self.held_whitespace.clear();
        self.buffer = remainder.trim_start().to_string();
        if self.buffer.is_empty() {
            self.trim_leading = true;
        } else {
            self.trim_leading = false;
            self.hold_trailing_whitespace();
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.held_whitespace.clear();
        self.trim_leading = false;
        self.after_break = false;
        self.discarding_tag = false;
    }

    /// Runs the markup extraction loop until no complete construct remains.
    async fn extract(&mut self, pusher: &FramePusher) -> Result<()> {
        while let Some(markup) = Markup::earliest(&self.buffer) {
            match markup {
                Markup::Image { span, prompt } => {
                    self.buffer.replace_range(span, "");
                    tracing::debug!(prompt = %prompt, "image tag extracted");
                    pusher.push(Frame::StoryImage(prompt)).await?;
                }
                Markup::Break { span } => {
                    let page = normalize_page(&self.buffer[..span.start]);
                    let mut remainder = self.buffer[span.end..].to_string();
                    remainder.push_str(&self.held_whitespace);
                    self.set_remainder(&remainder);
                    self.emit_page(page, pusher).await?;
                }
            }
        }
        Ok(())
    }

    /// Applies the buffer cap after extraction.
    async fn enforce_cap(&mut self, pusher: &FramePusher) -> Result<()> {
        let max = self.config.max_buffer_chars;
        if max == 0 || self.buffer.chars().count() <= max {
            return Ok(());
        }

        if let Some(open) = unterminated_tag_start(&self.buffer) {
            tracing::warn!(
                discarded = self.buffer.len() - open,
                "buffer over cap, discarding unterminated image tag"
            );
            self.buffer.truncate(open);
            self.held_whitespace.clear();
            self.discarding_tag = true;
        }

        if self.buffer.chars().count() > max {
            tracing::warn!(
                chars = self.buffer.chars().count(),
                max,
                "buffer over cap without a break, forcing a page"
            );
            let page = normalize_page(&self.buffer);
            self.set_remainder("");
            self.emit_page(page, pusher).await?;
        }
        Ok(())
    }

    async fn emit_page(&mut self, page: String, pusher: &FramePusher) -> Result<()> {
        let chars = page.chars().count();
        if chars <= self.config.min_page_chars {
            tracing::debug!(chars, "segment too short for a page, dropped");
            return Ok(());
        }

        tracing::debug!(chars, page = self.story.len() + 1, "story page");
        self.story.append(page.clone());
        pusher.push(Frame::StoryPage(page)).await?;
        if self.config.play_page_ding {
            pusher.push(self.sound(Sound::Ding)).await?;
        }
        pusher.push(Frame::Transport(Cue::AssistantTurn)).await
    }

    fn sound(&self, sound: Sound) -> Frame {
        Frame::Audio(self.sounds.clip(sound).clone())
    }
}

#[async_trait]
impl FrameProcessor for StoryProcessor {
    fn name(&self) -> &'static str {
        "StoryProcessor"
    }

    async fn process_frame(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        pusher: &FramePusher,
    ) -> Result<()> {
        match frame {
            Frame::UserStoppedSpeaking => {
                pusher.push(Frame::Transport(Cue::AssistantTurn)).await?;
                pusher.push(self.sound(Sound::Talking)).await
            }
            Frame::TextDelta(text) => {
                self.append(&text);
                self.extract(pusher).await?;
                self.enforce_cap(pusher).await
            }
            Frame::ResponseEnd => {
                if !self.buffer.is_empty() {
                    let rest = std::mem::take(&mut self.buffer);
                    tracing::debug!(
                        chars = rest.chars().count(),
                        messages = self.conversation.len(),
                        "replaying unconsumed text as prompt"
                    );
                    pusher.push(Frame::StoryPrompt(rest)).await?;
                }
                self.reset();
                pusher.push(Frame::ResponseEnd).await?;
                pusher.push(Frame::Transport(Cue::UserTurn)).await?;
                pusher.push(self.sound(Sound::Listening)).await
            }
            other => pusher.push_in(other, direction).await,
        }
    }
}
