//! Story pipeline orchestrator.
//!
//! Connects the stages and manages the flow:
//! Language model → StoryProcessor → StoryImageProcessor → Transport

use crate::config::Config;
use crate::conversation::{Conversation, Story};
use crate::error::{Result, StoryError};
use crate::sounds::SoundBank;
use crate::streaming::frame::Frame;
use crate::streaming::image::{ImageGenerator, StoryImageProcessor};
use crate::streaming::processor::{FramePusher, run_processor};
use crate::streaming::story::StoryProcessor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a running story pipeline.
pub struct StoryPipelineHandle {
    input: Option<mpsc::Sender<Frame>>,
    output: mpsc::Receiver<Frame>,
    tasks: Vec<JoinHandle<()>>,
}

impl StoryPipelineHandle {
    /// Sends a frame into the first stage.
    pub async fn send(&self, frame: Frame) -> Result<()> {
        let input = self.input.as_ref().ok_or_else(|| StoryError::ChannelClosed {
            stage: "pipeline input".to_string(),
        })?;
        input
            .send(frame)
            .await
            .map_err(|_| StoryError::ChannelClosed {
                stage: "pipeline input".to_string(),
            })
    }

    /// Returns a sender for feeding frames from another task.
    pub fn sender(&self) -> Option<mpsc::Sender<Frame>> {
        self.input.clone()
    }

    /// Receives the next frame leaving the last stage.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.output.recv().await
    }

    /// Closes the input, drains every remaining output frame and waits for the stages.
    pub async fn finish(mut self) -> Vec<Frame> {
        self.input = None;
        let mut frames = Vec::new();
        while let Some(frame) = self.output.recv().await {
            frames.push(frame);
        }
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "pipeline stage panicked");
            }
        }
        frames
    }
}

/// Story pipeline that wires the processors together.
pub struct StoryPipeline {
    config: Config,
}

impl StoryPipeline {
    /// Creates a new pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new pipeline with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Spawns one task per stage and returns the handle feeding the first one.
    ///
    /// # Arguments
    /// * `conversation` - Conversation the story belongs to
    /// * `story` - Shared page list, written only by the story stage
    /// * `sounds` - Cue sounds
    /// * `generator` - Image generation capability
    pub fn spawn<G: ImageGenerator + 'static>(
        &self,
        conversation: Conversation,
        story: Story,
        sounds: Arc<SoundBank>,
        generator: G,
    ) -> StoryPipelineHandle {
        let capacity = self.config.pipeline.channel_buffer_size.max(1);

        let (input_tx, input_rx) = mpsc::channel::<Frame>(capacity);
        let (story_tx, story_rx) = mpsc::channel::<Frame>(capacity);
        let (output_tx, output_rx) = mpsc::channel::<Frame>(capacity);

        let story_stage = StoryProcessor::with_config(
            conversation,
            story,
            sounds,
            self.config.story.clone(),
        );
        let image_stage = StoryImageProcessor::with_config(generator, self.config.image.clone());

        let story_pusher = FramePusher::new("StoryProcessor", story_tx);
        let image_pusher = FramePusher::new("StoryImageProcessor", output_tx);

        let story_task = tokio::spawn(run_processor(story_stage, input_rx, story_pusher));
        let image_task = tokio::spawn(run_processor(image_stage, story_rx, image_pusher));

        StoryPipelineHandle {
            input: Some(input_tx),
            output: output_rx,
            tasks: vec![story_task, image_task],
        }
    }
}

impl Default for StoryPipeline {
    fn default() -> Self {
        Self::new()
    }
}
