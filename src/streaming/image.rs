//! Image generation stage.
//!
//! Consumes `StoryImage` triggers and forwards whatever the generator streams back,
//! under one deadline for the whole stream. When the deadline passes the stream is
//! dropped, which cancels the in-flight request; frames already forwarded stay.

use crate::config::ImageConfig;
use crate::error::{Result, StoryError};
use crate::streaming::frame::{Frame, FrameDirection, ImageData};
use crate::streaming::processor::{FramePusher, FrameProcessor};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Lazy, finite sequence of frames produced for one prompt.
pub type ImageStream = BoxStream<'static, Result<Frame>>;

/// Capability that turns a prompt into generated image frames.
///
/// This trait allows swapping implementations (real service vs mock).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Starts a generation for `prompt`.
    ///
    /// Dropping the returned stream must release every resource the request holds.
    async fn generate(&self, prompt: &str) -> Result<ImageStream>;

    /// Get the name of the backing service
    fn name(&self) -> &str;
}

/// Implement ImageGenerator for Arc<T> to allow sharing across sessions.
#[async_trait]
impl<T: ImageGenerator> ImageGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<ImageStream> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Stage that performs bounded image generation for each trigger.
pub struct StoryImageProcessor<G: ImageGenerator> {
    generator: G,
    config: ImageConfig,
}

impl<G: ImageGenerator> StoryImageProcessor<G> {
    /// Creates an image stage with default configuration.
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, ImageConfig::default())
    }

    /// Creates an image stage with custom configuration.
    pub fn with_config(generator: G, config: ImageConfig) -> Self {
        Self { generator, config }
    }

    /// Runs one generation, forwarding frames until it ends or the deadline passes.
    async fn illustrate(&self, text: &str, pusher: &FramePusher) -> Result<()> {
        let prompt = self.config.render_prompt(text);
        let bound = self.config.timeout();
        let started = Instant::now();

        let forward = async {
            let mut images = self.generator.generate(&prompt).await?;
            let mut forwarded = 0usize;
            while let Some(item) = images.next().await {
                pusher.push(item?).await?;
                forwarded += 1;
            }
            Ok::<usize, StoryError>(forwarded)
        };

        match tokio::time::timeout(bound, forward).await {
            Ok(Ok(forwarded)) => {
                tracing::debug!(
                    generator = self.generator.name(),
                    forwarded,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "image generation complete"
                );
                Ok(())
            }
            Ok(Err(e @ StoryError::ChannelClosed { .. })) => Err(e),
            Ok(Err(e)) => {
                tracing::warn!(
                    generator = self.generator.name(),
                    error = %e,
                    "image generation failed, dropping the rest"
                );
                Ok(())
            }
            Err(_) => {
                let e = StoryError::GenerationTimeout { after: bound };
                tracing::debug!(
                    generator = self.generator.name(),
                    prompt = %text,
                    error = %e,
                    "abandoning image generation"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<G: ImageGenerator> FrameProcessor for StoryImageProcessor<G> {
    fn name(&self) -> &'static str {
        "StoryImageProcessor"
    }

    async fn process_frame(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        pusher: &FramePusher,
    ) -> Result<()> {
        match frame {
            Frame::StoryImage(text) => self.illustrate(&text, pusher).await,
            other => pusher.push_in(other, direction).await,
        }
    }
}

enum Step {
    Image(ImageData),
    Fail(String),
}

/// Counts a stream as released when it is dropped.
struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted image generator for testing and offline replays.
///
/// Every generation yields the same script; each step waits its delay first.
#[derive(Clone, Default)]
pub struct MockImageGenerator {
    script: Arc<Vec<(Duration, Step)>>,
    prompts: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an image produced `delay` after the previous step.
    pub fn with_image(mut self, delay: Duration, image: ImageData) -> Self {
        self.push_step(delay, Step::Image(image));
        self
    }

    /// Appends a failure produced `delay` after the previous step.
    pub fn with_failure(mut self, delay: Duration, message: &str) -> Self {
        self.push_step(delay, Step::Fail(message.to_string()));
        self
    }

    fn push_step(&mut self, delay: Duration, step: Step) {
        // Builders run before the generator is shared, so the Arc is still unique.
        match Arc::get_mut(&mut self.script) {
            Some(script) => script.push((delay, step)),
            None => tracing::warn!("mock script already shared, step ignored"),
        }
    }

    /// Prompts this generator was asked to illustrate, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of generation streams that have been dropped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<ImageStream> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        let script = Arc::clone(&self.script);
        let guard = ReleaseGuard(Arc::clone(&self.released));
        let images = stream::unfold((0usize, script, guard), |(index, script, guard)| async move {
            let (delay, step) = script.get(index)?;
            tokio::time::sleep(*delay).await;
            let item = match step {
                Step::Image(image) => Ok(Frame::Image(image.clone())),
                Step::Fail(message) => Err(StoryError::ImageGeneration {
                    message: message.clone(),
                }),
            };
            Some((item, (index + 1, script, guard)))
        });
        Ok(images.boxed())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
