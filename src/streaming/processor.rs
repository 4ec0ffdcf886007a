//! Core stage abstraction and runner for the story pipeline.

use crate::error::{Result, StoryError};
use crate::streaming::frame::{Frame, FrameDirection};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Output side of a stage.
///
/// Wraps the downstream channel and, optionally, a channel back upstream.
#[derive(Debug, Clone)]
pub struct FramePusher {
    stage: &'static str,
    downstream: mpsc::Sender<Frame>,
    upstream: Option<mpsc::Sender<Frame>>,
}

impl FramePusher {
    /// Creates a pusher that only sends downstream.
    pub fn new(stage: &'static str, downstream: mpsc::Sender<Frame>) -> Self {
        Self {
            stage,
            downstream,
            upstream: None,
        }
    }

    /// Adds an upstream channel.
    pub fn with_upstream(mut self, upstream: mpsc::Sender<Frame>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Pushes a frame downstream.
    pub async fn push(&self, frame: Frame) -> Result<()> {
        self.push_in(frame, FrameDirection::Downstream).await
    }

    /// Pushes a frame in the given direction.
    ///
    /// Upstream frames are dropped with a log line when no upstream channel exists.
    pub async fn push_in(&self, frame: Frame, direction: FrameDirection) -> Result<()> {
        let tx = match direction {
            FrameDirection::Downstream => &self.downstream,
            FrameDirection::Upstream => match &self.upstream {
                Some(tx) => tx,
                None => {
                    tracing::debug!(
                        stage = self.stage,
                        frame = frame.kind(),
                        "no upstream channel, dropping frame"
                    );
                    return Ok(());
                }
            },
        };
        tx.send(frame).await.map_err(|_| StoryError::ChannelClosed {
            stage: self.stage.to_string(),
        })
    }
}

/// A processing stage in the story pipeline.
///
/// Stages receive one frame at a time and push zero or more frames onward.
/// Variants a stage does not handle must be forwarded unchanged.
#[async_trait]
pub trait FrameProcessor: Send {
    /// Returns the name of this stage for logging.
    fn name(&self) -> &'static str;

    /// Stage-specific handling of a single frame.
    async fn process_frame(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        pusher: &FramePusher,
    ) -> Result<()>;

    /// Cross-cutting handling that runs before every `process_frame`.
    fn base_process(&self, frame: &Frame, direction: FrameDirection) {
        tracing::trace!(
            stage = self.name(),
            frame = frame.kind(),
            ?direction,
            "processing frame"
        );
    }

    /// Entry point for callers: base handling, then stage logic.
    async fn process(
        &mut self,
        frame: Frame,
        direction: FrameDirection,
        pusher: &FramePusher,
    ) -> Result<()> {
        self.base_process(&frame, direction);
        self.process_frame(frame, direction, pusher).await
    }
}

/// Runs a stage until its input closes or its output goes away.
///
/// Each frame is processed to completion before the next is received.
pub async fn run_processor<P: FrameProcessor>(
    mut processor: P,
    mut input: mpsc::Receiver<Frame>,
    pusher: FramePusher,
) {
    while let Some(frame) = input.recv().await {
        match processor
            .process(frame, FrameDirection::Downstream, &pusher)
            .await
        {
            Ok(()) => {}
            Err(StoryError::ChannelClosed { stage }) => {
                tracing::debug!(stage = %stage, "downstream closed, stopping");
                break;
            }
            Err(e) => {
                tracing::warn!(stage = processor.name(), error = %e, "frame processing failed");
            }
        }
    }
    tracing::debug!(stage = processor.name(), "stage finished");
}
