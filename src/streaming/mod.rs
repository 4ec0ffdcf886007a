//! Streaming pipeline that turns narration into story pages.
//!
//! Implements a two-stage processor chain:
//! ```text
//! ┌──────────┐    ┌────────────────┐    ┌─────────────────────┐    ┌───────────┐
//! │   LLM    │───▶│ StoryProcessor │───▶│ StoryImageProcessor │───▶│ Transport │
//! │ (deltas) │    │                │    │   (bounded, 7 s)    │    │  / audio  │
//! └──────────┘    └────────────────┘    └─────────────────────┘    └───────────┘
//!                        │                        │
//!                        ▼                        ▼
//!                      Story               ImageGenerator
//!                   (page list)           (stream of frames)
//! ```

pub mod frame;
pub mod image;
pub mod markup;
pub mod pipeline;
pub mod processor;
pub mod story;

pub use frame::{AudioClip, Cue, Frame, FrameDirection, ImageData, Sound};
pub use image::{ImageGenerator, ImageStream, MockImageGenerator, StoryImageProcessor};
pub use markup::Markup;
pub use pipeline::{StoryPipeline, StoryPipelineHandle};
pub use processor::{FrameProcessor, FramePusher, run_processor};
pub use story::{StoryProcessor, StoryState};
