//! Turns numbered slide images and narration clips into one lecture video.
//!
//! The run is strictly sequential: discover files, pair them by position,
//! build one still-image clip per pair, then concatenate and render.

pub mod assembler;
pub mod clip;
pub mod config;
pub mod probe;
pub mod runner;
pub mod slideshow;

pub use assembler::{FfmpegRenderer, Renderer, Timeline, VideoAssembler};
pub use clip::{BuildOutcome, Clip, ClipBuilder, SkippedPair};
pub use config::RenderConfig;
pub use probe::{FfprobeProbe, MediaProbe};
pub use runner::{CommandOutput, ToolRunner};
pub use slideshow::{create_slideshow, AssemblyReport, SlideshowOptions};
