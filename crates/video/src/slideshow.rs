//! End-to-end assembly run over a working directory.

use crate::assembler::{Renderer, Timeline, VideoAssembler};
use crate::clip::{BuildOutcome, ClipBuilder, SkippedPair};
use crate::config::RenderConfig;
use crate::probe::MediaProbe;
use lecture_core::{find_matching_files, pair_slides_with_audio, Error, MediaKind, Result};
use std::fs;
use std::path::PathBuf;

/// Where to look for inputs and how to render them.
#[derive(Debug, Clone)]
pub struct SlideshowOptions {
    /// Working directory holding slide images and narration audio. The
    /// video is written here too unless `output_file` is absolute.
    pub directory: PathBuf,
    pub output_file: PathBuf,
    pub image_prefix: String,
    pub audio_prefix: String,
    pub image_extensions: Vec<String>,
    pub audio_extensions: Vec<String>,
    pub render: RenderConfig,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs"),
            output_file: PathBuf::from("lecture_video.mp4"),
            image_prefix: "slide".to_string(),
            audio_prefix: "script".to_string(),
            image_extensions: extensions(MediaKind::Image),
            audio_extensions: extensions(MediaKind::Audio),
            render: RenderConfig::default(),
        }
    }
}

impl SlideshowOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }

    pub fn with_prefixes(mut self, image_prefix: impl Into<String>, audio_prefix: impl Into<String>) -> Self {
        self.image_prefix = image_prefix.into();
        self.audio_prefix = audio_prefix.into();
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Final video location.
    pub fn output_path(&self) -> PathBuf {
        self.directory.join(&self.output_file)
    }
}

fn extensions(kind: MediaKind) -> Vec<String> {
    kind.default_extensions().iter().map(|e| e.to_string()).collect()
}

/// What a successful run produced.
#[derive(Debug)]
pub struct AssemblyReport {
    pub output: PathBuf,
    /// Number of clips in the video.
    pub built: usize,
    /// Pairs left out of the video, in pair order.
    pub skipped: Vec<SkippedPair>,
    /// Video length in seconds, the sum of the built clips.
    pub total_duration: f64,
}

/// Discover, pair, build and render.
///
/// Missing images or audio stop the run before anything is built. Pairs that
/// fail to build are skipped and listed in the report; the run only fails
/// afterwards if nothing was built or rendering fails.
pub fn create_slideshow(
    options: &SlideshowOptions,
    probe: &dyn MediaProbe,
    renderer: &dyn Renderer,
) -> Result<AssemblyReport> {
    options.render.validate()?;
    fs::create_dir_all(&options.directory)?;

    let image_extensions: Vec<&str> = options.image_extensions.iter().map(String::as_str).collect();
    let audio_extensions: Vec<&str> = options.audio_extensions.iter().map(String::as_str).collect();
    let images = find_matching_files(&options.directory, &options.image_prefix, &image_extensions)?;
    let audios = find_matching_files(&options.directory, &options.audio_prefix, &audio_extensions)?;

    log::info!("Found {} slides and {} audio files", images.len(), audios.len());

    if images.is_empty() {
        return Err(Error::NoSlideImages {
            dir: options.directory.clone(),
            prefix: options.image_prefix.clone(),
        });
    }
    if audios.is_empty() {
        return Err(Error::NoAudioFiles {
            dir: options.directory.clone(),
            prefix: options.audio_prefix.clone(),
        });
    }

    let pairs = pair_slides_with_audio(&images, &audios);

    let builder = ClipBuilder::new(probe, &options.render)?;
    let mut timeline = Timeline::new();
    let mut skipped = Vec::new();
    for outcome in builder.build_all(&pairs) {
        match outcome {
            BuildOutcome::Built(clip) => timeline.push(clip),
            BuildOutcome::Skipped(pair) => skipped.push(pair),
        }
    }

    log::info!(
        "Built {} of {} clips ({} skipped, {:.1}s total)",
        timeline.len(),
        pairs.len(),
        skipped.len(),
        timeline.total_duration()
    );

    let built = timeline.len();
    let output = options.output_path();
    let total_duration = VideoAssembler::new(renderer, options.render.clone()).assemble(timeline, &output)?;

    log::info!("Video saved as {}", output.display());

    Ok(AssemblyReport {
        output,
        built,
        skipped,
        total_duration,
    })
}
