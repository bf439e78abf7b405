//! Concatenation of clips into the final video.

use crate::clip::Clip;
use crate::config::RenderConfig;
use crate::runner::ToolRunner;
use lecture_core::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::Path;

/// Ordered clips forming the video. Rendering reads it; closing it releases
/// every clip's frame.
#[derive(Debug, Default)]
pub struct Timeline {
    clips: Vec<Clip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Sum of clip durations in seconds; the expected length of the output.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }

    /// Release every clip. All clips are closed even if one fails; the
    /// first failure is returned.
    pub fn close(self) -> Result<()> {
        let mut first_error = None;
        for clip in self.clips {
            if let Err(e) = clip.close() {
                log::warn!("Failed to release clip: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl FromIterator<Clip> for Timeline {
    fn from_iter<I: IntoIterator<Item = Clip>>(iter: I) -> Self {
        Self {
            clips: iter.into_iter().collect(),
        }
    }
}

/// Encodes a timeline into a video file.
pub trait Renderer {
    fn render(&self, timeline: &Timeline, output: &Path, config: &RenderConfig) -> Result<()>;
}

/// Renderer that hands the whole timeline to a single ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    program: String,
    runner: ToolRunner,
}

impl FfmpegRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            runner: ToolRunner::new(),
        }
    }
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Renderer for FfmpegRenderer {
    fn render(&self, timeline: &Timeline, output: &Path, config: &RenderConfig) -> Result<()> {
        let args = ffmpeg_args(timeline, output, config);
        let result = self.runner.run(&self.program, &args)?;
        if !result.stderr.trim().is_empty() {
            log::debug!("ffmpeg: {}", result.stderr.trim());
        }
        Ok(())
    }
}

/// Build the ffmpeg command line for a timeline.
///
/// Every clip contributes a looped still input cut to the clip duration and
/// its narration. Each video stream is fitted into the output frame
/// (letterboxed, never stretched) and each audio stream is resampled to a
/// common layout and padded or trimmed to the same duration, so the concat
/// filter keeps every clip at its own length.
pub fn ffmpeg_args(timeline: &Timeline, output: &Path, config: &RenderConfig) -> Vec<OsString> {
    let (w, h) = config.resolution();
    let fps = config.fps;
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(OsString::from)
        .collect();
    let mut filter = String::new();
    let mut concat_inputs = String::new();

    for (i, clip) in timeline.clips().iter().enumerate() {
        let duration = format!("{:.3}", clip.duration);

        args.extend(["-loop", "1", "-framerate"].iter().map(OsString::from));
        args.push(fps.to_string().into());
        args.push("-t".into());
        args.push(duration.clone().into());
        // Paths go through untouched; file names need not be UTF-8.
        args.push("-i".into());
        args.push(clip.frame_path().as_os_str().to_os_string());
        args.push("-i".into());
        args.push(clip.audio.as_os_str().to_os_string());

        let video_input = 2 * i;
        let audio_input = 2 * i + 1;
        filter.push_str(&format!(
            "[{video_input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format={pix}[v{i}];",
            pix = config.pixel_format,
        ));
        filter.push_str(&format!(
            "[{audio_input}:a]aresample=44100,aformat=sample_fmts=fltp:channel_layouts=stereo,\
             apad,atrim=duration={duration}[a{i}];"
        ));
        concat_inputs.push_str(&format!("[v{i}][a{i}]"));
    }

    filter.push_str(&format!(
        "{concat_inputs}concat=n={}:v=1:a=1[outv][outa]",
        timeline.len()
    ));

    let mut encoder = vec![
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[outv]".to_string(),
        "-map".to_string(),
        "[outa]".to_string(),
        "-c:v".to_string(),
        config.video_codec.clone(),
    ];
    if !config.preset.trim().is_empty() {
        encoder.extend(["-preset".to_string(), config.preset.clone()]);
    }
    encoder.extend([
        "-pix_fmt".to_string(),
        config.pixel_format.clone(),
        "-r".to_string(),
        fps.to_string(),
        "-c:a".to_string(),
        config.audio_codec.clone(),
        "-threads".to_string(),
        config.threads.to_string(),
    ]);
    args.extend(encoder.into_iter().map(OsString::from));
    args.push(output.as_os_str().to_os_string());

    args
}

/// Validates, renders and cleans up after a timeline.
pub struct VideoAssembler<'a> {
    renderer: &'a dyn Renderer,
    config: RenderConfig,
}

impl<'a> VideoAssembler<'a> {
    pub fn new(renderer: &'a dyn Renderer, config: RenderConfig) -> Self {
        Self { renderer, config }
    }

    /// Render `timeline` to `output` and return the video duration.
    ///
    /// The timeline is consumed and its clips released whether rendering
    /// succeeds or not. A failed render leaves no output file behind.
    pub fn assemble(&self, timeline: Timeline, output: &Path) -> Result<f64> {
        if timeline.is_empty() {
            return Err(Error::EmptyTimeline);
        }
        self.config.validate()?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let duration = timeline.total_duration();
        log::info!(
            "Combining {} clips ({:.1}s) into {}",
            timeline.len(),
            duration,
            output.display()
        );

        let rendered = self
            .renderer
            .render(&timeline, output, &self.config)
            .and_then(|()| {
                if output.is_file() {
                    Ok(())
                } else {
                    Err(Error::RenderError {
                        path: output.to_path_buf(),
                        message: "renderer reported success but wrote no file".to_string(),
                    })
                }
            });

        if let Err(e) = timeline.close() {
            log::warn!("Clip cleanup incomplete: {}", e);
        }

        match rendered {
            Ok(()) => Ok(duration),
            Err(e) => {
                if output.exists() {
                    if let Err(remove_err) = fs::remove_file(output) {
                        log::warn!("Could not remove partial {}: {}", output.display(), remove_err);
                    }
                }
                Err(match e {
                    Error::RenderError { .. } => e,
                    other => Error::RenderError {
                        path: output.to_path_buf(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{BuildOutcome, ClipBuilder};
    use crate::probe::MediaProbe;
    use lecture_core::pair_slides_with_audio;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FixedProbe(f64);

    impl MediaProbe for FixedProbe {
        fn duration(&self, _path: &Path) -> Result<f64> {
            Ok(self.0)
        }
    }

    /// Records what it was asked to render and writes a placeholder file,
    /// optionally failing after the write.
    struct RecordingRenderer {
        fail: bool,
        durations: RefCell<Vec<f64>>,
        frames: RefCell<Vec<PathBuf>>,
    }

    impl RecordingRenderer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                durations: RefCell::new(Vec::new()),
                frames: RefCell::new(Vec::new()),
            }
        }
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, timeline: &Timeline, output: &Path, _config: &RenderConfig) -> Result<()> {
            for clip in timeline.clips() {
                assert!(clip.frame_path().exists());
                self.durations.borrow_mut().push(clip.duration);
                self.frames.borrow_mut().push(clip.frame_path().to_path_buf());
            }
            fs::write(output, b"partial")?;
            if self.fail {
                return Err(Error::ToolFailed {
                    program: "ffmpeg".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Conversion failed!".to_string(),
                });
            }
            Ok(())
        }
    }

    fn config() -> RenderConfig {
        RenderConfig {
            width: 32,
            height: 18,
            ..RenderConfig::default()
        }
    }

    fn timeline(dir: &Path, builder: &ClipBuilder, count: usize) -> Timeline {
        let mut slides = Vec::new();
        let mut audios = Vec::new();
        for i in 1..=count {
            let slide = dir.join(format!("slide{}.png", i));
            image::RgbImage::new(4, 4).save(&slide).unwrap();
            slides.push(slide);
            audios.push(dir.join(format!("script{}.mp3", i)));
        }
        builder
            .build_all(&pair_slides_with_audio(&slides, &audios))
            .into_iter()
            .filter_map(|o| match o {
                BuildOutcome::Built(clip) => Some(clip),
                BuildOutcome::Skipped(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_timeline_fails_fast() {
        let renderer = RecordingRenderer::new(false);
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp4");

        let err = VideoAssembler::new(&renderer, config())
            .assemble(Timeline::new(), &output)
            .unwrap_err();

        assert!(matches!(err, Error::EmptyTimeline));
        assert!(renderer.durations.borrow().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_assemble_returns_total_duration_and_releases_frames() {
        let dir = TempDir::new().unwrap();
        let probe = FixedProbe(2.5);
        let builder = ClipBuilder::new(&probe, &config()).unwrap();
        let timeline = timeline(dir.path(), &builder, 3);
        let renderer = RecordingRenderer::new(false);
        let output = dir.path().join("video").join("lecture.mp4");

        let duration = VideoAssembler::new(&renderer, config())
            .assemble(timeline, &output)
            .unwrap();

        assert_eq!(duration, 7.5);
        assert_eq!(*renderer.durations.borrow(), vec![2.5, 2.5, 2.5]);
        assert!(output.is_file());
        assert!(renderer.frames.borrow().iter().all(|f| !f.exists()));
    }

    #[test]
    fn test_failed_render_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let probe = FixedProbe(1.0);
        let builder = ClipBuilder::new(&probe, &config()).unwrap();
        let timeline = timeline(dir.path(), &builder, 2);
        let renderer = RecordingRenderer::new(true);
        let output = dir.path().join("lecture.mp4");

        let err = VideoAssembler::new(&renderer, config())
            .assemble(timeline, &output)
            .unwrap_err();

        assert!(matches!(err, Error::RenderError { ref message, .. } if message.contains("Conversion failed")));
        assert!(!output.exists());
        assert!(renderer.frames.borrow().iter().all(|f| !f.exists()));
    }

    #[test]
    fn test_invalid_config_rejected_before_render() {
        let dir = TempDir::new().unwrap();
        let probe = FixedProbe(1.0);
        let builder = ClipBuilder::new(&probe, &config()).unwrap();
        let timeline = timeline(dir.path(), &builder, 1);
        let renderer = RecordingRenderer::new(false);
        let bad = RenderConfig { fps: 0, ..config() };

        let err = VideoAssembler::new(&renderer, bad)
            .assemble(timeline, &dir.path().join("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(renderer.durations.borrow().is_empty());
    }

    #[test]
    fn test_ffmpeg_args_layout() {
        let dir = TempDir::new().unwrap();
        let probe = FixedProbe(3.0);
        let builder = ClipBuilder::new(&probe, &config()).unwrap();
        let timeline = timeline(dir.path(), &builder, 2);
        let output = dir.path().join("lecture.mp4");

        let args = ffmpeg_args(&timeline, &output, &config());

        assert_eq!(args.iter().filter(|a| *a == "-loop").count(), 2);
        assert_eq!(args.iter().filter(|a| *a == "3.000").count(), 2);
        let filter_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let filter = args[filter_pos + 1].to_str().unwrap();
        assert!(filter.contains("[0:v]scale=32:18"));
        assert!(filter.contains("[3:a]aresample=44100"));
        assert!(filter.contains("atrim=duration=3.000[a1]"));
        assert!(filter.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[outv][outa]"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "yuv420p"));
        assert!(args.windows(2).any(|w| w[0] == "-preset" && w[1] == "medium"));
        assert!(args.windows(2).any(|w| w[0] == "-threads" && w[1] == "4"));
        assert_eq!(args.last().unwrap().as_os_str(), output.as_os_str());
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_args_keep_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let slide = dir.path().join("slide1.png");
        image::RgbImage::new(4, 4).save(&slide).unwrap();
        let audio = dir.path().join(OsStr::from_bytes(b"script1-\xFF.mp3"));
        fs::write(&audio, b"ID3").unwrap();

        let probe = FixedProbe(1.0);
        let builder = ClipBuilder::new(&probe, &config()).unwrap();
        let pairs = pair_slides_with_audio(&[slide], &[audio.clone()]);
        let timeline: Timeline = std::iter::once(builder.build_clip(&pairs[0]).unwrap()).collect();
        let output = dir.path().join(OsStr::from_bytes(b"lecture-\xFE.mp4"));

        let args = ffmpeg_args(&timeline, &output, &config());

        let passed = args
            .iter()
            .find(|a| a.as_bytes().ends_with(b".mp3"))
            .unwrap();
        assert_eq!(passed.as_os_str(), audio.as_os_str());
        assert!(Path::new(passed).exists());
        assert_eq!(args.last().unwrap().as_os_str(), output.as_os_str());
    }
}
