//! Still-image clips, one per slide/audio pair.

use crate::config::RenderConfig;
use crate::probe::{MediaProbe, MIN_DURATION_SECS};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use lecture_core::{Error, Result, SlideAudioPair};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, TempPath};

/// A slide image held for exactly the length of its narration.
///
/// The resized frame lives in a scratch file that is deleted when the clip
/// is closed or dropped.
#[derive(Debug)]
pub struct Clip {
    /// 1-based pair index.
    pub index: usize,
    pub image: PathBuf,
    pub audio: PathBuf,
    /// Narration length in seconds; also the clip length.
    pub duration: f64,
    frame: TempPath,
}

impl Clip {
    /// The still frame at output resolution.
    pub fn frame_path(&self) -> &Path {
        &self.frame
    }

    /// Delete the scratch frame now instead of on drop.
    pub fn close(self) -> Result<()> {
        self.frame.close()?;
        Ok(())
    }
}

/// A pair that could not be turned into a clip.
#[derive(Debug, Clone)]
pub struct SkippedPair {
    pub index: usize,
    pub image: PathBuf,
    pub audio: PathBuf,
    pub reason: String,
}

/// Result of building one pair.
#[derive(Debug)]
pub enum BuildOutcome {
    Built(Clip),
    Skipped(SkippedPair),
}

/// Builds clips from pairs, keeping their frames in a private scratch
/// directory that is removed with the builder.
pub struct ClipBuilder<'a> {
    probe: &'a dyn MediaProbe,
    fps: u32,
    width: u32,
    height: u32,
    scratch: TempDir,
}

impl<'a> ClipBuilder<'a> {
    pub fn new(probe: &'a dyn MediaProbe, config: &RenderConfig) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("lecture-frames-").tempdir()?;
        log::debug!("Frame scratch directory: {}", scratch.path().display());

        Ok(Self {
            probe,
            fps: config.fps,
            width: config.width,
            height: config.height,
            scratch,
        })
    }

    /// Directory holding the frames of live clips.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Build one clip: probe the audio, then decode, resize and store the
    /// slide image.
    pub fn build_clip(&self, pair: &SlideAudioPair) -> Result<Clip> {
        let duration = self.probe.duration(&pair.audio.path)?;
        let min_duration = self.min_duration();
        if duration.is_nan() || duration < min_duration {
            return Err(Error::ProbeError {
                path: pair.audio.path.clone(),
                message: format!(
                    "duration {:.4}s is shorter than one frame ({:.4}s)",
                    duration, min_duration
                ),
            });
        }
        let frame = self.render_frame(pair.index, &pair.image.path)?;

        Ok(Clip {
            index: pair.index,
            image: pair.image.path.clone(),
            audio: pair.audio.path.clone(),
            duration,
            frame,
        })
    }

    /// Shortest clip that still yields a frame at the output rate.
    fn min_duration(&self) -> f64 {
        (1.0 / f64::from(self.fps.max(1))).max(MIN_DURATION_SECS)
    }

    /// Build every pair in order. A failing pair is logged and skipped.
    pub fn build_all(&self, pairs: &[SlideAudioPair]) -> Vec<BuildOutcome> {
        pairs
            .iter()
            .map(|pair| match self.build_clip(pair) {
                Ok(clip) => {
                    log::info!(
                        "Added: {} with {} ({:.1}s)",
                        pair.image.file_name(),
                        pair.audio.file_name(),
                        clip.duration
                    );
                    BuildOutcome::Built(clip)
                }
                Err(e) => {
                    log::warn!(
                        "Skipping slide {} ({} + {}): {}",
                        pair.index,
                        pair.image.file_name(),
                        pair.audio.file_name(),
                        e
                    );
                    BuildOutcome::Skipped(SkippedPair {
                        index: pair.index,
                        image: pair.image.path.clone(),
                        audio: pair.audio.path.clone(),
                        reason: e.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Decode the slide, resample it to the output resolution with a
    /// Lanczos filter and write it as PNG into the scratch directory.
    fn render_frame(&self, index: usize, image_path: &Path) -> Result<TempPath> {
        let image_error = |message: String| Error::ImageError {
            path: image_path.to_path_buf(),
            message,
        };

        let decoded = image::open(image_path).map_err(|e| image_error(e.to_string()))?;

        let frame = if decoded.width() == self.width && decoded.height() == self.height {
            decoded
        } else {
            log::debug!(
                "Resizing {} from {}x{} to {}x{}",
                image_path.display(),
                decoded.width(),
                decoded.height(),
                self.width,
                self.height
            );
            decoded.resize_exact(self.width, self.height, FilterType::Lanczos3)
        };
        let frame = DynamicImage::ImageRgb8(frame.to_rgb8());

        let mut file = tempfile::Builder::new()
            .prefix(&format!("frame{}-", index))
            .suffix(".png")
            .tempfile_in(self.scratch.path())?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            frame
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| image_error(e.to_string()))?;
            writer.flush()?;
        }

        Ok(file.into_temp_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lecture_core::pair_slides_with_audio;
    use std::collections::HashMap;
    use std::fs;

    /// Durations keyed by file name; unknown names fail like a corrupt file.
    struct TableProbe(HashMap<&'static str, f64>);

    impl MediaProbe for TableProbe {
        fn duration(&self, path: &Path) -> Result<f64> {
            let name = path.file_name().unwrap().to_str().unwrap();
            self.0.get(name).copied().ok_or_else(|| Error::ProbeError {
                path: path.to_path_buf(),
                message: "invalid data found when processing input".to_string(),
            })
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 36,
            ..RenderConfig::default()
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_clip_takes_audio_duration_and_output_size() {
        let dir = tempfile::tempdir().unwrap();
        let slide = dir.path().join("slide1.png");
        let audio = dir.path().join("script1.mp3");
        write_png(&slide, 10, 10);
        fs::write(&audio, b"mp3").unwrap();

        let probe = TableProbe(HashMap::from([("script1.mp3", 4.25)]));
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let pairs = pair_slides_with_audio(&[slide.clone()], &[audio.clone()]);

        let clip = builder.build_clip(&pairs[0]).unwrap();

        assert_eq!(clip.duration, 4.25);
        assert_eq!(clip.image, slide);
        assert!(clip.frame_path().starts_with(builder.scratch_dir()));
        let frame = image::open(clip.frame_path()).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 36));
    }

    #[test]
    fn test_close_removes_frame() {
        let dir = tempfile::tempdir().unwrap();
        let slide = dir.path().join("slide1.jpg");
        image::RgbImage::new(64, 36).save(&slide).unwrap();

        let probe = TableProbe(HashMap::from([("script1.wav", 1.0)]));
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let pairs = pair_slides_with_audio(&[slide], &[dir.path().join("script1.wav")]);

        let clip = builder.build_clip(&pairs[0]).unwrap();
        let frame = clip.frame_path().to_path_buf();
        assert!(frame.exists());

        clip.close().unwrap();
        assert!(!frame.exists());
    }

    #[test]
    fn test_build_all_skips_corrupt_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut slides = Vec::new();
        let mut audios = Vec::new();
        for i in 1..=3 {
            let slide = dir.path().join(format!("slide{}.png", i));
            write_png(&slide, 8, 8);
            slides.push(slide);
            audios.push(dir.path().join(format!("script{}.mp3", i)));
        }

        let probe = TableProbe(HashMap::from([("script1.mp3", 2.0), ("script3.mp3", 3.0)]));
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let outcomes = builder.build_all(&pair_slides_with_audio(&slides, &audios));

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], BuildOutcome::Built(c) if c.index == 1));
        match &outcomes[1] {
            BuildOutcome::Skipped(skipped) => {
                assert_eq!(skipped.index, 2);
                assert_eq!(skipped.audio, audios[1]);
                assert!(skipped.reason.contains("script2.mp3"));
            }
            BuildOutcome::Built(_) => panic!("pair 2 should have been skipped"),
        }
        assert!(matches!(&outcomes[2], BuildOutcome::Built(c) if c.index == 3 && c.duration == 3.0));
    }

    #[test]
    fn test_audio_shorter_than_a_frame_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let slide = dir.path().join("slide1.png");
        write_png(&slide, 8, 8);

        let probe = TableProbe(HashMap::from([("script1.mp3", 0.0004), ("script2.mp3", 0.05)]));
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let pairs = pair_slides_with_audio(
            &[slide.clone(), slide],
            &[dir.path().join("script1.mp3"), dir.path().join("script2.mp3")],
        );

        let outcomes = builder.build_all(&pairs);

        assert!(matches!(&outcomes[0], BuildOutcome::Skipped(s) if s.reason.contains("shorter than one frame")));
        assert!(matches!(&outcomes[1], BuildOutcome::Built(c) if c.duration == 0.05));
    }

    #[test]
    fn test_undecodable_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let slide = dir.path().join("slide1.png");
        fs::write(&slide, b"definitely not a png").unwrap();

        let probe = TableProbe(HashMap::from([("script1.mp3", 2.0)]));
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let outcomes = builder.build_all(&pair_slides_with_audio(&[slide], &[dir.path().join("script1.mp3")]));

        assert!(matches!(&outcomes[0], BuildOutcome::Skipped(s) if s.index == 1));
    }

    #[test]
    fn test_scratch_removed_with_builder() {
        let probe = TableProbe(HashMap::new());
        let builder = ClipBuilder::new(&probe, &small_config()).unwrap();
        let scratch = builder.scratch_dir().to_path_buf();
        assert!(scratch.is_dir());

        drop(builder);
        assert!(!scratch.exists());
    }
}
