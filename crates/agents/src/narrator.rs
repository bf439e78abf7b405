//! Per-slide narration audio.

use crate::speech::SpeechSynthesizer;
use lecture_core::{Result, ScriptNormalizer, SlideContent};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes one narration clip per slide, named `{prefix}{slide_number}.{ext}`
/// so the video assembler can pair it with `slide{slide_number}` images.
pub struct Narrator<'a> {
    synthesizer: &'a dyn SpeechSynthesizer,
    normalizer: ScriptNormalizer,
    audio_prefix: String,
}

/// What a narration run produced.
#[derive(Debug, Default)]
pub struct NarrationReport {
    /// Audio files written, in slide order.
    pub written: Vec<PathBuf>,
    /// Slide numbers whose synthesis or write failed.
    pub failed: Vec<usize>,
}

impl<'a> Narrator<'a> {
    pub fn new(synthesizer: &'a dyn SpeechSynthesizer) -> Self {
        Self {
            synthesizer,
            normalizer: ScriptNormalizer::new(),
            audio_prefix: "script".to_string(),
        }
    }

    pub fn with_audio_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.audio_prefix = prefix.into();
        self
    }

    pub fn with_normalizer(mut self, normalizer: ScriptNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Path of the clip for a slide.
    pub fn audio_path(&self, dir: &Path, slide_number: usize) -> PathBuf {
        dir.join(format!(
            "{}{}.{}",
            self.audio_prefix,
            slide_number,
            self.synthesizer.extension()
        ))
    }

    /// Synthesize every slide into `dir`, creating it if needed.
    ///
    /// A slide that fails is logged and listed in the report; the remaining
    /// slides are still narrated.
    pub fn narrate(&self, slides: &[SlideContent], dir: &Path) -> Result<NarrationReport> {
        fs::create_dir_all(dir)?;
        let mut report = NarrationReport::default();

        for slide in slides {
            let script = self.normalizer.build_script(slide);
            let path = self.audio_path(dir, slide.slide_number);
            log::debug!("Slide {} script: {}", slide.slide_number, script);

            // A clip left over from an earlier run must not stand in for a
            // slide whose synthesis fails now.
            let written = remove_stale(&path)
                .and_then(|()| self.synthesizer.synthesize(&script))
                .and_then(|audio| fs::write(&path, audio).map_err(Into::into));

            match written {
                Ok(()) => {
                    log::info!("Narrated slide {} -> {}", slide.slide_number, path.display());
                    report.written.push(path);
                }
                Err(e) => {
                    log::error!("Failed to narrate slide {}: {}", slide.slide_number, e);
                    report.failed.push(slide.slide_number);
                }
            }
        }

        if !report.failed.is_empty() {
            log::warn!(
                "No narration for slide(s) {:?}; assembling now would pair later clips with earlier slides",
                report.failed
            );
        }

        Ok(report)
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed previous clip {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
