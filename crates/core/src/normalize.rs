//! Narration script normalization.
//!
//! Slide text is written for the eye: bullets, ragged whitespace, lines
//! without punctuation. Speech synthesis reads it better once bullets are
//! gone and every line ends like a sentence.

use crate::types::SlideContent;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Regex matching a leading bullet glyph and the space after it.
static BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[•◦▪▫‣●○■□►▶➢➤✓✔\-–—*]+\s*").unwrap());

/// Characters that already end a spoken sentence.
const TERMINAL_CHARS: &[char] = &['.', '!', '?', ':', ';', '…'];

/// Turns extracted slide content into text suitable for speech synthesis.
#[derive(Debug, Clone)]
pub struct ScriptNormalizer {
    /// Whether to append a period to lines without terminal punctuation.
    terminate_lines: bool,
}

impl Default for ScriptNormalizer {
    fn default() -> Self {
        Self {
            terminate_lines: true,
        }
    }
}

impl ScriptNormalizer {
    /// Create a normalizer that terminates every line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether lines without terminal punctuation get a period.
    pub fn with_terminate_lines(mut self, terminate: bool) -> Self {
        self.terminate_lines = terminate;
        self
    }

    /// Normalize a single line: NFC, bullet removal, whitespace collapsing.
    pub fn normalize_line(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        let without_bullet = BULLET_REGEX.replace(&composed, "");
        WHITESPACE_COLLAPSE_REGEX
            .replace_all(&without_bullet, " ")
            .trim()
            .to_string()
    }

    /// Normalize text into non-empty spoken lines.
    pub fn normalize_to_lines(&self, text: &str) -> Vec<String> {
        text.replace("\r\n", "\n")
            .replace('\r', "\n")
            .lines()
            .map(|line| self.normalize_line(line))
            .filter(|line| !line.is_empty())
            .map(|line| {
                if self.terminate_lines && !line.ends_with(TERMINAL_CHARS) {
                    format!("{}.", line)
                } else {
                    line
                }
            })
            .collect()
    }

    /// Build the narration script for a slide.
    ///
    /// Slide text comes first, then image summaries. A slide with nothing
    /// to say still gets `"Slide {n}."` so audio numbering stays aligned
    /// with the slide images.
    pub fn build_script(&self, slide: &SlideContent) -> String {
        let mut lines = self.normalize_to_lines(&slide.text);
        for summary in &slide.images {
            lines.extend(self.normalize_to_lines(summary));
        }

        if lines.is_empty() {
            format!("Slide {}.", slide.slide_number)
        } else {
            lines.join(" ")
        }
    }
}
