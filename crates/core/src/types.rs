//! Domain types for extracted deck content and discovered media files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An extracted slide deck with its per-slide content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: DeckFormat,

    /// Slides (or pages) in presentation order.
    pub slides: Vec<ExtractedSlide>,
}

impl Deck {
    /// Create a new deck with the given filename and format.
    pub fn new(filename: impl Into<String>, format: DeckFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }

    /// Total number of image placeholders across all slides.
    pub fn image_count(&self) -> usize {
        self.slides.iter().map(|s| s.image_placeholders.len()).sum()
    }
}

/// The format of the source deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckFormat {
    /// PowerPoint Office Open XML.
    Pptx,
    /// Portable Document Format.
    Pdf,
}

impl DeckFormat {
    /// Detect format from file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }
}

/// A single extracted slide or page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text blocks extracted from this slide, in reading order.
    pub lines: Vec<SlideText>,

    /// One placeholder per embedded picture, e.g. `[Image detected]`.
    pub image_placeholders: Vec<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
            image_placeholders: Vec::new(),
        }
    }

    /// Add a text block to this slide.
    pub fn add_line(&mut self, text: impl Into<String>) {
        self.lines.push(SlideText::new(text));
    }

    /// Add a text block with position information.
    pub fn add_line_with_position(&mut self, text: impl Into<String>, y: f64, x: f64) {
        self.lines.push(SlideText::with_position(text, y, x));
    }

    /// Record an embedded picture.
    pub fn add_image_placeholder(&mut self, placeholder: impl Into<String>) {
        self.image_placeholders.push(placeholder.into());
    }

    /// Sort lines by position (top-to-bottom, then left-to-right).
    pub fn sort_by_position(&mut self) {
        self.lines.sort_by(|a, b| {
            let y_cmp = a
                .y_position
                .partial_cmp(&b.y_position)
                .unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x_position
                    .partial_cmp(&b.x_position)
                    .unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });
    }

    /// Non-empty text blocks, trimmed.
    pub fn non_empty_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|l| l.text.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// All text of the slide joined with newlines.
    pub fn text(&self) -> String {
        self.non_empty_lines().join("\n")
    }
}

/// Text content from a shape or text frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideText {
    /// The actual text content.
    pub text: String,

    /// Y position for ordering (top-to-bottom). None if unknown.
    pub y_position: Option<f64>,

    /// X position for ordering (left-to-right). None if unknown.
    pub x_position: Option<f64>,
}

impl SlideText {
    /// Create new slide text without position info.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            y_position: None,
            x_position: None,
        }
    }

    /// Create new slide text with position info.
    pub fn with_position(text: impl Into<String>, y: f64, x: f64) -> Self {
        Self {
            text: text.into(),
            y_position: Some(y),
            x_position: Some(x),
        }
    }
}

/// Structured slide content handed to narration, serialised as the
/// `extract` command's JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub slide_number: usize,
    pub text: String,
    /// Image summaries; at most one entry since placeholders are summarised
    /// in a single batch per slide.
    pub images: Vec<String>,
}

/// Kind of a discovered media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Extensions accepted by default for this kind.
    pub fn default_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => &[".png", ".jpg", ".jpeg"],
            Self::Audio => &[".mp3", ".wav"],
        }
    }
}

/// A slide image or narration clip found in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// File name for display, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// The first digit run embedded in the file name, e.g. `12` for
    /// `slide12.png`. Derived on demand; only used for ordering and logs.
    pub fn ordinal(&self) -> Option<u64> {
        let name = self.file_name();
        let digits: String = name
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}
