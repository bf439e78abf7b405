//! Error types for lecture video generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting decks, calling collaborators or
/// assembling the lecture video.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or list a file or directory.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The deck format is not supported or could not be detected.
    #[error("Unsupported file type: {0}. Only .pptx or .pdf allowed")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Failed to parse the PDF file structure.
    #[error("PDF parsing error: {0}")]
    PdfParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A collaborator credential is not configured.
    #[error("{0} not found in environment")]
    MissingCredential(&'static str),

    /// An HTTP collaborator call failed or returned an unusable response.
    #[error("{service} request failed: {message}")]
    HttpError { service: &'static str, message: String },

    /// No slide images were discovered in the working directory.
    #[error("No slide images named like '{prefix}1.png' found in {}", dir.display())]
    NoSlideImages { dir: PathBuf, prefix: String },

    /// No narration audio files were discovered in the working directory.
    #[error("No audio files named like '{prefix}1.mp3' found in {}", dir.display())]
    NoAudioFiles { dir: PathBuf, prefix: String },

    /// The duration of a media file could not be determined.
    #[error("Failed to probe {}: {message}", path.display())]
    ProbeError { path: PathBuf, message: String },

    /// A slide image could not be decoded, resized or written.
    #[error("Image error for {}: {message}", path.display())]
    ImageError { path: PathBuf, message: String },

    /// An external tool exited unsuccessfully or could not be spawned.
    #[error("{program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The render configuration is unusable.
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    /// Every slide/audio pair failed to build.
    #[error("No valid slide-audio pairs found")]
    EmptyTimeline,

    /// Rendering the final video failed.
    #[error("Failed to render {}: {message}", path.display())]
    RenderError { path: PathBuf, message: String },
}
