//! Slide extraction with optional image summarization.

use crate::gemini::TextGenerator;
use lecture_core::{Deck, DeckFormat, DocumentExtractor, Error, ExtractedSlide, Result, SlideContent};
use lecture_pdf::PdfParser;
use lecture_pptx::PptxParser;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Prompt prefix for the batched image summary of one slide.
const SUMMARY_PROMPT: &str = "Summarize the following images briefly:\n";

/// Pick the extraction backend for a deck format.
pub fn extractor_for(format: DeckFormat) -> Box<dyn DocumentExtractor> {
    match format {
        DeckFormat::Pptx => Box::new(PptxParser::new()),
        DeckFormat::Pdf => Box::new(PdfParser::new()),
    }
}

/// Format suggested by the first bytes of the file, if recognisable.
fn sniff_format(path: &Path) -> Option<DeckFormat> {
    let mut magic = [0u8; 8];
    let mut file = File::open(path).ok()?;
    file.read_exact(&mut magic).ok()?;
    DeckFormat::from_magic(&magic)
}

/// Extracts structured slide content from PDF or PPTX files.
///
/// For each slide it yields the slide number, its text, and (when a text
/// generator is available) one short description of all its pictures.
pub struct SlideExtractor<'a> {
    summarizer: Option<&'a dyn TextGenerator>,
}

impl<'a> SlideExtractor<'a> {
    /// Create an extractor; without a summarizer image summaries are skipped.
    pub fn new(summarizer: Option<&'a dyn TextGenerator>) -> Self {
        Self { summarizer }
    }

    /// Extract every slide of the deck at `path`.
    pub fn extract(&self, path: &Path, summarize_images: bool) -> Result<Vec<SlideContent>> {
        let format = DeckFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(
                path.extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })?;

        log::info!("Extracting {:?} deck {}", format, path.display());
        if let Some(sniffed) = sniff_format(path) {
            if sniffed != format {
                log::warn!(
                    "{} looks like {:?} content despite its extension",
                    path.display(),
                    sniffed
                );
            }
        }
        let deck = extractor_for(format).extract(path)?;

        if summarize_images && self.summarizer.is_none() && deck.image_count() > 0 {
            log::warn!("No text generator configured; skipping image summaries");
        }

        Ok(self.slide_contents(&deck, summarize_images))
    }

    /// Convert an extracted deck into slide content, summarizing pictures
    /// slide by slide.
    pub fn slide_contents(&self, deck: &Deck, summarize_images: bool) -> Vec<SlideContent> {
        deck.slides
            .iter()
            .map(|slide| SlideContent {
                slide_number: slide.number,
                text: slide.text(),
                images: if summarize_images {
                    self.summarize_images(slide)
                } else {
                    Vec::new()
                },
            })
            .collect()
    }

    /// One batched prompt per slide; an empty or failed reply means no
    /// summary rather than an error.
    fn summarize_images(&self, slide: &ExtractedSlide) -> Vec<String> {
        let Some(summarizer) = self.summarizer else {
            return Vec::new();
        };
        if slide.image_placeholders.is_empty() {
            return Vec::new();
        }

        let prompt = format!("{}{}", SUMMARY_PROMPT, slide.image_placeholders.join("\n"));
        let summary = summarizer.send_prompt(&prompt);
        let summary = summary.trim();

        if summary.is_empty() {
            log::warn!("No image summary for slide {}", slide.number);
            Vec::new()
        } else {
            vec![summary.to_string()]
        }
    }
}
