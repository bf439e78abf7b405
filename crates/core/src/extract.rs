//! The document extraction capability implemented by the format backends.

use crate::types::{Deck, DeckFormat};
use crate::Result;
use std::path::Path;

/// Extracts per-slide plain text and picture placeholders from a deck file.
///
/// Layout and formatting are not preserved.
pub trait DocumentExtractor {
    /// The format this extractor reads.
    fn format(&self) -> DeckFormat;

    /// Extract every slide (or page) of the file at `path`, in order.
    fn extract(&self, path: &Path) -> Result<Deck>;
}

/// File name of `path` for display, `"unknown"` when it has none.
pub fn display_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown")
}
