//! PPTX (Office Open XML) extraction backend.
//!
//! Parses .pptx files which are ZIP archives containing XML documents,
//! yielding per-slide text and one placeholder per picture.

pub mod parser;

pub use parser::{PptxParser, PICTURE_PLACEHOLDER};
