//! PDF extraction backend.
//!
//! Treats every page as a slide: plain text plus one placeholder per image
//! referenced from the page resources.

pub mod parser;

pub use parser::PdfParser;
