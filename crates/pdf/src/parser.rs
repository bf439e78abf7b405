//! PDF file parser implementation.

use lecture_core::extract::display_name;
use lecture_core::{Deck, DeckFormat, DocumentExtractor, Error, ExtractedSlide, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Maximum number of `Parent` hops when looking for inherited resources.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Parser for PDF documents.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PDF document from a reader.
    pub fn parse<R: Read>(&self, mut reader: R, filename: &str) -> Result<Deck> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        let doc = Document::load_mem(&buffer)
            .map_err(|e| Error::PdfParseError(format!("Failed to load {}: {}", filename, e)))?;

        let mut deck = Deck::new(filename, DeckFormat::Pdf);

        // get_pages is keyed by 1-based page number, in order.
        for (page_number, page_id) in doc.get_pages() {
            deck.add_slide(self.parse_page(&doc, page_number, page_id));
        }

        log::debug!(
            "Parsed {} page(s) with {} image(s) from {}",
            deck.slides.len(),
            deck.image_count(),
            filename
        );

        Ok(deck)
    }

    /// Extract one page. Text that cannot be decoded leaves the page empty
    /// rather than failing the whole document.
    fn parse_page(&self, doc: &Document, page_number: u32, page_id: ObjectId) -> ExtractedSlide {
        let mut slide = ExtractedSlide::new(page_number as usize);

        match doc.extract_text(&[page_number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    slide.add_line(text);
                }
            }
            Err(e) => log::warn!("Could not extract text from page {}: {}", page_number, e),
        }

        for image_index in 1..=count_page_images(doc, page_id) {
            slide.add_image_placeholder(format!(
                "[Image {} detected on page {}]",
                image_index, page_number
            ));
        }

        slide
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PdfParser {
    fn format(&self) -> DeckFormat {
        DeckFormat::Pdf
    }

    fn extract(&self, path: &Path) -> Result<Deck> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), display_name(path))
    }
}

/// The resource dictionary of a page, following `Parent` links for
/// resources inherited from the page tree.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(resources) = current.get(b"Resources") {
            let (_, resources) = doc.dereference(resources).ok()?;
            return resources.as_dict().ok();
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Number of image XObjects referenced by a page.
fn count_page_images(doc: &Document, page_id: ObjectId) -> usize {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|xobjects| doc.dereference(xobjects).ok())
        .and_then(|(_, xobjects)| xobjects.as_dict().ok())
    else {
        return 0;
    };

    xobjects.iter().filter(|(_, object)| is_image(doc, object)).count()
}

fn is_image(doc: &Document, object: &Object) -> bool {
    doc.dereference(object)
        .ok()
        .and_then(|(_, object)| object.as_stream().ok())
        .and_then(|stream| stream.dict.get(b"Subtype").ok())
        .and_then(|subtype| subtype.as_name().ok())
        .is_some_and(|name| name == b"Image")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};
    use std::io::Cursor;

    /// Build a PDF whose pages each show one line of text and reference the
    /// given number of images.
    fn build_pdf(pages: &[(&str, usize)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });

        let mut kids: Vec<Object> = Vec::new();
        for (text, images) in pages {
            let mut xobjects = Dictionary::new();
            for i in 0..*images {
                let image = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 1,
                        "Height" => 1,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![0u8],
                );
                let image_id = doc.add_object(image);
                xobjects.set(format!("Im{}", i + 1), image_id);
            }

            let resources_id = doc.add_object(dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            });

            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pages_become_slides() {
        let bytes = build_pdf(&[("Introduction", 0), ("Results", 2)]);

        let deck = PdfParser::new().parse(Cursor::new(bytes), "lecture.pdf").unwrap();

        assert_eq!(deck.format, DeckFormat::Pdf);
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].number, 1);
        assert!(deck.slides[0].text().contains("Introduction"));
        assert!(deck.slides[0].image_placeholders.is_empty());
        assert!(deck.slides[1].text().contains("Results"));
        assert_eq!(
            deck.slides[1].image_placeholders,
            vec!["[Image 1 detected on page 2]", "[Image 2 detected on page 2]"]
        );
    }

    #[test]
    fn test_not_a_pdf() {
        let err = PdfParser::new()
            .parse(Cursor::new(b"not a pdf".to_vec()), "broken.pdf")
            .unwrap_err();
        assert!(matches!(err, Error::PdfParseError(_)));
    }
}
