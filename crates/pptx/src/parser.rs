//! PPTX file parser implementation.

use lecture_core::extract::display_name;
use lecture_core::{Deck, DeckFormat, DocumentExtractor, Error, ExtractedSlide, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Placeholder recorded for every picture shape on a slide.
pub const PICTURE_PLACEHOLDER: &str = "[Image detected]";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = Deck::new(filename, DeckFormat::Pptx);

        let slide_order = self.get_slide_order(&mut archive)?;

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            deck.add_slide(slide);
        }

        log::debug!(
            "Parsed {} slide(s) with {} picture(s) from {}",
            deck.slides.len(),
            deck.image_count(),
            filename
        );

        Ok(deck)
    }

    /// Get the ordered list of slide paths.
    ///
    /// The slide list in `presentation.xml` is authoritative; when it cannot
    /// be read, slides are ordered by the number in their relationship id or
    /// file name.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = "ppt/_rels/presentation.xml.rels";
        let rels_content = self.read_file_from_archive(archive, rels_path)?;
        let mut slides: Vec<(String, String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    if rel_type.ends_with("/slide") {
                        let order_num = extract_slide_number(&target).or_else(|| extract_slide_number(&id));
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((id, full_path, order_num));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        match self.read_slide_id_list(archive) {
            Ok(ids) if !ids.is_empty() => {
                let by_id: HashMap<&str, &str> = slides
                    .iter()
                    .map(|(id, path, _)| (id.as_str(), path.as_str()))
                    .collect();
                let ordered: Vec<String> = ids
                    .iter()
                    .filter_map(|id| by_id.get(id.as_str()).map(|p| p.to_string()))
                    .collect();
                if !ordered.is_empty() {
                    return Ok(ordered);
                }
            }
            Ok(_) => {}
            Err(e) => log::debug!("No usable slide list in presentation.xml: {}", e),
        }

        slides.sort_by(|a, b| match (a.2, b.2) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.1.cmp(&b.1),
        });

        Ok(slides.into_iter().map(|(_, path, _)| path).collect())
    }

    /// Relationship ids of `p:sldId` entries, in presentation order.
    fn read_slide_id_list<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let content = self.read_file_from_archive(archive, "ppt/presentation.xml")?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);
        let mut ids = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                    // The bare `id` attribute is a numeric slide id; the
                    // namespaced one is the relationship id.
                    for attr in e.attributes().flatten() {
                        let key = attr.key.as_ref();
                        if key != b"id" && local_name(key) == b"id" {
                            ids.push(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing presentation.xml: {}", e)));
                }
                _ => {}
            }
        }

        Ok(ids)
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ExtractedSlide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = ExtractedSlide::new(slide_number);

        for shape in self.extract_shapes_from_xml(&content)? {
            if !shape.text.is_empty() {
                slide.add_line_with_position(&shape.text, shape.y, shape.x);
            } else if shape.is_picture {
                slide.add_image_placeholder(PICTURE_PLACEHOLDER);
            }
        }

        slide.sort_by_position();

        Ok(slide)
    }

    /// Extract text shapes and pictures with their positions from slide XML.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<Vec<ShapeInfo>> {
        let mut shapes = Vec::new();
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);

        let mut current_shape: Option<ShapeInfo> = None;
        let mut in_text_body = false;
        let mut in_paragraph = false;
        let mut current_text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    // Tables and charts live in graphic frames; a table's
                    // cell text is kept as one shape at the frame position.
                    b"sp" | b"graphicFrame" => {
                        current_shape = Some(ShapeInfo::default());
                        current_text.clear();
                    }
                    b"pic" => {
                        current_shape = Some(ShapeInfo {
                            is_picture: true,
                            ..ShapeInfo::default()
                        });
                        current_text.clear();
                    }
                    b"off" => read_offset(e, current_shape.as_mut()),
                    b"txBody" => in_text_body = true,
                    b"p" if in_text_body => {
                        in_paragraph = true;
                        if !current_text.is_empty() {
                            current_text.push('\n');
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if local_name(e.name().as_ref()) == b"off" {
                        read_offset(e, current_shape.as_mut());
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_paragraph {
                        let text = e.unescape().unwrap_or_default();
                        current_text.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" | b"pic" | b"graphicFrame" => {
                        if let Some(mut shape) = current_shape.take() {
                            shape.text = current_text.trim().to_string();
                            if !shape.text.is_empty() || shape.is_picture {
                                shapes.push(shape);
                            }
                        }
                        current_text.clear();
                        in_text_body = false;
                        in_paragraph = false;
                    }
                    b"txBody" => in_text_body = false,
                    b"p" => in_paragraph = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::PptxParseError(format!("Malformed slide XML: {}", e)));
                }
                _ => {}
            }
        }

        Ok(shapes)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PptxParser {
    fn format(&self) -> DeckFormat {
        DeckFormat::Pptx
    }

    fn extract(&self, path: &Path) -> Result<Deck> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), display_name(path))
    }
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    is_picture: bool,
}

/// Copy the `x`/`y` attributes of an `a:off` element onto the current shape.
fn read_offset(e: &BytesStart, shape: Option<&mut ShapeInfo>) {
    let Some(shape) = shape else {
        return;
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"x" => {
                if let Ok(x) = value.parse::<f64>() {
                    shape.x = x;
                }
            }
            b"y" => {
                if let Ok(y) = value.parse::<f64>() {
                    shape.y = y;
                }
            }
            _ => {}
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
