//! Document body tree and the `.docx` document it lives in
//!
//! The body is a flat list of paragraphs whose runs hold either plain text
//! or a single drawing. Drawings are addressed by a [`DrawingId`] handle that
//! stays valid until the drawing is detached.

use std::collections::HashSet;
use std::fmt;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::OoxmlError;
use super::markup::{escape_xml_text, find_element, unescape_xml};
use super::opc::OpcPackage;
use super::types::ContentType;
use crate::drawing::{parse_drawing, Drawing};
use crate::graphic::ImageGraphic;
use crate::image::ImageError;

static PARAGRAPH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:p\b[^>]*/>|<w:p\b[^>]*>.*?</w:p>").expect("valid paragraph pattern")
});
static RUN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:r\b[^>]*/>|<w:r\b[^>]*>.*?</w:r>").expect("valid run pattern")
});
static TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid text pattern")
});

const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:wp14="http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

// ============================================================================
// Body tree
// ============================================================================

/// Handle of a drawing attached to a [`Body`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawingId(u32);

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawing#{}", self.0)
    }
}

/// A run of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text(String),
    Drawing { id: DrawingId, drawing: Drawing },
}

/// A paragraph (`w:p`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all text runs
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter_map(|run| match run {
                Run::Text(text) => Some(text.as_str()),
                Run::Drawing { .. } => None,
            })
            .collect()
    }
}

/// Host of drawings inside the body tree
pub trait DrawingHost {
    /// Append `drawing` as a new run at the end of paragraph `paragraph`.
    fn append_drawing(
        &mut self,
        paragraph: usize,
        drawing: Drawing,
    ) -> Result<DrawingId, ImageError>;

    fn drawing(&self, id: DrawingId) -> Option<&Drawing>;

    fn drawing_mut(&mut self, id: DrawingId) -> Option<&mut Drawing>;

    /// Remove the run holding the drawing and hand the drawing back.
    fn detach_drawing(&mut self, id: DrawingId) -> Option<Drawing>;

    /// Ids of all attached drawings, in document order.
    fn drawing_ids(&self) -> Vec<DrawingId>;
}

/// Document body (`w:body`)
#[derive(Debug, Clone, Default)]
pub struct Body {
    paragraphs: Vec<Paragraph>,
    next_drawing_id: u32,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    /// Append a paragraph holding `text` (no run when empty) and return its index.
    pub fn add_paragraph(&mut self, text: &str) -> usize {
        let mut paragraph = Paragraph::default();
        if !text.is_empty() {
            paragraph.runs.push(Run::Text(text.to_string()));
        }
        self.paragraphs.push(paragraph);
        self.paragraphs.len() - 1
    }

    fn allocate_drawing_id(&mut self) -> DrawingId {
        self.next_drawing_id += 1;
        DrawingId(self.next_drawing_id)
    }

    fn find_run(&self, id: DrawingId) -> Option<(usize, usize)> {
        self.paragraphs.iter().enumerate().find_map(|(p, paragraph)| {
            paragraph
                .runs
                .iter()
                .position(|run| matches!(run, Run::Drawing { id: run_id, .. } if *run_id == id))
                .map(|r| (p, r))
        })
    }

    /// Read paragraphs, text runs and drawings from `document.xml` markup.
    pub fn from_xml(xml: &str) -> Self {
        let mut body = Body::new();
        let content = find_element(xml, "w:body").unwrap_or("");

        for paragraph_match in PARAGRAPH_PATTERN.find_iter(content) {
            let mut paragraph = Paragraph::default();
            for run_match in RUN_PATTERN.find_iter(paragraph_match.as_str()) {
                let run = run_match.as_str();
                if run.contains("<w:drawing") {
                    match parse_drawing(run) {
                        Some(drawing) => {
                            let id = body.allocate_drawing_id();
                            paragraph.runs.push(Run::Drawing { id, drawing });
                        }
                        None => log::warn!("Dropping a drawing without a readable placement"),
                    }
                    continue;
                }

                let text: String = TEXT_PATTERN
                    .captures_iter(run)
                    .map(|cap| unescape_xml(&cap[1]))
                    .collect();
                if !text.is_empty() {
                    paragraph.runs.push(Run::Text(text));
                }
            }
            body.paragraphs.push(paragraph);
        }

        body
    }

    /// Write the body as a complete `document.xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!("<w:document {}><w:body>", DOCUMENT_NAMESPACES));

        for paragraph in &self.paragraphs {
            if paragraph.runs.is_empty() {
                xml.push_str("<w:p/>");
                continue;
            }
            xml.push_str("<w:p>");
            for run in &paragraph.runs {
                match run {
                    Run::Text(text) => xml.push_str(&format!(
                        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                        escape_xml_text(text)
                    )),
                    Run::Drawing { drawing, .. } => {
                        xml.push_str("<w:r>");
                        xml.push_str(&drawing.to_xml());
                        xml.push_str("</w:r>");
                    }
                }
            }
            xml.push_str("</w:p>");
        }

        xml.push_str("</w:body></w:document>");
        xml
    }
}

impl DrawingHost for Body {
    fn append_drawing(
        &mut self,
        paragraph: usize,
        drawing: Drawing,
    ) -> Result<DrawingId, ImageError> {
        if paragraph >= self.paragraphs.len() {
            return Err(ImageError::ParagraphNotFound(paragraph));
        }
        let id = self.allocate_drawing_id();
        self.paragraphs[paragraph].runs.push(Run::Drawing { id, drawing });
        Ok(id)
    }

    fn drawing(&self, id: DrawingId) -> Option<&Drawing> {
        let (p, r) = self.find_run(id)?;
        match &self.paragraphs[p].runs[r] {
            Run::Drawing { drawing, .. } => Some(drawing),
            Run::Text(_) => None,
        }
    }

    fn drawing_mut(&mut self, id: DrawingId) -> Option<&mut Drawing> {
        let (p, r) = self.find_run(id)?;
        match &mut self.paragraphs[p].runs[r] {
            Run::Drawing { drawing, .. } => Some(drawing),
            Run::Text(_) => None,
        }
    }

    fn detach_drawing(&mut self, id: DrawingId) -> Option<Drawing> {
        let (p, r) = self.find_run(id)?;
        match self.paragraphs[p].runs.remove(r) {
            Run::Drawing { drawing, .. } => Some(drawing),
            Run::Text(_) => None,
        }
    }

    fn drawing_ids(&self) -> Vec<DrawingId> {
        self.paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.runs.iter())
            .filter_map(|run| match run {
                Run::Drawing { id, .. } => Some(*id),
                Run::Text(_) => None,
            })
            .collect()
    }
}

// ============================================================================
// Document
// ============================================================================

/// A word-processing document: its package and its body tree
#[derive(Debug, Clone)]
pub struct Document {
    pub package: OpcPackage,
    pub body: Body,
    next_doc_properties_id: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Document {
            package: OpcPackage::new(),
            body: Body::new(),
            next_doc_properties_id: 1,
        }
    }

    /// Load a document from `.docx` file data
    pub fn from_docx(file_data: &[u8]) -> Result<Self, OoxmlError> {
        let package = OpcPackage::from_zip(file_data)?;
        let main_part = package.main_document_part();
        let part = package
            .get_part(&main_part)
            .ok_or_else(|| OoxmlError::PartNotFound(main_part.clone()))?;
        let xml = String::from_utf8(part.data.clone())
            .map_err(|e| OoxmlError::ParseError(format!("{} is not UTF-8: {}", main_part, e)))?;

        let body = Body::from_xml(&xml);
        let highest_id = body
            .drawing_ids()
            .into_iter()
            .filter_map(|id| body.drawing(id))
            .map(|drawing| drawing.doc_properties().id)
            .max()
            .unwrap_or(0);

        debug!(
            "Loaded document with {} paragraphs and {} drawings",
            body.paragraphs().len(),
            body.drawing_ids().len()
        );
        Ok(Document {
            package,
            body,
            next_doc_properties_id: highest_id.wrapping_add(1),
        })
    }

    /// Write the document as `.docx` file data
    pub fn to_docx(&self) -> Result<Vec<u8>, OoxmlError> {
        let mut package = self.package.clone();
        package.put_part(
            &package.main_document_part(),
            ContentType::MainDocument,
            self.body.to_xml().into_bytes(),
        );
        package.to_zip()
    }

    /// Append a paragraph holding `text` and return its index
    pub fn add_paragraph(&mut self, text: &str) -> usize {
        self.body.add_paragraph(text)
    }

    /// Allocate a `wp:docPr` id unique within this document
    ///
    /// Ids count up from the highest one seen; past `u32::MAX` the count
    /// restarts at 1 and skips ids still held by a drawing.
    pub fn next_doc_properties_id(&mut self) -> u32 {
        let used: HashSet<u32> = self
            .body
            .drawing_ids()
            .into_iter()
            .filter_map(|id| self.body.drawing(id))
            .map(|drawing| drawing.doc_properties().id)
            .collect();

        let mut id = self.next_doc_properties_id;
        while id == 0 || used.contains(&id) {
            id = id.wrapping_add(1);
        }
        self.next_doc_properties_id = id.wrapping_add(1);
        id
    }

    /// Every drawing of the body, in document order, wrapped as an image graphic
    pub fn images(&self) -> Vec<ImageGraphic> {
        self.body
            .drawing_ids()
            .into_iter()
            .map(|id| ImageGraphic::wrap(self, id))
            .collect()
    }
}
