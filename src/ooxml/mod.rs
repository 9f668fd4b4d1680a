//! OOXML (Office Open XML) package and document body for Word documents (.docx)
//!
//! This module implements the part of the OPC (Open Packaging Conventions)
//! standard needed to store images in a document: parts, content types and
//! relationships, read from and written to a ZIP archive. It also holds the
//! minimal body tree (paragraphs, text runs and drawings) that hosts image
//! graphics.
//!
//! # Example
//!
//! ```no_run
//! use velum_graphic::ooxml::Document;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("document.docx")?;
//!     let document = Document::from_docx(&file_data)?;
//!     for image in document.images() {
//!         println!("{:?}: {:?}", image.file_name(&document), image.width(&document));
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod types;
mod opc;
mod store;
mod document;
pub(crate) mod markup;

pub use error::OoxmlError;
pub use types::{ContentType, PackagePart, Relationship, RelationshipType};
pub use opc::{OpcPackage, MAIN_DOCUMENT_PART, MEDIA_FOLDER};
pub use store::ImagePartStore;
pub use document::{Body, Document, DrawingHost, DrawingId, Paragraph, Run};
