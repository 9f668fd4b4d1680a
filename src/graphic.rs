//! Image graphic objects
//!
//! An [`ImageGraphic`] is a handle to a picture drawing in a [`Document`]:
//! the drawing id in the body tree plus, when resolved, the name of the image
//! part holding its bytes. The document is passed to every call; the handle
//! itself stores no geometry.
//!
//! # Example
//!
//! ```no_run
//! use velum_graphic::graphic::{ImageGraphic, ImageOptions};
//! use velum_graphic::ooxml::Document;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut document = Document::new();
//!     let paragraph = document.add_paragraph("Figure 1");
//!     let image = ImageGraphic::from_file(
//!         &mut document,
//!         paragraph,
//!         "logo.png",
//!         Some(120.0),
//!         None,
//!         &ImageOptions::default(),
//!     )?;
//!     image.set_rotation(&mut document, Some(90))?;
//!     std::fs::write("out.docx", document.to_docx()?)?;
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::drawing::{
    BlackWhiteMode, BlipCompression, DocProperties, Drawing, Extent, Picture, Placement,
    ShapeType, WrapImageText,
};
use crate::image::{decode_dimensions, ImageError, ImageFormat};
use crate::ooxml::{Document, DrawingHost, DrawingId, ImagePartStore};
use crate::units::pixels_to_emu;

/// Edit id stamped on newly built inline drawings (`wp14:editId`)
const NEW_DRAWING_EDIT_ID: &str = "50D07946";

// ============================================================================
// Options
// ============================================================================

/// Appearance of a newly embedded image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Outline geometry of the picture
    pub shape: ShapeType,
    /// Compression state hint of the blip
    pub compression: BlipCompression,
}

/// Lifecycle of an [`ImageGraphic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicState {
    /// No image part is bound; property access still works
    Unbound,
    /// Bound to an image part of the document
    Bound,
    /// Part deleted and drawing detached
    Removed,
}

// ============================================================================
// Image graphic
// ============================================================================

/// Handle to a picture drawing of a document
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGraphic {
    drawing_id: DrawingId,
    part_name: Option<String>,
    source_path: Option<PathBuf>,
    state: GraphicState,
}

impl ImageGraphic {
    /// Embed `data` as a new inline picture at the end of paragraph `paragraph`.
    ///
    /// A missing width or height is taken from the decoded image, each axis
    /// on its own. Nothing is left in the document when embedding fails.
    pub fn from_bytes(
        document: &mut Document,
        paragraph: usize,
        data: &[u8],
        file_name: &str,
        width: Option<f64>,
        height: Option<f64>,
        options: &ImageOptions,
    ) -> Result<Self, ImageError> {
        let format = ImageFormat::from_magic_bytes(data);
        if format == ImageFormat::Unknown {
            return Err(ImageError::UnknownFormat);
        }

        let (width, height) = match (width, height) {
            (Some(width), Some(height)) => (width, height),
            (width, height) => {
                let natural = decode_dimensions(data, format)?;
                (width.unwrap_or(natural.width), height.unwrap_or(natural.height))
            }
        };

        if document.body.paragraph(paragraph).is_none() {
            return Err(ImageError::ParagraphNotFound(paragraph));
        }

        let (part_name, relationship_id) = document.package.add_image_part(data, format)?;

        let extent = Extent {
            cx: pixels_to_emu(width),
            cy: pixels_to_emu(height),
        };
        let stem = Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let doc_properties = DocProperties {
            id: document.next_doc_properties_id(),
            name: stem,
            description: None,
        };
        let picture = Picture::new(
            file_name,
            &relationship_id,
            options.compression,
            options.shape.clone(),
            extent,
        );
        let mut drawing = Drawing::inline(extent, doc_properties, picture);
        if let Placement::Inline(inline) = &mut drawing.placement {
            inline.edit_id = Some(NEW_DRAWING_EDIT_ID.to_string());
        }

        let drawing_id = match document.body.append_drawing(paragraph, drawing) {
            Ok(id) => id,
            Err(e) => {
                document.package.delete_part(&part_name)?;
                return Err(e);
            }
        };

        debug!(
            "Embedded {} as {} ({}), {}x{} px",
            file_name, part_name, relationship_id, width, height
        );
        Ok(ImageGraphic {
            drawing_id,
            part_name: Some(part_name),
            source_path: None,
            state: GraphicState::Bound,
        })
    }

    /// Read an image file and embed it; the file name becomes the picture name.
    pub fn from_file(
        document: &mut Document,
        paragraph: usize,
        path: impl AsRef<Path>,
        width: Option<f64>,
        height: Option<f64>,
        options: &ImageOptions,
    ) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut graphic =
            Self::from_bytes(document, paragraph, &data, &file_name, width, height, options)?;
        graphic.source_path = Some(path.to_path_buf());
        Ok(graphic)
    }

    /// Wrap a drawing already in the body, binding the first image part whose
    /// relationship id matches the drawing's blip.
    pub fn wrap(document: &Document, drawing_id: DrawingId) -> Self {
        let relationship_id = document
            .body
            .drawing(drawing_id)
            .and_then(|drawing| drawing.relationship_id());

        let part_name = relationship_id.and_then(|rel_id| {
            document
                .package
                .image_parts()
                .into_iter()
                .find(|(_, id)| *id == rel_id)
                .map(|(part, _)| part.name.clone())
        });

        match &part_name {
            Some(name) => debug!("Wrapped {} bound to {}", drawing_id, name),
            None => debug!("Wrapped {} without an image part", drawing_id),
        }

        let state = if part_name.is_some() {
            GraphicState::Bound
        } else {
            GraphicState::Unbound
        };
        ImageGraphic {
            drawing_id,
            part_name,
            source_path: None,
            state,
        }
    }

    pub fn id(&self) -> DrawingId {
        self.drawing_id
    }

    pub fn state(&self) -> GraphicState {
        self.state
    }

    /// Name of the bound image part
    pub fn part_name(&self) -> Option<&str> {
        self.part_name.as_deref()
    }

    /// Path the image was read from, for graphics built with [`ImageGraphic::from_file`]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn drawing<'a>(&self, document: &'a Document) -> Option<&'a Drawing> {
        document.body.drawing(self.drawing_id)
    }

    pub fn drawing_mut<'a>(&self, document: &'a mut Document) -> Option<&'a mut Drawing> {
        document.body.drawing_mut(self.drawing_id)
    }

    fn update<F>(&self, document: &mut Document, update: F) -> Result<(), ImageError>
    where
        F: FnOnce(&mut Drawing) -> Result<(), ImageError>,
    {
        let drawing = self.drawing_mut(document).ok_or(ImageError::DrawingNotFound)?;
        update(drawing)
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Width in pixels
    pub fn width(&self, document: &Document) -> Option<f64> {
        self.drawing(document).map(Drawing::width)
    }

    /// Height in pixels
    pub fn height(&self, document: &Document) -> Option<f64> {
        self.drawing(document).map(Drawing::height)
    }

    pub fn set_width(&self, document: &mut Document, px: f64) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_width(px))
    }

    pub fn set_height(&self, document: &mut Document, px: f64) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_height(px))
    }

    pub fn emu_width(&self, document: &Document) -> Option<i64> {
        self.drawing(document).map(Drawing::emu_width)
    }

    pub fn emu_height(&self, document: &Document) -> Option<i64> {
        self.drawing(document).map(Drawing::emu_height)
    }

    // ========================================================================
    // Identification
    // ========================================================================

    pub fn relationship_id<'a>(&self, document: &'a Document) -> Option<&'a str> {
        self.drawing(document)?.relationship_id()
    }

    pub fn file_name<'a>(&self, document: &'a Document) -> Option<&'a str> {
        self.drawing(document)?.file_name()
    }

    pub fn set_file_name(&self, document: &mut Document, name: &str) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_file_name(name))
    }

    pub fn description<'a>(&self, document: &'a Document) -> Option<&'a str> {
        self.drawing(document)?.description()
    }

    pub fn set_description(
        &self,
        document: &mut Document,
        description: Option<&str>,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| {
            drawing.set_description(description);
            Ok(())
        })
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    pub fn shape(&self, document: &Document) -> Option<ShapeType> {
        self.drawing(document)?.shape().cloned()
    }

    pub fn set_shape(&self, document: &mut Document, shape: ShapeType) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_shape(shape))
    }

    /// Rotation in degrees
    pub fn rotation(&self, document: &Document) -> Option<i32> {
        self.drawing(document)?.rotation()
    }

    pub fn set_rotation(
        &self,
        document: &mut Document,
        degrees: Option<i32>,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_rotation(degrees))
    }

    pub fn horizontal_flip(&self, document: &Document) -> Option<bool> {
        self.drawing(document)?.horizontal_flip()
    }

    pub fn set_horizontal_flip(
        &self,
        document: &mut Document,
        flip: bool,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_horizontal_flip(flip))
    }

    pub fn vertical_flip(&self, document: &Document) -> Option<bool> {
        self.drawing(document)?.vertical_flip()
    }

    pub fn set_vertical_flip(
        &self,
        document: &mut Document,
        flip: bool,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_vertical_flip(flip))
    }

    pub fn black_white_mode(&self, document: &Document) -> Option<BlackWhiteMode> {
        self.drawing(document)?.black_white_mode()
    }

    pub fn set_black_white_mode(
        &self,
        document: &mut Document,
        mode: Option<BlackWhiteMode>,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_black_white_mode(mode))
    }

    pub fn compression_quality(&self, document: &Document) -> Option<BlipCompression> {
        self.drawing(document)?.compression_quality()
    }

    pub fn set_compression_quality(
        &self,
        document: &mut Document,
        compression: BlipCompression,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_compression_quality(compression))
    }

    pub fn placement_kind(&self, document: &Document) -> Option<WrapImageText> {
        self.drawing(document).map(Drawing::placement_kind)
    }

    pub fn set_wrap_text(
        &self,
        document: &mut Document,
        wrap: WrapImageText,
    ) -> Result<(), ImageError> {
        self.update(document, |drawing| drawing.set_wrap_text(wrap))
    }

    // ========================================================================
    // Binary data
    // ========================================================================

    /// Bytes of the bound image part
    pub fn image_data<'a>(&self, document: &'a Document) -> Result<&'a [u8], ImageError> {
        let part_name = self.part_name.as_deref().ok_or(ImageError::NotBound)?;
        document.package.part_data(part_name).ok_or(ImageError::NotBound)
    }

    /// Write the bound image part to `path`, replacing any existing file.
    pub fn save_to_file(
        &self,
        document: &Document,
        path: impl AsRef<Path>,
    ) -> Result<(), ImageError> {
        let data = self.image_data(document)?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(data)?;
        debug!("Saved {} bytes to {}", data.len(), path.as_ref().display());
        Ok(())
    }

    /// Delete the bound image part and detach the drawing from the body.
    ///
    /// Calling it again does nothing.
    pub fn remove(&mut self, document: &mut Document) -> Result<(), ImageError> {
        if let Some(part_name) = self.part_name.take() {
            if document.package.get_part(&part_name).is_some() {
                document.package.delete_part(&part_name)?;
            }
        }
        if document.body.detach_drawing(self.drawing_id).is_some() {
            debug!("Removed {}", self.drawing_id);
        }
        self.state = GraphicState::Removed;
        Ok(())
    }
}
