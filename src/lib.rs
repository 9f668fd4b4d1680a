//! Image graphics for WordprocessingML documents
//!
//! Embeds raster images into `.docx` documents as inline DrawingML pictures,
//! wraps pictures found in loaded documents, and exposes their geometry and
//! appearance in pixels and degrees.

pub mod units;
pub mod image;
pub mod ooxml;
pub mod drawing;
pub mod graphic;

pub use drawing::{BlackWhiteMode, BlipCompression, Drawing, Placement, ShapeType, WrapImageText};
pub use graphic::{GraphicState, ImageGraphic, ImageOptions};
pub use image::{ImageError, ImageFormat, Size};
pub use ooxml::{Document, OoxmlError};
