//! Image module for the Velum graphic core.
//! Sniffs the format of raw image bytes and decodes their natural pixel size
//! from the file header, without decoding pixel data.
//!
//! # Features
//! - PNG, JPEG, GIF, BMP, WebP and TIFF header parsing
//! - Mapping between image formats and OOXML content types
//! - The error type shared by the graphic object operations
//!
//! # Example
//!
//! ```rust
//! use velum_graphic::image::{probe, ImageFormat};
//!
//! let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
//! png.extend_from_slice(&[0, 0, 0, 13]);
//! png.extend_from_slice(b"IHDR");
//! png.extend_from_slice(&200u32.to_be_bytes());
//! png.extend_from_slice(&100u32.to_be_bytes());
//!
//! let info = probe(&png).unwrap();
//! assert_eq!(info.format, ImageFormat::Png);
//! assert_eq!((info.size.width, info.size.height), (200.0, 100.0));
//! ```

use std::fmt;
use serde::{Deserialize, Serialize};
use log::debug;

use crate::ooxml::{ContentType, OoxmlError};
use crate::units::{emu_to_pixels, pixels_to_emu};

/// Largest accepted edge length in pixels.
pub const MAX_DIMENSION: u32 = 1_000_000;

// ============================================================================
// Size
// ============================================================================

/// 2D size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width dimension
    pub width: f64,
    /// Height dimension
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self { width: 0.0, height: 0.0 }
    }
}

impl Size {
    /// Create a new size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a size from EMU dimensions
    pub fn from_emu(width_emu: i64, height_emu: i64) -> Self {
        Self::new(emu_to_pixels(width_emu), emu_to_pixels(height_emu))
    }

    /// Convert to EMU dimensions
    pub fn to_emu(&self) -> (i64, i64) {
        (pixels_to_emu(self.width), pixels_to_emu(self.height))
    }

    /// Check if size is valid (positive dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ============================================================================
// Image Format
// ============================================================================

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG (Joint Photographic Experts Group)
    Jpeg,
    /// Graphics Interchange Format
    Gif,
    /// Bitmap image
    Bmp,
    /// WebP image
    WebP,
    /// TIFF image
    Tiff,
    /// Unknown format
    Unknown,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Jpeg => write!(f, "JPEG"),
            ImageFormat::Gif => write!(f, "GIF"),
            ImageFormat::Bmp => write!(f, "BMP"),
            ImageFormat::WebP => write!(f, "WebP"),
            ImageFormat::Tiff => write!(f, "TIFF"),
            ImageFormat::Unknown => write!(f, "Unknown"),
        }
    }
}

impl ImageFormat {
    /// Detect format from magic bytes at the start of the data
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return ImageFormat::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return ImageFormat::Jpeg;
        }

        // GIF87a or GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return ImageFormat::Gif;
        }

        // BMP: 42 4D
        if data.starts_with(b"BM") {
            return ImageFormat::Bmp;
        }

        // WebP: RIFF .... WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return ImageFormat::WebP;
        }

        // TIFF: II*\0 (little endian) or MM\0* (big endian)
        if data.starts_with(b"II\x2A\x00") || data.starts_with(b"MM\x00\x2A") {
            return ImageFormat::Tiff;
        }

        ImageFormat::Unknown
    }

    /// Map an OOXML content type back to an image format
    pub fn from_content_type(content_type: &ContentType) -> Self {
        match content_type {
            ContentType::ImagePng => ImageFormat::Png,
            ContentType::ImageJpeg => ImageFormat::Jpeg,
            ContentType::ImageGif => ImageFormat::Gif,
            ContentType::ImageBmp => ImageFormat::Bmp,
            ContentType::ImageWebP => ImageFormat::WebP,
            ContentType::ImageTiff => ImageFormat::Tiff,
            _ => ImageFormat::Unknown,
        }
    }

    /// Content type registered for parts of this format
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            ImageFormat::Png => Some(ContentType::ImagePng),
            ImageFormat::Jpeg => Some(ContentType::ImageJpeg),
            ImageFormat::Gif => Some(ContentType::ImageGif),
            ImageFormat::Bmp => Some(ContentType::ImageBmp),
            ImageFormat::WebP => Some(ContentType::ImageWebP),
            ImageFormat::Tiff => Some(ContentType::ImageTiff),
            ImageFormat::Unknown => None,
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Unknown => "bin",
        }
    }
}

/// Format and natural pixel size of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub size: Size,
}

// ============================================================================
// Image Errors
// ============================================================================

/// Errors that can occur while embedding, inspecting or extracting images.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unknown or unsupported image format")]
    UnknownFormat,
    #[error("Failed to decode image: {0}")]
    DecodeError(String),
    #[error("Image dimensions exceed maximum allowed size")]
    DimensionsExceeded,
    #[error("Invalid image dimensions (zero or negative)")]
    InvalidDimensions,
    #[error("No image part is bound to this graphic")]
    NotBound,
    #[error("Drawing is not attached to the document body")]
    DrawingNotFound,
    #[error("Paragraph {0} does not exist")]
    ParagraphNotFound(usize),
    #[error("Drawing is missing the {0} element")]
    MissingElement(&'static str),
    #[error("Rotation of {0} degrees is out of range")]
    InvalidRotation(i32),
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Package(#[from] OoxmlError),
}

impl ImageError {
    /// Whether the error means the bytes are not a usable image.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImageError::UnknownFormat
                | ImageError::DecodeError(_)
                | ImageError::DimensionsExceeded
                | ImageError::InvalidDimensions
                | ImageError::Package(OoxmlError::UnsupportedContentType(_))
        )
    }
}

// ============================================================================
// Image Dimension Decoding
// ============================================================================

/// Sniff the format of `data` and decode its natural pixel size.
pub fn probe(data: &[u8]) -> Result<ImageInfo, ImageError> {
    let format = ImageFormat::from_magic_bytes(data);
    let size = decode_dimensions(data, format)?;
    debug!("Probed image: format: {}, dimensions: {}x{}",
        format, size.width as u32, size.height as u32);
    Ok(ImageInfo { format, size })
}

/// Decode image dimensions from raw bytes (format-dependent).
pub fn decode_dimensions(data: &[u8], format: ImageFormat) -> Result<Size, ImageError> {
    let (width, height) = match format {
        ImageFormat::Png => decode_png_dimensions(data)?,
        ImageFormat::Jpeg => decode_jpeg_dimensions(data)?,
        ImageFormat::Gif => decode_gif_dimensions(data)?,
        ImageFormat::Bmp => decode_bmp_dimensions(data)?,
        ImageFormat::WebP => decode_webp_dimensions(data)?,
        ImageFormat::Tiff => decode_tiff_dimensions(data)?,
        ImageFormat::Unknown => return Err(ImageError::UnknownFormat),
    };

    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImageError::DimensionsExceeded);
    }

    Ok(Size::new(width as f64, height as f64))
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u24(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 3).map(|b| u32::from_le_bytes([b[0], b[1], b[2], 0]))
}

fn truncated(format: &str) -> ImageError {
    ImageError::DecodeError(format!("truncated {} header", format))
}

/// Decode PNG dimensions from IHDR chunk.
fn decode_png_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    // Signature (8) + chunk length (4) + chunk type (4), then width and height
    if data.get(12..16) != Some(b"IHDR".as_slice()) {
        return Err(ImageError::DecodeError("missing PNG IHDR chunk".to_string()));
    }
    let width = be_u32(data, 16).ok_or_else(|| truncated("PNG"))?;
    let height = be_u32(data, 20).ok_or_else(|| truncated("PNG"))?;
    Ok((width, height))
}

/// Decode JPEG dimensions from the first SOF segment.
fn decode_jpeg_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    let mut i = 2;
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            return Err(ImageError::DecodeError("invalid JPEG marker".to_string()));
        }
        let marker = data[i + 1];
        if marker == 0xFF {
            // fill byte
            i += 1;
            continue;
        }
        // Standalone markers carry no length
        if marker == 0x01 || (0xD0..=0xD9).contains(&marker) {
            i += 2;
            continue;
        }

        let length = be_u16(data, i + 2).ok_or_else(|| truncated("JPEG"))? as usize;

        // SOF0-SOF15 except DHT (C4), JPG (C8) and DAC (CC)
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // Skip length (2 bytes) and precision (1 byte)
            let height = be_u16(data, i + 5).ok_or_else(|| truncated("JPEG"))?;
            let width = be_u16(data, i + 7).ok_or_else(|| truncated("JPEG"))?;
            return Ok((width as u32, height as u32));
        }

        i += 2 + length;
    }

    Err(ImageError::DecodeError("No SOF marker found".to_string()))
}

/// Decode GIF dimensions from Logical Screen Descriptor.
fn decode_gif_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    let width = le_u16(data, 6).ok_or_else(|| truncated("GIF"))?;
    let height = le_u16(data, 8).ok_or_else(|| truncated("GIF"))?;
    Ok((width as u32, height as u32))
}

/// Decode BMP dimensions from BITMAPINFOHEADER.
fn decode_bmp_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    let width = le_u32(data, 18).ok_or_else(|| truncated("BMP"))? as i32;
    // Negative height marks a top-down bitmap
    let height = le_u32(data, 22).ok_or_else(|| truncated("BMP"))? as i32;
    if width <= 0 {
        return Err(ImageError::InvalidDimensions);
    }
    Ok((width as u32, height.unsigned_abs()))
}

/// Decode WebP dimensions from the first RIFF chunk.
fn decode_webp_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    match data.get(12..16) {
        // Extended format: 24-bit canvas size minus one
        Some(b"VP8X") => {
            let width = le_u24(data, 24).ok_or_else(|| truncated("WebP"))? + 1;
            let height = le_u24(data, 27).ok_or_else(|| truncated("WebP"))? + 1;
            Ok((width, height))
        }
        // Lossy: 14-bit sizes after the 9D 01 2A start code
        Some(b"VP8 ") => {
            if data.get(23..26) != Some([0x9D, 0x01, 0x2A].as_slice()) {
                return Err(ImageError::DecodeError("missing VP8 start code".to_string()));
            }
            let width = le_u16(data, 26).ok_or_else(|| truncated("WebP"))? & 0x3FFF;
            let height = le_u16(data, 28).ok_or_else(|| truncated("WebP"))? & 0x3FFF;
            Ok((width as u32, height as u32))
        }
        // Lossless: 14-bit sizes minus one packed after the 0x2F signature
        Some(b"VP8L") => {
            if data.get(20) != Some(&0x2F) {
                return Err(ImageError::DecodeError("missing VP8L signature".to_string()));
            }
            let bits = le_u32(data, 21).ok_or_else(|| truncated("WebP"))?;
            let width = (bits & 0x3FFF) + 1;
            let height = ((bits >> 14) & 0x3FFF) + 1;
            Ok((width, height))
        }
        _ => Err(ImageError::DecodeError("unknown WebP chunk".to_string())),
    }
}

/// Decode TIFF dimensions from the first IFD.
fn decode_tiff_dimensions(data: &[u8]) -> Result<(u32, u32), ImageError> {
    let is_le = data.starts_with(b"II");
    let read_u16 = |at: usize| if is_le { le_u16(data, at) } else { be_u16(data, at) };
    let read_u32 = |at: usize| if is_le { le_u32(data, at) } else { be_u32(data, at) };

    let ifd = read_u32(4).ok_or_else(|| truncated("TIFF"))? as usize;
    let entries = read_u16(ifd).ok_or_else(|| truncated("TIFF"))? as usize;

    let mut width = None;
    let mut height = None;

    for n in 0..entries {
        let entry = ifd + 2 + n * 12;
        let tag = read_u16(entry).ok_or_else(|| truncated("TIFF"))?;
        let field_type = read_u16(entry + 2).ok_or_else(|| truncated("TIFF"))?;
        // SHORT values sit in the first two bytes of the value field
        let value = match field_type {
            3 => read_u16(entry + 8).map(u32::from),
            4 => read_u32(entry + 8),
            _ => None,
        };

        match tag {
            256 => width = value,  // ImageWidth
            257 => height = value, // ImageLength
            _ => {}
        }

        if let (Some(w), Some(h)) = (width, height) {
            return Ok((w, h));
        }
    }

    Err(ImageError::DecodeError("Failed to parse TIFF dimensions".to_string()))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PNG: signature and IHDR chunk.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut png_data = vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        ];
        png_data.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]); // length
        png_data.extend_from_slice(b"IHDR");
        png_data.extend_from_slice(&width.to_be_bytes());
        png_data.extend_from_slice(&height.to_be_bytes());
        png_data.extend_from_slice(&[0x08, 0x02, 0x00, 0x00, 0x00]); // rest of IHDR
        png_data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // CRC (placeholder)
        png_data
    }

    #[test]
    fn test_image_format_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&png_bytes(1, 1)), ImageFormat::Png);
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF87a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x42, 0x4D, 0x00, 0x00]), ImageFormat::Bmp);
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), ImageFormat::WebP);
        assert_eq!(ImageFormat::from_magic_bytes(b"II\x2A\x00\x08\0\0\0"), ImageFormat::Tiff);
        assert_eq!(ImageFormat::from_magic_bytes(b"MM\x00\x2A\0\0\0\x08"), ImageFormat::Tiff);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x00, 0x00, 0x00, 0x00]), ImageFormat::Unknown);
        assert_eq!(ImageFormat::from_magic_bytes(&[]), ImageFormat::Unknown);
    }

    #[test]
    fn test_content_type_mapping() {
        for format in [
            ImageFormat::Png,
            ImageFormat::Jpeg,
            ImageFormat::Gif,
            ImageFormat::Bmp,
            ImageFormat::WebP,
            ImageFormat::Tiff,
        ] {
            let content_type = format.content_type().unwrap();
            assert!(content_type.is_image());
            assert_eq!(ImageFormat::from_content_type(&content_type), format);
        }
        assert!(ImageFormat::Unknown.content_type().is_none());
    }

    #[test]
    fn test_decode_png_dimensions() {
        let info = probe(&png_bytes(100, 200)).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!(info.size, Size::new(100.0, 200.0));
    }

    #[test]
    fn test_decode_truncated_png() {
        let data = &png_bytes(100, 200)[..18];
        let err = probe(data).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_decode_gif_dimensions() {
        // GIF89a header with 320x240 dimensions
        let gif_data = b"GIF89a\x40\x01\xF0\x00\x00\x00";
        let size = decode_dimensions(gif_data, ImageFormat::Gif).unwrap();
        assert_eq!(size, Size::new(320.0, 240.0));
    }

    #[test]
    fn test_decode_jpeg_dimensions() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 segment with 4 bytes of payload
        jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        // SOF0: length 17, precision 8, height 480, width 640
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0xE0, 0x02, 0x80]);
        jpeg.extend_from_slice(&[0x03, 0x01, 0x22, 0x00]);

        let info = probe(&jpeg).unwrap();
        assert_eq!(info.format, ImageFormat::Jpeg);
        assert_eq!(info.size, Size::new(640.0, 480.0));
    }

    #[test]
    fn test_decode_jpeg_without_sof() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(probe(&jpeg), Err(ImageError::DecodeError(_))));
    }

    #[test]
    fn test_decode_bmp_dimensions() {
        let mut bmp = vec![0u8; 54];
        bmp[0] = b'B';
        bmp[1] = b'M';
        bmp[18..22].copy_from_slice(&64i32.to_le_bytes());
        bmp[22..26].copy_from_slice(&(-32i32).to_le_bytes());

        let size = decode_dimensions(&bmp, ImageFormat::Bmp).unwrap();
        assert_eq!(size, Size::new(64.0, 32.0));
    }

    #[test]
    fn test_decode_webp_vp8x_dimensions() {
        let mut webp = b"RIFF\0\0\0\0WEBPVP8X".to_vec();
        webp.extend_from_slice(&[10, 0, 0, 0]); // chunk size
        webp.extend_from_slice(&[0, 0, 0, 0]); // flags + reserved
        webp.extend_from_slice(&[0x1F, 0x03, 0x00]); // 800 - 1
        webp.extend_from_slice(&[0x57, 0x02, 0x00]); // 600 - 1

        let size = decode_dimensions(&webp, ImageFormat::WebP).unwrap();
        assert_eq!(size, Size::new(800.0, 600.0));
    }

    #[test]
    fn test_decode_tiff_dimensions() {
        let mut tiff = b"II\x2A\x00".to_vec();
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        // ImageWidth, SHORT, count 1, value 300
        tiff.extend_from_slice(&256u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&[0x2C, 0x01, 0x00, 0x00]);
        // ImageLength, LONG, count 1, value 150
        tiff.extend_from_slice(&257u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&150u32.to_le_bytes());

        let size = decode_dimensions(&tiff, ImageFormat::Tiff).unwrap();
        assert_eq!(size, Size::new(300.0, 150.0));
    }

    #[test]
    fn test_zero_and_oversized_dimensions() {
        assert!(matches!(probe(&png_bytes(0, 10)), Err(ImageError::InvalidDimensions)));
        assert!(matches!(
            probe(&png_bytes(MAX_DIMENSION + 1, 10)),
            Err(ImageError::DimensionsExceeded)
        ));
    }

    #[test]
    fn test_unknown_format_is_format_error() {
        let err = probe(b"not an image at all").unwrap_err();
        assert!(matches!(err, ImageError::UnknownFormat));
        assert!(err.is_format_error());
        assert!(!ImageError::NotBound.is_format_error());
    }

    #[test]
    fn test_size_emu_conversion() {
        let size = Size::new(200.0, 100.0);
        assert_eq!(size.to_emu(), (1_905_000, 952_500));
        assert_eq!(Size::from_emu(1_905_000, 952_500), size);
        assert!(size.is_valid());
        assert!(!Size::new(0.0, 1.0).is_valid());
    }
}
