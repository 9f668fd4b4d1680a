//! Unit conversion between screen pixels and EMUs.
//!
//! EMU (English Metric Unit) is the fixed length unit of DrawingML:
//! 914400 EMUs per inch, independent of device resolution. Pixels are
//! always interpreted at 96 DPI, giving 9525 EMUs per pixel.

/// EMU (English Metric Unit) conversion constants
/// 1 inch = 914400 EMUs
/// 1 point = 12700 EMUs
pub const EMU_PER_INCH: f64 = 914400.0;
pub const EMU_PER_POINT: f64 = 12700.0;
pub const PIXELS_PER_INCH: f64 = 96.0;
pub const EMU_PER_PIXEL: i64 = 9525;

/// Stored rotation units per degree of `a:xfrm/@rot`.
pub const ROTATION_UNITS_PER_DEGREE: i32 = 10000;

/// Convert pixels to EMUs, truncating toward zero.
pub fn pixels_to_emu(px: f64) -> i64 {
    (px * EMU_PER_INCH / PIXELS_PER_INCH) as i64
}

/// Convert EMUs to pixels.
pub fn emu_to_pixels(emu: i64) -> f64 {
    emu as f64 * PIXELS_PER_INCH / EMU_PER_INCH
}

/// Convert points to EMUs, truncating toward zero.
pub fn points_to_emu(pt: f64) -> i64 {
    (pt * EMU_PER_POINT) as i64
}

/// Convert EMUs to points.
pub fn emu_to_points(emu: i64) -> f64 {
    emu as f64 / EMU_PER_POINT
}

/// Convert whole degrees to the stored rotation value.
///
/// Returns `None` when the stored value would not fit in an `i32`.
pub fn degrees_to_rotation(degrees: i32) -> Option<i32> {
    degrees.checked_mul(ROTATION_UNITS_PER_DEGREE)
}

/// Convert a stored rotation value back to whole degrees.
///
/// Integer division, so any fractional remainder is truncated toward zero.
pub fn rotation_to_degrees(raw: i32) -> i32 {
    raw / ROTATION_UNITS_PER_DEGREE
}
