//! DrawingML picture model
//!
//! A [`Drawing`] is the `<w:drawing>` subtree of a run. Its [`Placement`] is
//! either inline with the text flow or anchored (floating behind or in front
//! of the text). The drawing stored in the body tree is the only copy of the
//! picture's geometry; every accessor here reads and writes it directly.

mod xml;

pub use xml::{parse_drawing, scan_drawings};

use serde::{Deserialize, Serialize};

use crate::image::ImageError;
use crate::units::{degrees_to_rotation, emu_to_pixels, pixels_to_emu, rotation_to_degrees};

// ============================================================================
// Enumerations
// ============================================================================

/// Preset outline geometry (`a:prstGeom/@prst`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeType {
    #[default]
    Rectangle,
    RoundRectangle,
    Ellipse,
    Triangle,
    RightTriangle,
    Diamond,
    Parallelogram,
    Trapezoid,
    Pentagon,
    Hexagon,
    Octagon,
    Star5,
    Heart,
    Cloud,
    /// Any other preset, kept verbatim
    Other(String),
}

impl ShapeType {
    pub fn from_string(s: &str) -> Self {
        match s {
            "rect" => ShapeType::Rectangle,
            "roundRect" => ShapeType::RoundRectangle,
            "ellipse" => ShapeType::Ellipse,
            "triangle" => ShapeType::Triangle,
            "rtTriangle" => ShapeType::RightTriangle,
            "diamond" => ShapeType::Diamond,
            "parallelogram" => ShapeType::Parallelogram,
            "trapezoid" => ShapeType::Trapezoid,
            "pentagon" => ShapeType::Pentagon,
            "hexagon" => ShapeType::Hexagon,
            "octagon" => ShapeType::Octagon,
            "star5" => ShapeType::Star5,
            "heart" => ShapeType::Heart,
            "cloud" => ShapeType::Cloud,
            other => ShapeType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShapeType::Rectangle => "rect",
            ShapeType::RoundRectangle => "roundRect",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Triangle => "triangle",
            ShapeType::RightTriangle => "rtTriangle",
            ShapeType::Diamond => "diamond",
            ShapeType::Parallelogram => "parallelogram",
            ShapeType::Trapezoid => "trapezoid",
            ShapeType::Pentagon => "pentagon",
            ShapeType::Hexagon => "hexagon",
            ShapeType::Octagon => "octagon",
            ShapeType::Star5 => "star5",
            ShapeType::Heart => "heart",
            ShapeType::Cloud => "cloud",
            ShapeType::Other(prst) => prst,
        }
    }
}

/// Compression state hint of a blip (`a:blip/@cstate`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlipCompression {
    Email,
    Screen,
    #[default]
    Print,
    HighQualityPrint,
    None,
}

impl BlipCompression {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "email" => Some(BlipCompression::Email),
            "screen" => Some(BlipCompression::Screen),
            "print" => Some(BlipCompression::Print),
            "hqprint" => Some(BlipCompression::HighQualityPrint),
            "none" => Some(BlipCompression::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlipCompression::Email => "email",
            BlipCompression::Screen => "screen",
            BlipCompression::Print => "print",
            BlipCompression::HighQualityPrint => "hqprint",
            BlipCompression::None => "none",
        }
    }
}

/// Black and white rendering mode (`pic:spPr/@bwMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlackWhiteMode {
    Clear,
    Auto,
    Gray,
    LightGray,
    InverseGray,
    GrayWhite,
    BlackGray,
    BlackWhite,
    Black,
    White,
    Hidden,
}

impl BlackWhiteMode {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "clr" => Some(BlackWhiteMode::Clear),
            "auto" => Some(BlackWhiteMode::Auto),
            "gray" => Some(BlackWhiteMode::Gray),
            "ltGray" => Some(BlackWhiteMode::LightGray),
            "invGray" => Some(BlackWhiteMode::InverseGray),
            "grayWhite" => Some(BlackWhiteMode::GrayWhite),
            "blackGray" => Some(BlackWhiteMode::BlackGray),
            "blackWhite" => Some(BlackWhiteMode::BlackWhite),
            "black" => Some(BlackWhiteMode::Black),
            "white" => Some(BlackWhiteMode::White),
            "hidden" => Some(BlackWhiteMode::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlackWhiteMode::Clear => "clr",
            BlackWhiteMode::Auto => "auto",
            BlackWhiteMode::Gray => "gray",
            BlackWhiteMode::LightGray => "ltGray",
            BlackWhiteMode::InverseGray => "invGray",
            BlackWhiteMode::GrayWhite => "grayWhite",
            BlackWhiteMode::BlackGray => "blackGray",
            BlackWhiteMode::BlackWhite => "blackWhite",
            BlackWhiteMode::Black => "black",
            BlackWhiteMode::White => "white",
            BlackWhiteMode::Hidden => "hidden",
        }
    }
}

/// How a picture relates to the surrounding text flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapImageText {
    /// `wp:inline`
    InLineWithText,
    /// `wp:anchor` with `behindDoc="1"`
    BehindText,
    /// `wp:anchor` with `behindDoc="0"`
    InFrontText,
}

// ============================================================================
// Geometry
// ============================================================================

/// Width and height in EMUs (`wp:extent`, `a:ext`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub cx: i64,
    pub cy: i64,
}

/// Extra space added to each edge for effects (`wp:effectExtent`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectExtent {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// Offset of the transform (`a:off`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

/// 2D transform of the picture shape (`a:xfrm`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform2D {
    pub offset: Offset,
    /// Render box, kept equal to the outer [`Extent`]
    pub extents: Extent,
    /// Rotation, degrees x 10000 (`@rot`)
    pub rotation: Option<i32>,
    pub horizontal_flip: Option<bool>,
    pub vertical_flip: Option<bool>,
}

/// Distance between the drawing and the surrounding text, in EMUs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDistances {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

// ============================================================================
// Non-visual properties and picture payload
// ============================================================================

/// Non-visual drawing properties (`wp:docPr`, `pic:cNvPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocProperties {
    pub id: u32,
    pub name: String,
    /// Alternative text (`@descr`)
    pub description: Option<String>,
}

/// Reference to the binary image part (`a:blip`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blip {
    /// Relationship id of the image part (`@r:embed`)
    pub embed: String,
    pub compression: Option<BlipCompression>,
}

/// Shape properties of the picture (`pic:spPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeProperties {
    pub transform: Option<Transform2D>,
    pub preset_geometry: Option<ShapeType>,
    pub black_white_mode: Option<BlackWhiteMode>,
}

/// Picture payload (`pic:pic`), shared by both placements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub non_visual: DocProperties,
    pub blip: Option<Blip>,
    pub shape_properties: ShapeProperties,
}

impl Picture {
    /// Picture filling an `extent` box with the image related by `embed`.
    pub fn new(
        name: &str,
        embed: &str,
        compression: BlipCompression,
        shape: ShapeType,
        extent: Extent,
    ) -> Self {
        Picture {
            non_visual: DocProperties {
                id: 0,
                name: name.to_string(),
                description: None,
            },
            blip: Some(Blip {
                embed: embed.to_string(),
                compression: Some(compression),
            }),
            shape_properties: ShapeProperties {
                transform: Some(Transform2D {
                    offset: Offset::default(),
                    extents: extent,
                    ..Default::default()
                }),
                preset_geometry: Some(shape),
                black_white_mode: None,
            },
        }
    }
}

// ============================================================================
// Placement
// ============================================================================

/// Picture flowing with the text (`wp:inline`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inline {
    pub distances: TextDistances,
    pub extent: Extent,
    pub effect_extent: EffectExtent,
    pub doc_properties: DocProperties,
    /// `a:graphicFrameLocks/@noChangeAspect`
    pub no_change_aspect: bool,
    /// `@wp14:editId`
    pub edit_id: Option<String>,
    pub picture: Option<Picture>,
}

/// Floating picture anchored to a paragraph (`wp:anchor`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub distances: TextDistances,
    /// Z-order among floating objects
    pub relative_height: u32,
    pub behind_doc: bool,
    pub locked: bool,
    pub layout_in_cell: bool,
    pub allow_overlap: bool,
    /// Horizontal offset from the column, in EMUs
    pub position_h: i64,
    /// Vertical offset from the paragraph, in EMUs
    pub position_v: i64,
    pub extent: Extent,
    pub effect_extent: EffectExtent,
    pub doc_properties: DocProperties,
    pub no_change_aspect: bool,
    pub edit_id: Option<String>,
    pub picture: Option<Picture>,
}

/// Exactly one placement per drawing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Inline(Inline),
    Anchor(Anchor),
}

/// A `<w:drawing>` holding a single picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawing {
    pub placement: Placement,
}

impl Drawing {
    /// New inline drawing whose picture transform matches the outer extent.
    pub fn inline(extent: Extent, doc_properties: DocProperties, picture: Picture) -> Self {
        Drawing {
            placement: Placement::Inline(Inline {
                distances: TextDistances::default(),
                extent,
                effect_extent: EffectExtent::default(),
                doc_properties,
                no_change_aspect: true,
                edit_id: None,
                picture: Some(picture),
            }),
        }
    }

    // ========================================================================
    // Placement dispatch
    // ========================================================================

    fn extent(&self) -> &Extent {
        match &self.placement {
            Placement::Inline(inline) => &inline.extent,
            Placement::Anchor(anchor) => &anchor.extent,
        }
    }

    /// Outer non-visual properties (`wp:docPr`)
    pub fn doc_properties(&self) -> &DocProperties {
        match &self.placement {
            Placement::Inline(inline) => &inline.doc_properties,
            Placement::Anchor(anchor) => &anchor.doc_properties,
        }
    }

    fn doc_properties_mut(&mut self) -> &mut DocProperties {
        match &mut self.placement {
            Placement::Inline(inline) => &mut inline.doc_properties,
            Placement::Anchor(anchor) => &mut anchor.doc_properties,
        }
    }

    pub fn picture(&self) -> Option<&Picture> {
        match &self.placement {
            Placement::Inline(inline) => inline.picture.as_ref(),
            Placement::Anchor(anchor) => anchor.picture.as_ref(),
        }
    }

    fn picture_mut(&mut self) -> Result<&mut Picture, ImageError> {
        let picture = match &mut self.placement {
            Placement::Inline(inline) => inline.picture.as_mut(),
            Placement::Anchor(anchor) => anchor.picture.as_mut(),
        };
        picture.ok_or(ImageError::MissingElement("pic:pic"))
    }

    fn transform(&self) -> Option<&Transform2D> {
        self.picture()?.shape_properties.transform.as_ref()
    }

    fn transform_mut(&mut self) -> Result<&mut Transform2D, ImageError> {
        self.picture_mut()?
            .shape_properties
            .transform
            .as_mut()
            .ok_or(ImageError::MissingElement("a:xfrm"))
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Width in pixels
    pub fn width(&self) -> f64 {
        emu_to_pixels(self.extent().cx)
    }

    /// Height in pixels
    pub fn height(&self) -> f64 {
        emu_to_pixels(self.extent().cy)
    }

    pub fn emu_width(&self) -> i64 {
        self.extent().cx
    }

    pub fn emu_height(&self) -> i64 {
        self.extent().cy
    }

    pub fn set_width(&mut self, px: f64) -> Result<(), ImageError> {
        self.resize(Some(pixels_to_emu(px)), None)
    }

    pub fn set_height(&mut self, px: f64) -> Result<(), ImageError> {
        self.resize(None, Some(pixels_to_emu(px)))
    }

    /// Resize in EMUs, writing the outer extent and the transform extents together.
    ///
    /// `None` leaves that axis untouched. Nothing is written when the
    /// transform is missing.
    pub fn resize(&mut self, cx: Option<i64>, cy: Option<i64>) -> Result<(), ImageError> {
        let transform = self.transform_mut()?;
        if let Some(cx) = cx {
            transform.extents.cx = cx;
        }
        if let Some(cy) = cy {
            transform.extents.cy = cy;
        }

        let extent = match &mut self.placement {
            Placement::Inline(inline) => &mut inline.extent,
            Placement::Anchor(anchor) => &mut anchor.extent,
        };
        if let Some(cx) = cx {
            extent.cx = cx;
        }
        if let Some(cy) = cy {
            extent.cy = cy;
        }

        log::trace!("Resized drawing to {}x{} EMU", extent.cx, extent.cy);
        Ok(())
    }

    // ========================================================================
    // Identification
    // ========================================================================

    /// Relationship id of the image part
    pub fn relationship_id(&self) -> Option<&str> {
        self.picture()?.blip.as_ref().map(|blip| blip.embed.as_str())
    }

    /// Display name of the picture (`pic:cNvPr/@name`)
    pub fn file_name(&self) -> Option<&str> {
        self.picture().map(|picture| picture.non_visual.name.as_str())
    }

    pub fn set_file_name(&mut self, name: &str) -> Result<(), ImageError> {
        self.picture_mut()?.non_visual.name = name.to_string();
        log::trace!("Set picture name to {}", name);
        Ok(())
    }

    /// Alternative text, stored on `wp:docPr` rather than on the picture
    pub fn description(&self) -> Option<&str> {
        self.doc_properties().description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.doc_properties_mut().description = description.map(str::to_string);
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    pub fn shape(&self) -> Option<&ShapeType> {
        self.picture()?.shape_properties.preset_geometry.as_ref()
    }

    pub fn set_shape(&mut self, shape: ShapeType) -> Result<(), ImageError> {
        log::trace!("Set preset geometry to {}", shape.as_str());
        self.picture_mut()?.shape_properties.preset_geometry = Some(shape);
        Ok(())
    }

    /// Rotation in whole degrees
    pub fn rotation(&self) -> Option<i32> {
        self.transform()?.rotation.map(rotation_to_degrees)
    }

    /// Set the rotation in degrees; `None` removes the attribute.
    pub fn set_rotation(&mut self, degrees: Option<i32>) -> Result<(), ImageError> {
        let rotation = match degrees {
            Some(degrees) => {
                Some(degrees_to_rotation(degrees).ok_or(ImageError::InvalidRotation(degrees))?)
            }
            None => None,
        };
        self.transform_mut()?.rotation = rotation;
        Ok(())
    }

    pub fn horizontal_flip(&self) -> Option<bool> {
        self.transform()?.horizontal_flip
    }

    pub fn set_horizontal_flip(&mut self, flip: bool) -> Result<(), ImageError> {
        self.transform_mut()?.horizontal_flip = Some(flip);
        Ok(())
    }

    pub fn vertical_flip(&self) -> Option<bool> {
        self.transform()?.vertical_flip
    }

    pub fn set_vertical_flip(&mut self, flip: bool) -> Result<(), ImageError> {
        self.transform_mut()?.vertical_flip = Some(flip);
        Ok(())
    }

    pub fn black_white_mode(&self) -> Option<BlackWhiteMode> {
        self.picture()?.shape_properties.black_white_mode
    }

    /// Set the black and white mode. Clearing it is not supported.
    pub fn set_black_white_mode(&mut self, mode: Option<BlackWhiteMode>) -> Result<(), ImageError> {
        let mode = mode.ok_or(ImageError::Unsupported("clearing the black and white mode"))?;
        self.picture_mut()?.shape_properties.black_white_mode = Some(mode);
        Ok(())
    }

    pub fn compression_quality(&self) -> Option<BlipCompression> {
        self.picture()?.blip.as_ref()?.compression
    }

    /// Always fails: the compression state is fixed when the picture is embedded.
    pub fn set_compression_quality(
        &mut self,
        _compression: BlipCompression,
    ) -> Result<(), ImageError> {
        Err(ImageError::Unsupported("changing the compression quality"))
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Which text relation the active placement expresses
    pub fn placement_kind(&self) -> WrapImageText {
        match &self.placement {
            Placement::Inline(_) => WrapImageText::InLineWithText,
            Placement::Anchor(anchor) if anchor.behind_doc => WrapImageText::BehindText,
            Placement::Anchor(_) => WrapImageText::InFrontText,
        }
    }

    /// Always fails: switching between inline and floating layout is not offered.
    pub fn set_wrap_text(&mut self, _wrap: WrapImageText) -> Result<(), ImageError> {
        Err(ImageError::Unsupported("changing the text wrapping"))
    }

    /// JSON snapshot of the drawing model
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_drawing() -> Drawing {
        let extent = Extent { cx: 1905000, cy: 952500 };
        let doc_properties = DocProperties {
            id: 1,
            name: "photo".to_string(),
            description: None,
        };
        let picture =
            Picture::new("photo.png", "rId4", BlipCompression::Print, ShapeType::Rectangle, extent);
        Drawing::inline(extent, doc_properties, picture)
    }

    fn sample_anchor(behind_doc: bool) -> Drawing {
        let extent = Extent { cx: 952500, cy: 952500 };
        Drawing {
            placement: Placement::Anchor(Anchor {
                behind_doc,
                extent,
                doc_properties: DocProperties {
                    id: 2,
                    name: "floating".to_string(),
                    description: None,
                },
                picture: Some(Picture::new(
                    "floating.png",
                    "rId5",
                    BlipCompression::Email,
                    ShapeType::Ellipse,
                    extent,
                )),
                ..Default::default()
            }),
        }
    }

    fn transform_extents(drawing: &Drawing) -> Extent {
        drawing.transform().unwrap().extents
    }

    fn assert_extents_match(drawing: &Drawing) {
        let extents = transform_extents(drawing);
        assert_eq!(drawing.emu_width(), extents.cx);
        assert_eq!(drawing.emu_height(), extents.cy);
    }

    #[test]
    fn test_inline_size_getters() {
        let drawing = sample_drawing();
        assert_eq!(drawing.width(), 200.0);
        assert_eq!(drawing.height(), 100.0);
        assert_eq!(drawing.emu_width(), 1905000);
        assert_eq!(drawing.emu_height(), 952500);
        assert_eq!(drawing.placement_kind(), WrapImageText::InLineWithText);
    }

    #[test]
    fn test_anchor_uses_same_conversion() {
        let drawing = sample_anchor(true);
        assert_eq!(drawing.width(), 100.0);
        assert_eq!(drawing.height(), 100.0);
        assert_eq!(drawing.placement_kind(), WrapImageText::BehindText);
        assert_eq!(sample_anchor(false).placement_kind(), WrapImageText::InFrontText);
        assert_eq!(drawing.file_name(), Some("floating.png"));
        assert_eq!(drawing.shape(), Some(&ShapeType::Ellipse));
    }

    #[test]
    fn test_resize_keeps_extents_in_sync() {
        for mut drawing in [sample_drawing(), sample_anchor(false)] {
            drawing.set_width(320.0).unwrap();
            assert_extents_match(&drawing);
            assert_eq!(drawing.width(), 320.0);

            let height_before = drawing.emu_height();
            drawing.set_height(40.0).unwrap();
            assert_extents_match(&drawing);
            assert_eq!(drawing.height(), 40.0);
            assert_ne!(drawing.emu_height(), height_before);

            drawing.resize(Some(9525), None).unwrap();
            assert_extents_match(&drawing);
            assert_eq!(drawing.emu_width(), 9525);
            assert_eq!(drawing.height(), 40.0);
        }
    }

    #[test]
    fn test_other_mutations_keep_extents_in_sync() {
        let mut drawing = sample_drawing();
        drawing.set_rotation(Some(90)).unwrap();
        assert_extents_match(&drawing);
        drawing.set_horizontal_flip(true).unwrap();
        assert_extents_match(&drawing);
        drawing.set_shape(ShapeType::Heart).unwrap();
        assert_extents_match(&drawing);
        drawing.set_black_white_mode(Some(BlackWhiteMode::Gray)).unwrap();
        assert_extents_match(&drawing);
        drawing.set_file_name("other.png").unwrap();
        assert_extents_match(&drawing);
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut drawing = sample_drawing();
        assert_eq!(drawing.rotation(), None);
        for degrees in -3600..=3600 {
            drawing.set_rotation(Some(degrees)).unwrap();
            assert_eq!(drawing.rotation(), Some(degrees));
        }
        assert_eq!(transform_rotation(&drawing), Some(3600 * 10000));

        drawing.set_rotation(None).unwrap();
        assert_eq!(drawing.rotation(), None);
        assert_eq!(transform_rotation(&drawing), None);
    }

    fn transform_rotation(drawing: &Drawing) -> Option<i32> {
        drawing.transform().unwrap().rotation
    }

    #[test]
    fn test_rotation_out_of_range_is_rejected() {
        let mut drawing = sample_drawing();
        drawing.set_rotation(Some(45)).unwrap();

        for degrees in [300_000, i32::MAX, i32::MIN] {
            let result = drawing.set_rotation(Some(degrees));
            assert!(matches!(result, Err(ImageError::InvalidRotation(d)) if d == degrees));
            assert_eq!(drawing.rotation(), Some(45));
        }
    }

    #[test]
    fn test_flips() {
        let mut drawing = sample_drawing();
        assert_eq!(drawing.vertical_flip(), None);
        drawing.set_vertical_flip(true).unwrap();
        drawing.set_horizontal_flip(false).unwrap();
        assert_eq!(drawing.vertical_flip(), Some(true));
        assert_eq!(drawing.horizontal_flip(), Some(false));
    }

    #[test]
    fn test_description_lives_on_doc_properties() {
        let mut drawing = sample_drawing();
        drawing.set_description(Some("A red square"));
        assert_eq!(drawing.description(), Some("A red square"));
        assert_eq!(drawing.doc_properties().description.as_deref(), Some("A red square"));
        assert_eq!(drawing.picture().unwrap().non_visual.description, None);

        drawing.set_description(None);
        assert_eq!(drawing.description(), None);
    }

    #[test]
    fn test_black_white_mode() {
        let mut drawing = sample_drawing();
        assert_eq!(drawing.black_white_mode(), None);
        drawing.set_black_white_mode(Some(BlackWhiteMode::BlackWhite)).unwrap();
        assert_eq!(drawing.black_white_mode(), Some(BlackWhiteMode::BlackWhite));

        let result = drawing.set_black_white_mode(None);
        assert!(matches!(result, Err(ImageError::Unsupported(_))));
        assert_eq!(drawing.black_white_mode(), Some(BlackWhiteMode::BlackWhite));
    }

    #[test]
    fn test_unsupported_setters() {
        let mut drawing = sample_drawing();
        assert_eq!(drawing.compression_quality(), Some(BlipCompression::Print));
        let result = drawing.set_compression_quality(BlipCompression::Email);
        assert!(matches!(result, Err(ImageError::Unsupported(_))));
        assert_eq!(drawing.compression_quality(), Some(BlipCompression::Print));

        let result = drawing.set_wrap_text(WrapImageText::BehindText);
        assert!(matches!(result, Err(ImageError::Unsupported(_))));
        assert_eq!(drawing.placement_kind(), WrapImageText::InLineWithText);
    }

    #[test]
    fn test_missing_picture_degrades() {
        let mut drawing = sample_drawing();
        if let Placement::Inline(inline) = &mut drawing.placement {
            inline.picture = None;
        }

        assert_eq!(drawing.width(), 200.0);
        assert_eq!(drawing.relationship_id(), None);
        assert_eq!(drawing.file_name(), None);
        assert_eq!(drawing.shape(), None);
        assert_eq!(drawing.rotation(), None);
        assert_eq!(drawing.compression_quality(), None);

        let result = drawing.set_file_name("x.png");
        assert!(matches!(result, Err(ImageError::MissingElement("pic:pic"))));
    }

    #[test]
    fn test_missing_transform_blocks_resize() {
        let mut drawing = sample_drawing();
        if let Placement::Inline(inline) = &mut drawing.placement {
            inline.picture.as_mut().unwrap().shape_properties.transform = None;
        }

        let result = drawing.set_width(10.0);
        assert!(matches!(result, Err(ImageError::MissingElement("a:xfrm"))));
        assert_eq!(drawing.emu_width(), 1905000);
        assert_eq!(drawing.rotation(), None);
        assert_eq!(drawing.horizontal_flip(), None);

        // Shape lives outside the transform
        drawing.set_shape(ShapeType::Ellipse).unwrap();
        assert_eq!(drawing.shape(), Some(&ShapeType::Ellipse));
    }

    #[test]
    fn test_shape_type_strings() {
        assert_eq!(ShapeType::from_string("rect"), ShapeType::Rectangle);
        assert_eq!(
            ShapeType::from_string("flowChartProcess"),
            ShapeType::Other("flowChartProcess".to_string())
        );
        assert_eq!(ShapeType::RoundRectangle.as_str(), "roundRect");
        assert_eq!(
            BlipCompression::from_string("hqprint"),
            Some(BlipCompression::HighQualityPrint)
        );
        assert_eq!(BlackWhiteMode::from_string("ltGray"), Some(BlackWhiteMode::LightGray));
        assert_eq!(BlackWhiteMode::from_string("bogus"), None);
    }

    #[test]
    fn test_to_json() {
        let json = sample_drawing().to_json().unwrap();
        assert!(json.contains("\"Inline\""));
        assert!(json.contains("\"embed\": \"rId4\""));
        let back: Drawing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_drawing());
    }
}
