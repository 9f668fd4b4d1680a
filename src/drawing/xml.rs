//! `<w:drawing>` markup writer and reader

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    Anchor, BlackWhiteMode, Blip, BlipCompression, DocProperties, Drawing, EffectExtent, Extent,
    Inline, Offset, Picture, Placement, ShapeProperties, ShapeType, TextDistances, Transform2D,
};
use crate::ooxml::markup::{attribute, escape_xml_attr, find_element, find_start_tag};

const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PICTURE_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

static DRAWING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:drawing\b[^>]*>.*?</w:drawing>").expect("valid drawing pattern")
});

// ============================================================================
// Writer
// ============================================================================

impl Drawing {
    /// Serialize to a `<w:drawing>` element
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<w:drawing>");
        match &self.placement {
            Placement::Inline(inline) => write_inline(&mut xml, inline),
            Placement::Anchor(anchor) => write_anchor(&mut xml, anchor),
        }
        xml.push_str("</w:drawing>");
        xml
    }
}

fn write_inline(xml: &mut String, inline: &Inline) {
    xml.push_str("<wp:inline");
    write_distances(xml, &inline.distances);
    if let Some(edit_id) = &inline.edit_id {
        xml.push_str(&format!(r#" wp14:editId="{}""#, escape_xml_attr(edit_id)));
    }
    xml.push('>');

    write_extent(xml, "wp:extent", &inline.extent);
    write_effect_extent(xml, &inline.effect_extent);
    write_doc_properties(xml, "wp:docPr", &inline.doc_properties);
    write_frame_properties(xml, inline.no_change_aspect);
    write_graphic(xml, inline.picture.as_ref());

    xml.push_str("</wp:inline>");
}

fn write_anchor(xml: &mut String, anchor: &Anchor) {
    xml.push_str("<wp:anchor");
    write_distances(xml, &anchor.distances);
    xml.push_str(&format!(
        r#" simplePos="0" relativeHeight="{}" behindDoc="{}" locked="{}" layoutInCell="{}" allowOverlap="{}""#,
        anchor.relative_height,
        flag(anchor.behind_doc),
        flag(anchor.locked),
        flag(anchor.layout_in_cell),
        flag(anchor.allow_overlap)
    ));
    if let Some(edit_id) = &anchor.edit_id {
        xml.push_str(&format!(r#" wp14:editId="{}""#, escape_xml_attr(edit_id)));
    }
    xml.push('>');

    xml.push_str(r#"<wp:simplePos x="0" y="0"/>"#);
    xml.push_str(&format!(
        r#"<wp:positionH relativeFrom="column"><wp:posOffset>{}</wp:posOffset></wp:positionH>"#,
        anchor.position_h
    ));
    xml.push_str(&format!(
        r#"<wp:positionV relativeFrom="paragraph"><wp:posOffset>{}</wp:posOffset></wp:positionV>"#,
        anchor.position_v
    ));
    write_extent(xml, "wp:extent", &anchor.extent);
    write_effect_extent(xml, &anchor.effect_extent);
    xml.push_str("<wp:wrapNone/>");
    write_doc_properties(xml, "wp:docPr", &anchor.doc_properties);
    write_frame_properties(xml, anchor.no_change_aspect);
    write_graphic(xml, anchor.picture.as_ref());

    xml.push_str("</wp:anchor>");
}

fn write_distances(xml: &mut String, distances: &TextDistances) {
    xml.push_str(&format!(
        r#" distT="{}" distB="{}" distL="{}" distR="{}""#,
        distances.top, distances.bottom, distances.left, distances.right
    ));
}

fn write_extent(xml: &mut String, tag: &str, extent: &Extent) {
    xml.push_str(&format!(r#"<{} cx="{}" cy="{}"/>"#, tag, extent.cx, extent.cy));
}

fn write_effect_extent(xml: &mut String, effect: &EffectExtent) {
    xml.push_str(&format!(
        r#"<wp:effectExtent l="{}" t="{}" r="{}" b="{}"/>"#,
        effect.left, effect.top, effect.right, effect.bottom
    ));
}

fn write_doc_properties(xml: &mut String, tag: &str, properties: &DocProperties) {
    xml.push_str(&format!(
        r#"<{} id="{}" name="{}""#,
        tag,
        properties.id,
        escape_xml_attr(&properties.name)
    ));
    if let Some(description) = &properties.description {
        xml.push_str(&format!(r#" descr="{}""#, escape_xml_attr(description)));
    }
    xml.push_str("/>");
}

fn write_frame_properties(xml: &mut String, no_change_aspect: bool) {
    xml.push_str("<wp:cNvGraphicFramePr>");
    xml.push_str(&format!(r#"<a:graphicFrameLocks xmlns:a="{}""#, DRAWINGML_NS));
    if no_change_aspect {
        xml.push_str(r#" noChangeAspect="1""#);
    }
    xml.push_str("/></wp:cNvGraphicFramePr>");
}

fn write_graphic(xml: &mut String, picture: Option<&Picture>) {
    xml.push_str(&format!(r#"<a:graphic xmlns:a="{}">"#, DRAWINGML_NS));
    xml.push_str(&format!(r#"<a:graphicData uri="{}">"#, PICTURE_NS));
    if let Some(picture) = picture {
        write_picture(xml, picture);
    }
    xml.push_str("</a:graphicData></a:graphic>");
}

fn write_picture(xml: &mut String, picture: &Picture) {
    xml.push_str(&format!(r#"<pic:pic xmlns:pic="{}">"#, PICTURE_NS));

    xml.push_str("<pic:nvPicPr>");
    write_doc_properties(xml, "pic:cNvPr", &picture.non_visual);
    xml.push_str("<pic:cNvPicPr/></pic:nvPicPr>");

    xml.push_str("<pic:blipFill>");
    if let Some(blip) = &picture.blip {
        xml.push_str(&format!(r#"<a:blip r:embed="{}""#, escape_xml_attr(&blip.embed)));
        if let Some(compression) = blip.compression {
            xml.push_str(&format!(r#" cstate="{}""#, compression.as_str()));
        }
        xml.push_str("/>");
    }
    xml.push_str("<a:stretch><a:fillRect/></a:stretch></pic:blipFill>");

    let shape = &picture.shape_properties;
    xml.push_str("<pic:spPr");
    if let Some(mode) = shape.black_white_mode {
        xml.push_str(&format!(r#" bwMode="{}""#, mode.as_str()));
    }
    xml.push('>');
    if let Some(transform) = &shape.transform {
        write_transform(xml, transform);
    }
    if let Some(geometry) = &shape.preset_geometry {
        xml.push_str(&format!(
            r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom>"#,
            escape_xml_attr(geometry.as_str())
        ));
    }
    xml.push_str("</pic:spPr>");

    xml.push_str("</pic:pic>");
}

fn write_transform(xml: &mut String, transform: &Transform2D) {
    xml.push_str("<a:xfrm");
    if let Some(rotation) = transform.rotation {
        xml.push_str(&format!(r#" rot="{}""#, rotation));
    }
    if let Some(flip) = transform.horizontal_flip {
        xml.push_str(&format!(r#" flipH="{}""#, flag(flip)));
    }
    if let Some(flip) = transform.vertical_flip {
        xml.push_str(&format!(r#" flipV="{}""#, flag(flip)));
    }
    xml.push('>');
    xml.push_str(&format!(
        r#"<a:off x="{}" y="{}"/>"#,
        transform.offset.x, transform.offset.y
    ));
    write_extent(xml, "a:ext", &transform.extents);
    xml.push_str("</a:xfrm>");
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

// ============================================================================
// Reader
// ============================================================================

/// Parse the first `wp:inline` or `wp:anchor` found in `xml`.
///
/// Returns `None` when neither placement (or its `wp:extent`) is present.
/// A missing picture, blip or transform is kept as `None` in the model.
pub fn parse_drawing(xml: &str) -> Option<Drawing> {
    if let Some(start) = find_start_tag(xml, "wp:inline") {
        let body = find_element(xml, "wp:inline")?;
        let inline = Inline {
            distances: parse_distances(start),
            extent: parse_extent(find_start_tag(body, "wp:extent")?),
            effect_extent: parse_effect_extent(body),
            doc_properties: parse_doc_properties(find_start_tag(body, "wp:docPr")),
            no_change_aspect: parse_no_change_aspect(body),
            edit_id: attribute(start, "wp14:editId"),
            picture: find_element(body, "pic:pic").map(parse_picture),
        };
        return Some(Drawing { placement: Placement::Inline(inline) });
    }

    let start = find_start_tag(xml, "wp:anchor")?;
    let body = find_element(xml, "wp:anchor")?;
    let anchor = Anchor {
        distances: parse_distances(start),
        relative_height: number(start, "relativeHeight").unwrap_or(0),
        behind_doc: boolean(start, "behindDoc").unwrap_or(false),
        locked: boolean(start, "locked").unwrap_or(false),
        layout_in_cell: boolean(start, "layoutInCell").unwrap_or(false),
        allow_overlap: boolean(start, "allowOverlap").unwrap_or(false),
        position_h: parse_position_offset(body, "wp:positionH"),
        position_v: parse_position_offset(body, "wp:positionV"),
        extent: parse_extent(find_start_tag(body, "wp:extent")?),
        effect_extent: parse_effect_extent(body),
        doc_properties: parse_doc_properties(find_start_tag(body, "wp:docPr")),
        no_change_aspect: parse_no_change_aspect(body),
        edit_id: attribute(start, "wp14:editId"),
        picture: find_element(body, "pic:pic").map(parse_picture),
    };
    Some(Drawing { placement: Placement::Anchor(anchor) })
}

/// Parse every `<w:drawing>` in `xml`, in document order, skipping unreadable ones.
pub fn scan_drawings(xml: &str) -> Vec<Drawing> {
    DRAWING_PATTERN
        .find_iter(xml)
        .filter_map(|m| {
            let drawing = parse_drawing(m.as_str());
            if drawing.is_none() {
                warn!("Skipping drawing without a readable placement");
            }
            drawing
        })
        .collect()
}

fn parse_picture(pic: &str) -> Picture {
    let blip = find_start_tag(pic, "a:blip").and_then(|tag| {
        Some(Blip {
            embed: attribute(tag, "r:embed")?,
            compression: attribute(tag, "cstate").and_then(|s| BlipCompression::from_string(&s)),
        })
    });

    let shape_properties = match find_start_tag(pic, "pic:spPr") {
        Some(start) => {
            let body = find_element(pic, "pic:spPr").unwrap_or("");
            ShapeProperties {
                transform: parse_transform(body),
                preset_geometry: find_start_tag(body, "a:prstGeom")
                    .and_then(|tag| attribute(tag, "prst"))
                    .map(|prst| ShapeType::from_string(&prst)),
                black_white_mode: attribute(start, "bwMode")
                    .and_then(|mode| BlackWhiteMode::from_string(&mode)),
            }
        }
        None => ShapeProperties::default(),
    };

    Picture {
        non_visual: parse_doc_properties(find_start_tag(pic, "pic:cNvPr")),
        blip,
        shape_properties,
    }
}

fn parse_transform(sp_pr: &str) -> Option<Transform2D> {
    let start = find_start_tag(sp_pr, "a:xfrm")?;
    let body = find_element(sp_pr, "a:xfrm").unwrap_or("");

    let offset = find_start_tag(body, "a:off")
        .map(|tag| Offset {
            x: number(tag, "x").unwrap_or(0),
            y: number(tag, "y").unwrap_or(0),
        })
        .unwrap_or_default();

    Some(Transform2D {
        offset,
        extents: find_start_tag(body, "a:ext").map(parse_extent).unwrap_or_default(),
        rotation: number(start, "rot"),
        horizontal_flip: boolean(start, "flipH"),
        vertical_flip: boolean(start, "flipV"),
    })
}

fn parse_distances(tag: &str) -> TextDistances {
    TextDistances {
        top: number(tag, "distT").unwrap_or(0),
        bottom: number(tag, "distB").unwrap_or(0),
        left: number(tag, "distL").unwrap_or(0),
        right: number(tag, "distR").unwrap_or(0),
    }
}

fn parse_extent(tag: &str) -> Extent {
    Extent {
        cx: number(tag, "cx").unwrap_or(0),
        cy: number(tag, "cy").unwrap_or(0),
    }
}

fn parse_effect_extent(body: &str) -> EffectExtent {
    find_start_tag(body, "wp:effectExtent")
        .map(|tag| EffectExtent {
            left: number(tag, "l").unwrap_or(0),
            top: number(tag, "t").unwrap_or(0),
            right: number(tag, "r").unwrap_or(0),
            bottom: number(tag, "b").unwrap_or(0),
        })
        .unwrap_or_default()
}

fn parse_doc_properties(tag: Option<&str>) -> DocProperties {
    tag.map(|tag| DocProperties {
        id: number(tag, "id").unwrap_or(0),
        name: attribute(tag, "name").unwrap_or_default(),
        description: attribute(tag, "descr"),
    })
    .unwrap_or_default()
}

fn parse_no_change_aspect(body: &str) -> bool {
    find_start_tag(body, "a:graphicFrameLocks")
        .and_then(|tag| boolean(tag, "noChangeAspect"))
        .unwrap_or(false)
}

fn parse_position_offset(body: &str, tag: &str) -> i64 {
    find_element(body, tag)
        .and_then(|position| find_element(position, "wp:posOffset"))
        .and_then(|offset| offset.trim().parse().ok())
        .unwrap_or(0)
}

fn number<T: std::str::FromStr>(tag: &str, name: &str) -> Option<T> {
    attribute(tag, name)?.trim().parse().ok()
}

fn boolean(tag: &str, name: &str) -> Option<bool> {
    match attribute(tag, name)?.as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::WrapImageText;

    fn sample_drawing() -> Drawing {
        let extent = Extent { cx: 1905000, cy: 952500 };
        let mut drawing = Drawing::inline(
            extent,
            DocProperties {
                id: 3,
                name: "a & b".to_string(),
                description: Some("alt \"text\"".to_string()),
            },
            Picture::new("a & b.png", "rId7", BlipCompression::Print, ShapeType::Rectangle, extent),
        );
        if let Placement::Inline(inline) = &mut drawing.placement {
            inline.edit_id = Some("50D07946".to_string());
        }
        drawing
    }

    #[test]
    fn test_inline_markup() {
        let xml = sample_drawing().to_xml();
        assert!(xml.starts_with("<w:drawing><wp:inline"));
        assert!(xml.contains(r#"<wp:extent cx="1905000" cy="952500"/>"#));
        assert!(xml.contains(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#));
        assert!(xml.contains(r#"<wp:docPr id="3" name="a &amp; b" descr="alt &quot;text&quot;"/>"#));
        assert!(xml.contains(r#"<pic:cNvPr id="0" name="a &amp; b.png"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId7" cstate="print"/>"#));
        assert!(xml.contains(r#"<a:xfrm><a:off x="0" y="0"/><a:ext cx="1905000" cy="952500"/></a:xfrm>"#));
        assert!(xml.contains(r#"<a:prstGeom prst="rect">"#));
        assert!(xml.contains(r#"noChangeAspect="1""#));
        assert!(xml.ends_with("</wp:inline></w:drawing>"));
    }

    #[test]
    fn test_inline_markup_round_trip() {
        let mut drawing = sample_drawing();
        drawing.set_rotation(Some(-45)).unwrap();
        drawing.set_vertical_flip(true).unwrap();
        drawing.set_black_white_mode(Some(BlackWhiteMode::Gray)).unwrap();

        let xml = drawing.to_xml();
        assert!(xml.contains(r#"<a:xfrm rot="-450000" flipV="1">"#));
        assert!(xml.contains(r#"<pic:spPr bwMode="gray">"#));

        let parsed = parse_drawing(&xml).unwrap();
        assert_eq!(parsed, drawing);
        assert_eq!(parsed.rotation(), Some(-45));
        assert_eq!(parsed.description(), Some("alt \"text\""));
    }

    #[test]
    fn test_character_references_in_description() {
        let xml = sample_drawing()
            .to_xml()
            .replace(r#"descr="alt &quot;text&quot;""#, r#"descr="line1&#xA;line2 &#39;q&#39;""#);

        let parsed = parse_drawing(&xml).unwrap();
        assert_eq!(parsed.description(), Some("line1\nline2 'q'"));

        let written = parsed.to_xml();
        assert!(!written.contains("&amp;#"));
        assert!(written.contains(r#"descr="line1&#xA;line2 &apos;q&apos;""#));
        assert_eq!(parse_drawing(&written).unwrap(), parsed);
    }

    #[test]
    fn test_parse_anchor() {
        let xml = r#"<w:drawing><wp:anchor distT="0" distB="0" distL="114300" distR="114300" simplePos="0" relativeHeight="251658240" behindDoc="1" locked="0" layoutInCell="1" allowOverlap="1">
            <wp:simplePos x="0" y="0"/>
            <wp:positionH relativeFrom="column"><wp:posOffset>12700</wp:posOffset></wp:positionH>
            <wp:positionV relativeFrom="paragraph"><wp:posOffset>-25400</wp:posOffset></wp:positionV>
            <wp:extent cx="952500" cy="476250"/>
            <wp:effectExtent l="0" t="0" r="0" b="0"/>
            <wp:wrapNone/>
            <wp:docPr id="5" name="Picture 5"/>
            <wp:cNvGraphicFramePr/>
            <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">
            <pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="logo.jpg"/><pic:cNvPicPr/></pic:nvPicPr>
            <pic:blipFill><a:blip r:embed="rId9"><a:extLst><a:ext uri="{28A0092B-C50C-407E-A947-70E740481C1C}"/></a:extLst></a:blip><a:stretch><a:fillRect/></a:stretch></pic:blipFill>
            <pic:spPr><a:xfrm flipH="1"><a:off x="0" y="0"/><a:ext cx="952500" cy="476250"/></a:xfrm><a:prstGeom prst="ellipse"><a:avLst/></a:prstGeom></pic:spPr>
            </pic:pic></a:graphicData></a:graphic></wp:anchor></w:drawing>"#;

        let drawing = parse_drawing(xml).unwrap();
        let Placement::Anchor(anchor) = &drawing.placement else {
            panic!("expected anchor");
        };
        assert!(anchor.behind_doc);
        assert!(anchor.allow_overlap);
        assert_eq!(anchor.relative_height, 251658240);
        assert_eq!(anchor.distances.left, 114300);
        assert_eq!(anchor.position_h, 12700);
        assert_eq!(anchor.position_v, -25400);

        assert_eq!(drawing.placement_kind(), WrapImageText::BehindText);
        assert_eq!(drawing.width(), 100.0);
        assert_eq!(drawing.height(), 50.0);
        assert_eq!(drawing.relationship_id(), Some("rId9"));
        assert_eq!(drawing.compression_quality(), None);
        assert_eq!(drawing.file_name(), Some("logo.jpg"));
        assert_eq!(drawing.shape(), Some(&ShapeType::Ellipse));
        assert_eq!(drawing.horizontal_flip(), Some(true));
        assert_eq!(drawing.vertical_flip(), None);

        let reparsed = parse_drawing(&drawing.to_xml()).unwrap();
        assert_eq!(reparsed, drawing);
    }

    #[test]
    fn test_parse_keeps_missing_structure() {
        let xml = r#"<w:drawing><wp:inline><wp:extent cx="9525" cy="19050"/><wp:docPr id="1" name="x"/>
            <a:graphic><a:graphicData><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="x.png"/></pic:nvPicPr>
            <pic:blipFill><a:blip r:embed="rId2"/></pic:blipFill><pic:spPr/></pic:pic></a:graphicData></a:graphic>
            </wp:inline></w:drawing>"#;

        let mut drawing = parse_drawing(xml).unwrap();
        assert_eq!(drawing.width(), 1.0);
        assert_eq!(drawing.height(), 2.0);
        assert_eq!(drawing.relationship_id(), Some("rId2"));
        assert_eq!(drawing.shape(), None);
        assert_eq!(drawing.rotation(), None);
        assert!(drawing.set_width(5.0).is_err());
        assert_eq!(drawing.width(), 1.0);
    }

    #[test]
    fn test_parse_without_placement() {
        assert!(parse_drawing("<w:drawing></w:drawing>").is_none());
        let xml = r#"<w:drawing><wp:inline><wp:docPr id="1" name="x"/></wp:inline></w:drawing>"#;
        assert!(parse_drawing(xml).is_none());
    }

    #[test]
    fn test_scan_drawings() {
        let first = sample_drawing();
        let mut second = sample_drawing();
        second.set_file_name("second.png").unwrap();

        let xml = format!(
            "<w:p><w:r>{}</w:r><w:r><w:t>between</w:t></w:r><w:r>{}</w:r><w:r><w:drawing></w:drawing></w:r></w:p>",
            first.to_xml(),
            second.to_xml()
        );
        let drawings = scan_drawings(&xml);
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[0].file_name(), Some("a & b.png"));
        assert_eq!(drawings[1].file_name(), Some("second.png"));
    }
}
