//! OPC (Open Packaging Conventions) Package
//! Reads, mutates and writes ZIP-based Office Open XML packages (.docx)

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Seek, Write};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use super::error::OoxmlError;
use super::markup::{attribute, escape_xml_attr};
use super::store::ImagePartStore;
use super::types::{ContentType, PackagePart, Relationship, RelationshipType};
use crate::image::ImageFormat;

/// Default name of the main document part
pub const MAIN_DOCUMENT_PART: &str = "/word/document.xml";

/// Folder new image parts are written to
pub const MEDIA_FOLDER: &str = "/word/media";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

static OVERRIDE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Override\b[^>]*>"#).expect("valid override pattern"));
static DEFAULT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Default\b[^>]*>"#).expect("valid default pattern"));
static RELATIONSHIP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Relationship\b[^>]*>"#).expect("valid relationship pattern"));

const EMPTY_DOCUMENT_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:body/></w:document>"#,
);

/// OPC Package
#[derive(Debug, Clone)]
pub struct OpcPackage {
    /// All parts in the package indexed by part name
    pub parts: HashMap<String, PackagePart>,
    /// Content type overrides indexed by part name
    pub content_types: HashMap<String, ContentType>,
    /// Default content types indexed by lower-case extension
    pub default_content_types: HashMap<String, ContentType>,
    /// Root relationships (_rels/.rels)
    pub root_relationships: Vec<Relationship>,
    /// Relationships indexed by source part name
    pub relationships: HashMap<String, Vec<Relationship>>,
    /// Highest `imageN` number handed out by this package
    last_image_index: u32,
    /// Highest `rIdN` number handed out, per source part
    last_relationship_index: HashMap<String, u32>,
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcPackage {
    /// Create a package holding an empty main document
    pub fn new() -> Self {
        let mut package = OpcPackage {
            parts: HashMap::new(),
            content_types: HashMap::new(),
            default_content_types: HashMap::new(),
            root_relationships: Vec::new(),
            relationships: HashMap::new(),
            last_image_index: 0,
            last_relationship_index: HashMap::new(),
        };

        package.default_content_types.insert("rels".to_string(), ContentType::Relationships);
        package.default_content_types.insert("xml".to_string(), ContentType::Xml);
        package.put_part(
            MAIN_DOCUMENT_PART,
            ContentType::MainDocument,
            EMPTY_DOCUMENT_XML.as_bytes().to_vec(),
        );
        package.root_relationships.push(Relationship {
            id: "rId1".to_string(),
            relationship_type: RelationshipType::OfficeDocument,
            target: MAIN_DOCUMENT_PART[1..].to_string(),
            target_mode: None,
        });

        package
    }

    /// Read a package from ZIP file data
    pub fn from_zip(file_data: &[u8]) -> Result<Self, OoxmlError> {
        let reader = Cursor::new(file_data);
        let mut archive = ZipArchive::new(reader)?;

        let mut package = OpcPackage {
            parts: HashMap::new(),
            content_types: HashMap::new(),
            default_content_types: HashMap::new(),
            root_relationships: Vec::new(),
            relationships: HashMap::new(),
            last_image_index: 0,
            last_relationship_index: HashMap::new(),
        };

        // [Content_Types].xml first so parts can be typed as they are read
        let content_types_xml = Self::read_file_from_archive(&mut archive, CONTENT_TYPES_PART)?
            .ok_or_else(|| OoxmlError::PartNotFound(CONTENT_TYPES_PART.to_string()))?;
        package.parse_content_types_xml(&content_types_xml);

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = normalize_part_name(file.name());
            if name == format!("/{}", CONTENT_TYPES_PART) {
                continue;
            }

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            if let Some(source) = relationships_source(&name) {
                let relationships = Self::parse_relationships_xml(&data);
                if source.is_empty() {
                    package.root_relationships = relationships;
                } else {
                    package.relationships.insert(source, relationships);
                }
                continue;
            }

            let content_type = package
                .get_content_type(&name)
                .unwrap_or_else(|| ContentType::Unknown("application/octet-stream".to_string()));
            package.parts.insert(name.clone(), PackagePart { name, content_type, data });
        }

        debug!("Loaded package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Read a whole archive entry, if present
    fn read_file_from_archive<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Option<Vec<u8>>, OoxmlError> {
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Parse the content types XML data
    fn parse_content_types_xml(&mut self, xml_data: &[u8]) {
        let xml_str = String::from_utf8_lossy(xml_data);

        // <Override PartName="/word/document.xml" ContentType="application/vnd...main+xml"/>
        for tag in OVERRIDE_PATTERN.find_iter(&xml_str) {
            let tag = tag.as_str();
            if let (Some(part_name), Some(content_type)) =
                (attribute(tag, "PartName"), attribute(tag, "ContentType"))
            {
                self.content_types.insert(
                    normalize_part_name(&part_name),
                    ContentType::from_string(&content_type),
                );
            }
        }

        // <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
        for tag in DEFAULT_PATTERN.find_iter(&xml_str) {
            let tag = tag.as_str();
            if let (Some(extension), Some(content_type)) =
                (attribute(tag, "Extension"), attribute(tag, "ContentType"))
            {
                self.default_content_types.insert(
                    extension.to_ascii_lowercase(),
                    ContentType::from_string(&content_type),
                );
            }
        }
    }

    /// Parse relationships XML
    fn parse_relationships_xml(xml_data: &[u8]) -> Vec<Relationship> {
        let xml_str = String::from_utf8_lossy(xml_data);

        // <Relationship Id="rId1" Type="http://.../officeDocument" Target="word/document.xml"/>
        RELATIONSHIP_PATTERN
            .find_iter(&xml_str)
            .filter_map(|tag| {
                let tag = tag.as_str();
                Some(Relationship {
                    id: attribute(tag, "Id")?,
                    relationship_type: RelationshipType::from_string(&attribute(tag, "Type")?),
                    target: attribute(tag, "Target")?,
                    target_mode: attribute(tag, "TargetMode"),
                })
            })
            .collect()
    }

    /// Write the package to ZIP file data
    pub fn to_zip(&self) -> Result<Vec<u8>, OoxmlError> {
        let mut writer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut writer);

            let zip_options = FileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);

            zip.start_file(CONTENT_TYPES_PART, zip_options)?;
            zip.write_all(&self.generate_content_types_xml())?;

            zip.start_file("_rels/.rels", zip_options)?;
            zip.write_all(&generate_relationships_xml(&self.root_relationships))?;

            let sources: BTreeMap<_, _> = self.relationships.iter().collect();
            for (source, relationships) in sources {
                zip.start_file(relationships_part_name(source), zip_options)?;
                zip.write_all(&generate_relationships_xml(relationships))?;
            }

            let parts: BTreeMap<_, _> = self.parts.iter().collect();
            for (name, part) in parts {
                zip.start_file(&name[1..], zip_options)?; // Remove leading slash
                zip.write_all(&part.data)?;
            }

            zip.finish()?;
        }

        debug!("Wrote package with {} parts", self.parts.len());
        Ok(writer.into_inner())
    }

    /// Generate [Content_Types].xml
    fn generate_content_types_xml(&self) -> Vec<u8> {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        let defaults: BTreeMap<_, _> = self.default_content_types.iter().collect();
        for (extension, content_type) in defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml_attr(extension),
                escape_xml_attr(content_type.as_str())
            ));
        }

        let overrides: BTreeMap<_, _> = self.content_types.iter().collect();
        for (part_name, content_type) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml_attr(part_name),
                escape_xml_attr(content_type.as_str())
            ));
        }

        xml.push_str("</Types>");
        xml.into_bytes()
    }

    /// Name of the main document part, from the root officeDocument relationship
    pub fn main_document_part(&self) -> String {
        self.root_relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::OfficeDocument)
            .map(|rel| resolve_target("/", &rel.target))
            .unwrap_or_else(|| MAIN_DOCUMENT_PART.to_string())
    }

    /// Get a part by name
    pub fn get_part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.get(name)
    }

    /// Insert or replace a part, registering a content type override for it
    pub fn put_part(&mut self, name: &str, content_type: ContentType, data: Vec<u8>) {
        self.content_types.insert(name.to_string(), content_type.clone());
        self.parts.insert(name.to_string(), PackagePart {
            name: name.to_string(),
            content_type,
            data,
        });
    }

    /// Get content type for a part, from its override or its extension default
    pub fn get_content_type(&self, name: &str) -> Option<ContentType> {
        if let Some(content_type) = self.content_types.get(name) {
            return Some(content_type.clone());
        }
        let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.default_content_types.get(&extension).cloned()
    }

    /// Get relationships for a source part
    pub fn get_relationships(&self, source: &str) -> Option<&Vec<Relationship>> {
        self.relationships.get(source)
    }

    /// Name for a new image part, numbered past every `imageN` present or
    /// previously handed out, whatever its extension.
    fn next_image_part_name(&mut self, format: ImageFormat) -> Result<String, OoxmlError> {
        let prefix = format!("{}/image", MEDIA_FOLDER);
        let highest = self
            .parts
            .keys()
            .filter_map(|name| name.strip_prefix(&prefix)?.split_once('.')?.0.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            .max(self.last_image_index);

        let index = highest
            .checked_add(1)
            .ok_or(OoxmlError::Exhausted("image part number"))?;
        self.last_image_index = index;
        Ok(format!("{}/image{}.{}", MEDIA_FOLDER, index, format.extension()))
    }

    /// Relationship id for `source`, numbered past every `rIdN` present or
    /// previously handed out.
    fn next_relationship_id(&mut self, source: &str) -> Result<String, OoxmlError> {
        let highest = self
            .relationships
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let last = self.last_relationship_index.entry(source.to_string()).or_insert(0);

        let index = highest
            .max(*last)
            .checked_add(1)
            .ok_or(OoxmlError::Exhausted("relationship id"))?;
        *last = index;
        Ok(format!("rId{}", index))
    }
}

impl ImagePartStore for OpcPackage {
    fn add_image_part(
        &mut self,
        data: &[u8],
        format: ImageFormat,
    ) -> Result<(String, String), OoxmlError> {
        let content_type = format
            .content_type()
            .ok_or_else(|| OoxmlError::UnsupportedContentType(format.mime_type().to_string()))?;

        let source = self.main_document_part();
        let part_name = self.next_image_part_name(format)?;
        let relationship_id = self.next_relationship_id(&source)?;

        self.put_part(&part_name, content_type, data.to_vec());
        self.relationships.entry(source.clone()).or_default().push(Relationship {
            id: relationship_id.clone(),
            relationship_type: RelationshipType::Image,
            target: relative_target(&source, &part_name),
            target_mode: None,
        });

        debug!("Added image part: {} ({}), {} bytes", part_name, relationship_id, data.len());
        Ok((part_name, relationship_id))
    }

    fn relationship_id_of(&self, part_name: &str) -> Option<String> {
        let source = self.main_document_part();
        self.relationships
            .get(&source)?
            .iter()
            .find(|rel| !rel.is_external() && resolve_target(&source, &rel.target) == part_name)
            .map(|rel| rel.id.clone())
    }

    fn delete_part(&mut self, part_name: &str) -> Result<(), OoxmlError> {
        if self.parts.remove(part_name).is_none() {
            return Err(OoxmlError::PartNotFound(part_name.to_string()));
        }
        self.content_types.remove(part_name);
        self.relationships.remove(part_name);
        for (source, relationships) in self.relationships.iter_mut() {
            relationships.retain(|rel| {
                rel.is_external() || resolve_target(source, &rel.target) != part_name
            });
        }

        debug!("Deleted part: {}", part_name);
        Ok(())
    }

    fn image_parts(&self) -> Vec<(&PackagePart, &str)> {
        let source = self.main_document_part();
        let Some(relationships) = self.relationships.get(&source) else {
            return Vec::new();
        };

        relationships
            .iter()
            .filter(|rel| rel.relationship_type.is_image() && !rel.is_external())
            .filter_map(|rel| {
                let name = resolve_target(&source, &rel.target);
                match self.parts.get(&name) {
                    Some(part) => Some((part, rel.id.as_str())),
                    None => {
                        warn!("Image relationship {} points at missing part {}", rel.id, name);
                        None
                    }
                }
            })
            .collect()
    }

    fn part_data(&self, part_name: &str) -> Option<&[u8]> {
        self.parts.get(part_name).map(|part| part.data.as_slice())
    }
}

/// Generate relationships XML
fn generate_relationships_xml(relationships: &[Relationship]) -> Vec<u8> {
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);

    for rel in relationships {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}""#,
            escape_xml_attr(&rel.id),
            escape_xml_attr(rel.relationship_type.uri()),
            escape_xml_attr(&rel.target)
        ));
        if let Some(mode) = &rel.target_mode {
            xml.push_str(&format!(r#" TargetMode="{}""#, escape_xml_attr(mode)));
        }
        xml.push_str("/>");
    }

    xml.push_str("</Relationships>");
    xml.into_bytes()
}

/// Archive entry names become absolute part names
fn normalize_part_name(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}", name)
    }
}

/// Source part of a `.rels` part: "" for the package root, None for other parts
fn relationships_source(part_name: &str) -> Option<String> {
    let rels = part_name.strip_suffix(".rels")?;
    let (folder, file) = rels.rsplit_once("/_rels/")?;
    Some(if file.is_empty() {
        String::new()
    } else {
        format!("{}/{}", folder, file)
    })
}

/// Archive entry name of the `.rels` part for a source part
fn relationships_part_name(source: &str) -> String {
    let (folder, file) = source.rsplit_once('/').unwrap_or(("", source));
    format!("{}/_rels/{}.rels", folder.trim_start_matches('/'), file)
        .trim_start_matches('/')
        .to_string()
}

/// Resolve a relationship target against the folder of its source part
pub(crate) fn resolve_target(source: &str, target: &str) -> String {
    if target.starts_with('/') {
        return target.to_string();
    }

    let folder = source.rsplit_once('/').map_or("", |(folder, _)| folder);
    let mut segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Target of `part_name` as seen from `source`, relative when they share a folder
fn relative_target(source: &str, part_name: &str) -> String {
    let folder = source.rsplit_once('/').map_or("", |(folder, _)| folder);
    match part_name.strip_prefix(folder).and_then(|rest| rest.strip_prefix('/')) {
        Some(relative) => relative.to_string(),
        None => part_name.to_string(),
    }
}
