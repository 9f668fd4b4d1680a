use serde::{Deserialize, Serialize};

/// Content types defined in [Content_Types].xml
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Main document body (word/document.xml)
    MainDocument,
    /// Document styles (word/styles.xml)
    Styles,
    /// Theme colors and fonts (word/theme/theme1.xml)
    Theme,
    /// Document settings (word/settings.xml)
    Settings,
    /// Core properties (docProps/core.xml)
    CoreProperties,
    /// App properties (docProps/app.xml)
    AppProperties,
    /// Web settings (word/webSettings.xml)
    WebSettings,
    /// Numbering definitions (word/numbering.xml)
    Numbering,
    /// Generic XML part
    Xml,
    /// Relationships file
    Relationships,
    /// PNG image
    ImagePng,
    /// JPEG image
    ImageJpeg,
    /// GIF image
    ImageGif,
    /// BMP image
    ImageBmp,
    /// WebP image
    ImageWebP,
    /// TIFF image
    ImageTiff,
    /// Unknown content type
    Unknown(String),
}

impl ContentType {
    /// Parse content type string into enum
    pub fn from_string(s: &str) -> Self {
        match s {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml" => ContentType::MainDocument,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml" => ContentType::Styles,
            "application/vnd.openxmlformats-officedocument.theme+xml" => ContentType::Theme,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml" => ContentType::Settings,
            "application/vnd.openxmlformats-package.core-properties+xml" => ContentType::CoreProperties,
            "application/vnd.openxmlformats-officedocument.extended-properties+xml" => ContentType::AppProperties,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml" => ContentType::WebSettings,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml" => ContentType::Numbering,
            "application/xml" => ContentType::Xml,
            "application/vnd.openxmlformats-package.relationships+xml" => ContentType::Relationships,
            // Image types
            "image/png" => ContentType::ImagePng,
            "image/jpeg" | "image/jpg" => ContentType::ImageJpeg,
            "image/gif" => ContentType::ImageGif,
            "image/bmp" => ContentType::ImageBmp,
            "image/webp" => ContentType::ImageWebP,
            "image/tiff" | "image/tif" => ContentType::ImageTiff,
            _ => ContentType::Unknown(s.to_string()),
        }
    }

    /// The content type string written to [Content_Types].xml
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::MainDocument => "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ContentType::Styles => "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
            ContentType::Theme => "application/vnd.openxmlformats-officedocument.theme+xml",
            ContentType::Settings => "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml",
            ContentType::CoreProperties => "application/vnd.openxmlformats-package.core-properties+xml",
            ContentType::AppProperties => "application/vnd.openxmlformats-officedocument.extended-properties+xml",
            ContentType::WebSettings => "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml",
            ContentType::Numbering => "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
            ContentType::Xml => "application/xml",
            ContentType::Relationships => "application/vnd.openxmlformats-package.relationships+xml",
            ContentType::ImagePng => "image/png",
            ContentType::ImageJpeg => "image/jpeg",
            ContentType::ImageGif => "image/gif",
            ContentType::ImageBmp => "image/bmp",
            ContentType::ImageWebP => "image/webp",
            ContentType::ImageTiff => "image/tiff",
            ContentType::Unknown(s) => s,
        }
    }

    /// Check if this is an image content type
    pub fn is_image(&self) -> bool {
        matches!(self,
            ContentType::ImagePng |
            ContentType::ImageJpeg |
            ContentType::ImageGif |
            ContentType::ImageBmp |
            ContentType::ImageWebP |
            ContentType::ImageTiff
        )
    }
}

/// Relationship type constants (ECMA-376)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Styles relationship
    Styles,
    /// Theme relationship
    Theme,
    /// Settings relationship
    Settings,
    /// Core properties relationship
    CoreProperties,
    /// Extended (app) properties relationship
    ExtendedProperties,
    /// Office document relationship
    OfficeDocument,
    /// Image relationship
    Image,
    /// Unknown relationship type
    Unknown(String),
}

impl RelationshipType {
    /// Parse relationship type string into enum
    pub fn from_string(s: &str) -> Self {
        match s {
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" => RelationshipType::OfficeDocument,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" => RelationshipType::Styles,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" => RelationshipType::Theme,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" => RelationshipType::Settings,
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" => RelationshipType::CoreProperties,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" => RelationshipType::ExtendedProperties,
            // Image relationships
            rel if rel.ends_with("relationships/image") => RelationshipType::Image,
            _ => RelationshipType::Unknown(s.to_string()),
        }
    }

    /// The relationship type URI written to .rels parts
    pub fn uri(&self) -> &str {
        match self {
            RelationshipType::OfficeDocument => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            RelationshipType::Styles => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            RelationshipType::Theme => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
            RelationshipType::Settings => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings",
            RelationshipType::CoreProperties => "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            RelationshipType::ExtendedProperties => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            RelationshipType::Image => "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image",
            RelationshipType::Unknown(uri) => uri,
        }
    }

    /// Check if this is an image relationship type
    pub fn is_image(&self) -> bool {
        matches!(self, RelationshipType::Image)
    }
}

/// Represents a relationship between parts in the package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Type of relationship
    pub relationship_type: RelationshipType,
    /// Target URI (can be relative or absolute)
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Whether the target lives outside the package
    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }
}

/// A part in the OPC package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePart {
    /// Part name (e.g., "/word/document.xml")
    pub name: String,
    /// Content type of the part
    pub content_type: ContentType,
    /// Raw binary data of the part
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parsing() {
        let ct = ContentType::from_string("application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml");
        assert_eq!(ct, ContentType::MainDocument);

        let ct = ContentType::from_string("unknown/type");
        assert_eq!(ct, ContentType::Unknown("unknown/type".to_string()));
    }

    #[test]
    fn test_content_type_string_round_trip() {
        for ct in [
            ContentType::MainDocument,
            ContentType::Styles,
            ContentType::Theme,
            ContentType::Relationships,
            ContentType::ImagePng,
            ContentType::ImageJpeg,
            ContentType::ImageTiff,
            ContentType::Unknown("application/x-custom".to_string()),
        ] {
            assert_eq!(ContentType::from_string(ct.as_str()), ct);
        }
    }

    #[test]
    fn test_content_type_image_detection() {
        assert!(ContentType::from_string("image/png").is_image());
        assert!(ContentType::from_string("image/jpg").is_image());
        assert!(!ContentType::MainDocument.is_image());
        assert!(!ContentType::Unknown("image/svg+xml".to_string()).is_image());
    }

    #[test]
    fn test_relationship_type_detection() {
        let rel_type = RelationshipType::from_string(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
        );
        assert_eq!(rel_type, RelationshipType::Image);
        assert!(rel_type.is_image());
        assert_eq!(RelationshipType::from_string(rel_type.uri()), rel_type);

        let other_type = RelationshipType::from_string(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"
        );
        assert_eq!(other_type, RelationshipType::Styles);
        assert!(!other_type.is_image());
    }

    #[test]
    fn test_relationship_external() {
        let rel = Relationship {
            id: "rId7".to_string(),
            relationship_type: RelationshipType::Image,
            target: "http://example.com/a.png".to_string(),
            target_mode: Some("External".to_string()),
        };
        assert!(rel.is_external());
    }
}
