//! Errors raised by the OPC package layer

/// Errors that can occur while reading, mutating or writing a package.
#[derive(Debug, thiserror::Error)]
pub enum OoxmlError {
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Part not found in package: {0}")]
    PartNotFound(String),
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("No unused {0} left in package")]
    Exhausted(&'static str),
}
