//! Error types for qrsplice operations

use thiserror::Error;

/// Result type alias using qrsplice's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrsplice operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input is not a usable word-processing package
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A matched shape does not sit in the expected drawing → run → paragraph chain
    #[error("Malformed document structure: {0}")]
    Structural(String),

    /// No inline shape carried the marker and the policy forbids a no-op save
    #[error("No inline shape with alt text '{0}' found")]
    MarkerNotFound(String),

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// Generated QR code did not decode back to the requested payload
    #[error("QR verification failed: expected '{expected}', decoded '{actual}'")]
    QrVerify {
        /// Payload that was encoded
        expected: String,
        /// Payload read back from the rendered image
        actual: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error
    #[error("Package error: {0}")]
    Zip(String),

    /// XML tokenizing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

// Implement From conversions for common error types

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(e: quick_xml::escape::EscapeError) -> Self {
        Error::Xml(format!("Invalid escape sequence: {}", e))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(format!("Invalid attribute: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
