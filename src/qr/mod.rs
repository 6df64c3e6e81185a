//! QR code encoding and decoding
//!
//! This module renders the replacement QR image (encoding) and reads rendered
//! codes back (decoding) so a generated image can be checked before it is
//! embedded.

mod decoder;
mod encoder;

pub use decoder::QrDecoder;
pub use encoder::QrEncoder;

use serde::{Deserialize, Serialize};

/// A QR code payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    /// The raw data
    pub data: Vec<u8>,
    /// String representation if valid UTF-8
    pub text: Option<String>,
}

impl QrPayload {
    /// Create a new QR payload from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let text = String::from_utf8(data.clone()).ok();
        Self { data, text }
    }

    /// Create a new QR payload from a string
    pub fn from_string(s: String) -> Self {
        Self {
            data: s.as_bytes().to_vec(),
            text: Some(s),
        }
    }

    /// Get the payload as a string, if valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Error correction level used when encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EccLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl EccLevel {
    /// Parse a level identifier (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "L" | "LOW" => Some(Self::L),
            "M" | "MEDIUM" => Some(Self::M),
            "Q" | "QUARTILE" => Some(Self::Q),
            "H" | "HIGH" => Some(Self::H),
            _ => None,
        }
    }
}

impl From<EccLevel> for qrcode::EcLevel {
    fn from(level: EccLevel) -> Self {
        match level {
            EccLevel::L => qrcode::EcLevel::L,
            EccLevel::M => qrcode::EcLevel::M,
            EccLevel::Q => qrcode::EcLevel::Q,
            EccLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl std::str::FromStr for EccLevel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| format!("Unknown error correction level '{value}', expected L, M, Q or H"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_payload_from_string() {
        let payload = QrPayload::from_string("sms:+15551234567?body=Hi".to_string());
        assert_eq!(payload.as_str(), Some("sms:+15551234567?body=Hi"));
        assert_eq!(payload.as_bytes(), b"sms:+15551234567?body=Hi");
    }

    #[test]
    fn test_qr_payload_from_bytes() {
        let payload = QrPayload::from_bytes(vec![0xFF, 0xFE]);
        assert!(payload.as_str().is_none()); // Invalid UTF-8
        assert_eq!(payload.as_bytes(), &[0xFF, 0xFE]);
    }

    #[test]
    fn test_ecc_level_parse() {
        assert_eq!(EccLevel::parse("h"), Some(EccLevel::H));
        assert_eq!(EccLevel::parse(" Quartile "), Some(EccLevel::Q));
        assert_eq!(EccLevel::parse("x"), None);
        assert!("z".parse::<EccLevel>().is_err());
        assert_eq!(EccLevel::default(), EccLevel::M);
    }
}
