//! QR code encoder

use crate::config::QrOptions;
use crate::error::{Error, Result};
use crate::qr::{EccLevel, QrPayload};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// QR code encoder
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EccLevel,
    /// Minimum edge length of the rendered image in pixels
    min_dimension: u32,
    /// Whether to surround the symbol with the standard quiet zone
    quiet_zone: bool,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC)
    pub fn new() -> Self {
        Self::from_options(&QrOptions::default())
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: EccLevel) -> Self {
        Self {
            ecc_level,
            ..Self::new()
        }
    }

    /// Create an encoder from configuration
    pub fn from_options(options: &QrOptions) -> Self {
        Self {
            ecc_level: options.ecc_level,
            min_dimension: options.min_dimension.max(21),
            quiet_zone: options.quiet_zone,
        }
    }

    /// Encode data into a QR code image
    pub fn encode(&self, payload: &QrPayload) -> Result<DynamicImage> {
        let code = QrCode::with_error_correction_level(&payload.data, self.ecc_level.into())
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;

        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(self.quiet_zone)
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();

        Ok(DynamicImage::ImageLuma8(image))
    }

    /// Encode a string into a QR code image
    pub fn encode_string(&self, data: &str) -> Result<DynamicImage> {
        let payload = QrPayload::from_string(data.to_string());
        self.encode(&payload)
    }

    /// Encode bytes into a QR code image
    pub fn encode_bytes(&self, data: &[u8]) -> Result<DynamicImage> {
        let payload = QrPayload::from_bytes(data.to_vec());
        self.encode(&payload)
    }

    /// Encode `payload` and write it as a PNG to `destination`
    pub fn produce(&self, payload: &str, destination: &Path) -> Result<()> {
        let image = self.encode_string(payload)?;
        let mut writer = BufWriter::new(File::create(destination)?);
        image.write_to(&mut writer, ImageFormat::Png)?;
        writer.flush()?;

        tracing::debug!(
            path = %destination.display(),
            width = image.width(),
            height = image.height(),
            "Wrote QR image"
        );
        Ok(())
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}
