//! End-to-end substitution: render the QR image, splice it in, save, clean up

use crate::config::{MissingMarkerPolicy, QrOptions, SubstitutionOptions};
use crate::docx::Document;
use crate::error::{Error, Result};
use crate::placeholder::{self, Replacement};
use crate::qr::{QrDecoder, QrEncoder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What to substitute where
#[derive(Debug, Clone)]
pub struct SubstitutionRequest {
    /// Template document; never written
    pub input: PathBuf,
    /// Destination of the edited document
    pub output: PathBuf,
    /// Alt text of the placeholder image(s)
    pub marker: String,
    /// Text encoded into the QR code
    pub payload: String,
}

/// Summary of a finished substitution
#[derive(Debug, Clone, Serialize)]
pub struct SubstitutionReport {
    /// Template document
    pub input: PathBuf,
    /// Written document
    pub output: PathBuf,
    /// Marker that was searched for
    pub marker: String,
    /// Replacements in document order
    pub replacements: Vec<Replacement>,
}

impl SubstitutionReport {
    /// Number of placeholders replaced
    pub fn replaced(&self) -> usize {
        self.replacements.len()
    }
}

/// A uniquely named QR image that is removed when dropped.
///
/// Removal is best-effort: failures are logged and never surface as errors.
#[derive(Debug)]
pub struct TransientImage {
    path: PathBuf,
}

impl TransientImage {
    /// Render `payload` into a fresh `qrsplice-<uuid>.png` inside `dir`.
    pub fn create(encoder: &QrEncoder, payload: &str, dir: &Path) -> Result<Self> {
        let path = dir.join(format!("qrsplice-{}.png", Uuid::new_v4()));
        encoder.produce(payload, &path).inspect_err(|_| {
            // produce may have left a truncated file behind
            let _ = std::fs::remove_file(&path);
        })?;
        Ok(Self { path })
    }

    /// Location of the image
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientImage {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed transient QR image"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                "Failed to remove transient QR image: {err}"
            ),
        }
    }
}

/// Runs substitutions with a fixed QR rendering and substitution policy
pub struct Substituter {
    encoder: QrEncoder,
    options: SubstitutionOptions,
}

impl Substituter {
    /// Create a substituter from configuration sections
    pub fn new(qr: &QrOptions, options: SubstitutionOptions) -> Self {
        Self {
            encoder: QrEncoder::from_options(qr),
            options,
        }
    }

    /// Substitution options in effect
    pub fn options(&self) -> &SubstitutionOptions {
        &self.options
    }

    /// Replace every placeholder marked `request.marker` with a QR code for `request.payload`.
    ///
    /// The QR image is rendered before the template is opened, so an unwritable
    /// transient directory aborts without creating any output.
    pub fn run(&self, request: &SubstitutionRequest) -> Result<SubstitutionReport> {
        let image = TransientImage::create(
            &self.encoder,
            &request.payload,
            &self.options.transient_dir(),
        )?;
        tracing::info!(path = %image.path().display(), "Rendered QR image");

        if self.options.verify {
            verify(image.path(), &request.payload)?;
        }

        let mut document = Document::open(&request.input)?;
        let replacements = placeholder::replace_all(
            &mut document,
            &request.marker,
            image.path(),
            &self.options.alt_text,
        )?;

        if replacements.is_empty() {
            match self.options.on_missing {
                MissingMarkerPolicy::Ignore => {
                    tracing::debug!(marker = %request.marker, "No placeholder found")
                }
                MissingMarkerPolicy::Warn => tracing::warn!(
                    marker = %request.marker,
                    "No placeholder found; saving document unchanged"
                ),
                MissingMarkerPolicy::Fail => {
                    return Err(Error::MarkerNotFound(request.marker.clone()));
                }
            }
        }

        // The transient image must outlive the save.
        document.save(&request.output)?;
        drop(image);

        Ok(SubstitutionReport {
            input: request.input.clone(),
            output: request.output.clone(),
            marker: request.marker.clone(),
            replacements,
        })
    }
}

/// Run a single substitution with default QR settings.
pub fn run(request: &SubstitutionRequest, options: &SubstitutionOptions) -> Result<SubstitutionReport> {
    Substituter::new(&QrOptions::default(), options.clone()).run(request)
}

fn verify(path: &Path, payload: &str) -> Result<()> {
    let decoded = QrDecoder::new().decode_file(path)?;
    match decoded.as_str() {
        Some(text) if text == payload => {
            tracing::debug!("QR image verified");
            Ok(())
        }
        other => Err(Error::QrVerify {
            expected: payload.to_string(),
            actual: other
                .map(str::to_string)
                .unwrap_or_else(|| format!("<{} non-UTF-8 bytes>", decoded.as_bytes().len())),
        }),
    }
}
