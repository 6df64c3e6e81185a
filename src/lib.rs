//! qrsplice - replace a placeholder image in a DOCX document with a QR code
//!
//! A template document carries an inline image whose alt text is a known
//! marker (`QRCODE_PLACEHOLDER` by default). qrsplice renders a QR code for a
//! payload, swaps it into the run that held the placeholder at the
//! placeholder's exact display size, and writes the result to a new file.
//!
//! # Features
//!
//! - **QR Processing**: encoding via `qrcode`, optional read-back check via `rqrr`
//! - **DOCX editing**: event-level splicing that leaves untouched parts byte-identical
//! - **Layout preservation**: the run, its formatting, and the extent are kept
//!
//! # Example
//!
//! ```no_run
//! use qrsplice::{SubstitutionOptions, SubstitutionRequest, substitute};
//!
//! fn main() -> qrsplice::Result<()> {
//!     let request = SubstitutionRequest {
//!         input: "template.docx".into(),
//!         output: "output_with_qr.docx".into(),
//!         marker: "QRCODE_PLACEHOLDER".to_string(),
//!         payload: "sms:+15551234567?body=HelloWorld".to_string(),
//!     };
//!     let report = substitute::run(&request, &SubstitutionOptions::default())?;
//!     println!("Replaced {} placeholder(s)", report.replaced());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod config;
pub mod docx;
pub mod error;
pub mod logging;
pub mod output;
pub mod placeholder;
pub mod qr;
pub mod substitute;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{
    DEFAULT_MARKER, LogRotation, LoggingOptions, MissingMarkerPolicy, QrOptions, QrspliceConfig,
    SubstitutionOptions,
};
pub use docx::{Document, Emu, Extent, InlineShape, ShapePosition};
pub use placeholder::{Replacement, find_matches, replace};
pub use qr::{EccLevel, QrDecoder, QrEncoder, QrPayload};
pub use substitute::{SubstitutionReport, SubstitutionRequest, Substituter, TransientImage};
