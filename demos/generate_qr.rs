//! Generate a QR code PNG and list the shapes of a template
//!
//! Usage: cargo run --example generate_qr -- [template.docx]

use qrsplice::{Document, QrDecoder, QrEncoder, find_matches};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let encoder = QrEncoder::new();

    // The data for an SMS QR code typically looks like
    // "sms:+1234567890?body=Hello" or "SMSTO:+1234567890:Hello"
    let payload = "sms:+15551234567?body=HelloWorld";
    encoder.produce(payload, Path::new("qr_output.png"))?;

    let decoded = QrDecoder::new().decode_file(Path::new("qr_output.png"))?;
    println!("✓ QR code generated and saved to qr_output.png");
    println!("  Content: {}", decoded.as_str().unwrap_or("<binary>"));

    if let Some(template) = std::env::args().nth(1) {
        let document = Document::open(Path::new(&template))?;
        for shape in document.inline_shapes() {
            println!(
                "  shape {:?}: {:?} {:?}",
                shape.position, shape.description, shape.extent
            );
        }
        let placeholders = find_matches(&document, qrsplice::DEFAULT_MARKER).count();
        println!("✓ {placeholders} placeholder(s) found in {template}");
    }

    Ok(())
}
