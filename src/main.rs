//! qrsplice command-line entrypoint

use clap::Parser;
use qrsplice::output::{Rendered, render_report, render_shapes};
use qrsplice::{
    Document, EccLevel, Error, MissingMarkerPolicy, QrspliceConfig, Result, SubstitutionRequest,
    Substituter, logging,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrsplice",
    version,
    about = "Replace a placeholder image in a DOCX document with a QR code"
)]
struct Cli {
    /// Template document containing the placeholder image
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the edited document
    #[arg(value_name = "OUTPUT", required_unless_present = "list")]
    output: Option<PathBuf>,

    /// Text to encode (e.g. "sms:+15551234567?body=Hello")
    #[arg(long, value_name = "TEXT", required_unless_present = "list")]
    payload: Option<String>,

    /// Alt text identifying the placeholder image
    #[arg(long, value_name = "TEXT")]
    marker: Option<String>,

    /// Optional configuration file (toml/yaml). Defaults to qrsplice.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// QR error correction level (L, M, Q, H)
    #[arg(long, value_name = "LEVEL")]
    ecc: Option<EccLevel>,

    /// Directory for the transient QR image (defaults to the system temp dir)
    #[arg(long, value_name = "DIR")]
    transient_dir: Option<PathBuf>,

    /// What to do when no image carries the marker (`ignore`, `warn`, `fail`)
    #[arg(long, value_name = "POLICY")]
    on_missing: Option<MissingMarkerPolicy>,

    /// Decode the rendered QR image and compare it with the payload before embedding
    #[arg(long)]
    verify: bool,

    /// Alt text for the inserted QR picture
    #[arg(long, value_name = "TEXT")]
    alt_text: Option<String>,

    /// List the document's inline shapes and exit
    #[arg(long)]
    list: bool,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrspliceConfig::load(cli.config.as_deref())?;

    if let Some(ref marker) = cli.marker {
        config.substitution.marker = marker.clone();
    }

    if let Some(level) = cli.ecc {
        config.qr.ecc_level = level;
    }

    if let Some(ref dir) = cli.transient_dir {
        config.substitution.transient_dir = Some(dir.clone());
    }

    if let Some(policy) = cli.on_missing {
        config.substitution.on_missing = policy;
    }

    if cli.verify {
        config.substitution.verify = true;
    }

    if let Some(ref alt_text) = cli.alt_text {
        config.substitution.alt_text = alt_text.clone();
    }

    logging::init(&config.logging)?;

    if cli.list {
        let document = Document::open(&cli.input)?;
        let shapes: Vec<_> = document.inline_shapes().collect();
        return emit(&render_shapes(&shapes)?, cli.json);
    }

    let (Some(output), Some(payload)) = (cli.output, cli.payload) else {
        return Err(Error::Config(
            "OUTPUT and --payload are required unless --list is given".to_string(),
        ));
    };

    let request = SubstitutionRequest {
        input: cli.input,
        output,
        marker: config.substitution.marker.clone(),
        payload,
    };
    info!(
        input = %request.input.display(),
        output = %request.output.display(),
        marker = %request.marker,
        "Starting substitution"
    );

    let substituter = Substituter::new(&config.qr, config.substitution);
    let report = substituter.run(&request)?;
    emit(&render_report(&report)?, cli.json)
}

fn emit(rendered: &Rendered, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&rendered.json)?);
    } else {
        for line in &rendered.human {
            println!("{line}");
        }
    }
    Ok(())
}
