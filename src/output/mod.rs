//! Helpers for rendering substitution results and shape listings

use crate::docx::InlineShape;
use crate::error::Result;
use crate::substitute::SubstitutionReport;
use serde::Serialize;
use serde_json::Value;

/// Combined structured and human-readable representation of a result
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// JSON shape of a report: the report's own fields plus the replacement count
#[derive(Serialize)]
struct ReportDocument<'a> {
    #[serde(flatten)]
    report: &'a SubstitutionReport,
    replaced: usize,
}

/// Render a substitution report into both JSON and human-readable forms.
pub fn render_report(report: &SubstitutionReport) -> Result<Rendered> {
    let json = report_value(report)?;
    let mut human = Vec::new();

    if report.replacements.is_empty() {
        human.push(format!(
            "No image with alt text '{}' in {}; saved unchanged copy to {}",
            report.marker,
            report.input.display(),
            report.output.display()
        ));
    } else {
        human.push(format!(
            "Created {} with QR code replacing {} placeholder image{}",
            report.output.display(),
            report.replaced(),
            if report.replaced() == 1 { "" } else { "s" }
        ));
        for replacement in &report.replacements {
            human.push(format!(
                "  {}: {} ({})",
                location_label(replacement.position.map(|p| (p.paragraph, p.run))),
                replacement.extent,
                replacement.part_name
            ));
        }
    }

    Ok(Rendered { json, human })
}

/// Produce a structured JSON representation of the report.
pub fn report_value(report: &SubstitutionReport) -> Result<Value> {
    Ok(serde_json::to_value(ReportDocument {
        report,
        replaced: report.replaced(),
    })?)
}

/// Render an inline-shape listing.
pub fn render_shapes(shapes: &[InlineShape]) -> Result<Rendered> {
    let json = serde_json::to_value(shapes)?;

    let mut human = Vec::with_capacity(shapes.len() + 1);
    if shapes.is_empty() {
        human.push("No inline shapes".to_string());
    }
    for shape in shapes {
        let size = shape
            .extent
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no extent".to_string());
        let descr = shape
            .description
            .as_deref()
            .map(|d| format!("'{}'", format_text_snippet(d)))
            .unwrap_or_else(|| "<no alt text>".to_string());
        human.push(format!(
            "{}: {} {}",
            location_label(shape.position.map(|p| (p.paragraph, p.run))),
            descr,
            size
        ));
    }

    Ok(Rendered { json, human })
}

fn location_label(position: Option<(usize, usize)>) -> String {
    match position {
        Some((paragraph, run)) => format!("paragraph {paragraph}, run {run}"),
        None => "outside any run".to_string(),
    }
}

fn format_text_snippet(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let snippet: String = text.chars().take(MAX).collect();
        let total = text.chars().count();
        format!("{}... ({} chars)", snippet, total)
    }
}
