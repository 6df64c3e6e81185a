//! Locating marked placeholder images and splicing replacements into their runs

use crate::docx::{Document, EmbeddedPicture, Extent, InlineShape, InlineShapes, ShapePosition};
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Lazy document-order iterator over inline shapes whose alt text equals a marker
pub struct Matches<'a> {
    shapes: InlineShapes<'a>,
    marker: &'a str,
}

impl Iterator for Matches<'_> {
    type Item = InlineShape;

    fn next(&mut self) -> Option<Self::Item> {
        for shape in self.shapes.by_ref() {
            match shape.description.as_deref() {
                Some(description) if description == self.marker => return Some(shape),
                Some(_) => {}
                None => tracing::warn!(
                    doc_pr_id = ?shape.doc_pr_id,
                    position = ?shape.position,
                    "Inline shape has no alt text; treating as non-matching"
                ),
            }
        }
        None
    }
}

/// Find every inline shape whose alt text equals `marker` (exact, case-sensitive).
///
/// The iterator borrows the document; collect it before calling [`replace`].
pub fn find_matches<'a>(document: &'a Document, marker: &'a str) -> Matches<'a> {
    Matches {
        shapes: document.inline_shapes(),
        marker,
    }
}

/// Outcome of a single splice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replacement {
    /// Paragraph/run that now holds the QR picture
    pub position: Option<ShapePosition>,
    /// Size inherited from the placeholder
    pub extent: Extent,
    /// Relationship id backing the new picture
    pub r_id: String,
    /// Media part holding the image bytes
    pub part_name: String,
}

/// Replace `shape` with the image at `image_path`, keeping its run and its size.
///
/// On [`Error::Structural`] the document may already be partially edited and
/// must not be saved.
pub fn replace(
    document: &mut Document,
    shape: &InlineShape,
    image_path: &Path,
    alt_text: &str,
) -> Result<Replacement> {
    let extent = shape.extent.ok_or_else(|| {
        Error::Structural(format!(
            "inline shape {:?} has no wp:extent",
            shape.doc_pr_id
        ))
    })?;

    let at = document.remove_drawing(shape)?;
    let EmbeddedPicture {
        r_id, part_name, ..
    } = document.insert_picture(at, image_path, extent, alt_text)?;

    tracing::info!(
        position = ?shape.position,
        width = extent.width.0,
        height = extent.height.0,
        %r_id,
        "Replaced placeholder"
    );

    Ok(Replacement {
        position: shape.position,
        extent,
        r_id,
        part_name,
    })
}

/// Replace every shape carrying `marker`, last to first so earlier spans stay valid.
///
/// A match nested inside another match (a marked picture in a marked text box)
/// goes away with its container and is not replaced separately. Returned
/// replacements are in document order.
pub fn replace_all(
    document: &mut Document,
    marker: &str,
    image_path: &Path,
    alt_text: &str,
) -> Result<Vec<Replacement>> {
    let mut targets: Vec<InlineShape> = find_matches(document, marker).collect();
    tracing::debug!(marker, matches = targets.len(), "Located placeholders");

    // Nested drawings close first, so restore document order by start.
    targets.sort_by_key(|shape| shape.drawing.start);
    let mut container_end = None;
    targets.retain(|shape| {
        if container_end.is_some_and(|end| shape.drawing.end < end) {
            tracing::debug!(doc_pr_id = ?shape.doc_pr_id, "Placeholder lies inside another placeholder");
            return false;
        }
        container_end = Some(shape.drawing.end);
        true
    });

    let mut replacements = Vec::with_capacity(targets.len());
    for shape in targets.iter().rev() {
        replacements.push(replace(document, shape, image_path, alt_text)?);
    }
    replacements.reverse();
    Ok(replacements)
}
